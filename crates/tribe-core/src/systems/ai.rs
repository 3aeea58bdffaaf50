//! AI System
//!
//! Runs the dispatcher for every living agent, in ascending id order so that
//! the claim ledger's first-committer-wins rule is deterministic.

use bevy_ecs::prelude::*;
use tracing::trace;
use tribe_events::TreeTrace;

use crate::ai::blackboard::Blackboard;
use crate::ai::claims::ClaimLedger;
use crate::ai::context::AiContext;
use crate::ai::dispatcher::dispatch;
use crate::ai::effects::PendingEffects;
use crate::ai::trees::BehaviorTrees;
use crate::components::{Agent, AiSchedule, EntityId, GameClock};
use crate::config::AiConfig;
use crate::events::PendingEvents;
use crate::query::{SoilMap, TerritoryGrid, WorldSnapshot};
use crate::SimRng;

/// Resource: which agent's tree evaluations are traced, and the latest trace.
#[derive(Resource, Debug, Default)]
pub struct TraceSettings {
    pub agent: Option<EntityId>,
    pub last: Option<TreeTrace>,
}

impl TraceSettings {
    pub fn for_agent(agent: EntityId) -> Self {
        Self {
            agent: Some(agent),
            last: None,
        }
    }

    /// Takes the latest trace, if one was recorded since the last call.
    pub fn take(&mut self) -> Option<TreeTrace> {
        self.last.take()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_ai(
    mut agents: Query<(&mut Agent, &mut Blackboard, &mut AiSchedule)>,
    snapshot: Res<WorldSnapshot>,
    mut territory: ResMut<TerritoryGrid>,
    soil: Res<SoilMap>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
    trees: Res<BehaviorTrees>,
    mut rng: ResMut<SimRng>,
    mut claims: ResMut<ClaimLedger>,
    mut effects: ResMut<PendingEffects>,
    mut events: ResMut<PendingEvents>,
    mut trace_settings: ResMut<TraceSettings>,
) {
    let mut order: Vec<_> = agents.iter_mut().filter(|(agent, _, _)| agent.is_alive()).collect();
    order.sort_by_key(|(agent, _, _)| agent.id);

    let mut evaluated = 0usize;
    for (mut agent, mut bb, mut schedule) in order {
        let traced = trace_settings.agent == Some(agent.id);
        let mut entries = Vec::new();
        let mut ctx = AiContext {
            world: &*snapshot,
            territory: &mut *territory,
            soil: &*soil,
            config: &*config,
            stamp: clock.stamp,
            rng: &mut rng.0,
            claims: &mut *claims,
            effects: &mut *effects,
            events: &mut *events,
            trace: if traced { Some(&mut entries) } else { None },
        };

        if dispatch(&mut *agent, &mut *bb, &mut *schedule, &*trees, &mut ctx).is_some() {
            evaluated += 1;
        }

        if !entries.is_empty() {
            trace_settings.last = Some(TreeTrace {
                agent_id: agent.id.0,
                tick: clock.tick(),
                entries,
            });
        }
    }
    trace!(tick = clock.tick(), evaluated, "ai pass done");
}
