//! Lifecycle System
//!
//! Turns dead agents into corpses, keeps every tribe led, and removes
//! corpses once they have rotted or been eaten.

use bevy_ecs::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use tribe_events::{EventOutcome, EventType, GeneralOutcome};

use crate::ai::claims::ClaimLedger;
use crate::components::{Agent, AgentKind, Corpse, EntityId, GameClock, IdAllocator, Role, TribeId};
use crate::config::{AiConfig, NeedsConfig};
use crate::events::PendingEvents;

/// Food left behind by a dead agent.
pub fn corpse_food(kind: AgentKind, needs: &NeedsConfig) -> f32 {
    match kind {
        AgentKind::TribeMember { .. } => needs.corpse_food_human,
        AgentKind::Predator => needs.corpse_food_predator,
        AgentKind::Prey => needs.corpse_food_prey,
    }
}

pub fn handle_deaths(
    mut commands: Commands,
    agents: Query<(Entity, &Agent)>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
    mut ids: ResMut<IdAllocator>,
    mut claims: ResMut<ClaimLedger>,
    mut events: ResMut<PendingEvents>,
) {
    let mut dead: Vec<(Entity, &Agent)> = agents.iter().filter(|(_, agent)| !agent.is_alive()).collect();
    dead.sort_by_key(|(_, agent)| agent.id);

    for (entity, agent) in dead {
        claims.release_all(agent.id);
        commands.entity(entity).despawn();
        commands.spawn(Corpse {
            id: ids.next_id(),
            position: agent.position,
            food: corpse_food(agent.kind, &config.needs),
            decays_at: clock.now() + config.world.corpse_decay_hours,
        });
        info!(agent = agent.id.0, kind = agent.kind.as_str(), age = agent.age_years, "died");
        events.record(
            clock.stamp,
            EventType::Death,
            agent,
            EventOutcome::General(GeneralOutcome {
                description: if agent.hunger >= 1.0 { "starved" } else { "died" }.into(),
                other_id: agent.last_aggressor.map(|a| a.0),
            }),
        );
    }
}

/// Promotes the oldest adult of a leaderless tribe, lowest id on ties.
pub fn appoint_leaders(mut agents: Query<&mut Agent>) {
    let mut led: BTreeSet<TribeId> = BTreeSet::new();
    let mut candidates: BTreeMap<TribeId, (f32, EntityId)> = BTreeMap::new();

    for agent in agents.iter() {
        let AgentKind::TribeMember { tribe, role } = agent.kind else {
            continue;
        };
        if !agent.is_alive() {
            continue;
        }
        if role == Role::Leader {
            led.insert(tribe);
            continue;
        }
        if !agent.is_adult {
            continue;
        }
        let better = match candidates.get(&tribe) {
            Some((age, id)) => agent.age_years > *age || (agent.age_years == *age && agent.id < *id),
            None => true,
        };
        if better {
            candidates.insert(tribe, (agent.age_years, agent.id));
        }
    }

    candidates.retain(|tribe, _| !led.contains(tribe));
    if candidates.is_empty() {
        return;
    }
    for mut agent in agents.iter_mut() {
        let AgentKind::TribeMember { tribe, .. } = agent.kind else {
            continue;
        };
        if candidates.get(&tribe).is_some_and(|(_, id)| *id == agent.id) {
            agent.kind = AgentKind::TribeMember {
                tribe,
                role: Role::Leader,
            };
            info!(tribe = tribe.0, leader = agent.id.0, "new leader");
        }
    }
}

pub fn decay_corpses(mut commands: Commands, corpses: Query<(Entity, &Corpse)>, clock: Res<GameClock>) {
    let now = clock.now();
    for (entity, corpse) in corpses.iter() {
        if corpse.food <= 0.0 || now >= corpse.decays_at {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prey_leaves_most_food() {
        let needs = NeedsConfig::default();
        assert!(corpse_food(AgentKind::Prey, &needs) > corpse_food(AgentKind::Predator, &needs));
    }
}
