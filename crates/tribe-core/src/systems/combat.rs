//! Combat System
//!
//! Agents whose intent is aggressive damage their attack target when in
//! range. Hits are collected first and applied afterwards, so the outcome
//! does not depend on iteration order.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};
use tribe_events::{EventOutcome, EventType, GeneralOutcome};

use crate::components::{Agent, AgentKind, EntityId, GameClock};
use crate::config::{AiConfig, CombatConfig};
use crate::events::PendingEvents;
use crate::query::WorldSnapshot;

/// Damage per hour dealt by an agent of `kind`.
pub fn damage_of(kind: AgentKind, combat: &CombatConfig) -> f32 {
    match kind {
        AgentKind::TribeMember { .. } => combat.human_damage_per_hour,
        AgentKind::Predator => combat.predator_damage_per_hour,
        AgentKind::Prey => combat.prey_damage_per_hour,
    }
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    attacker: EntityId,
    target: EntityId,
    damage: f32,
}

pub fn resolve_combat(
    mut agents: Query<&mut Agent>,
    snapshot: Res<WorldSnapshot>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
    mut events: ResMut<PendingEvents>,
) {
    let hours = clock.hours_per_tick as f32;
    let by_id: BTreeMap<EntityId, Agent> = agents.iter().map(|a| (a.id, a.clone())).collect();
    let mut hits = Vec::new();
    for attacker in by_id.values() {
        if !attacker.is_alive() || !attacker.intent.active_action.is_aggressive() {
            continue;
        }
        let Some(target) = attacker.intent.attack_target.and_then(|id| by_id.get(&id)) else {
            continue;
        };
        if !target.is_alive() || snapshot.distance(attacker.position, target.position) > config.combat.attack_range {
            continue;
        }
        let damage = damage_of(attacker.kind, &config.combat) * hours;
        if damage > 0.0 {
            hits.push(Hit {
                attacker: attacker.id,
                target: target.id,
                damage,
            });
        }
    }
    if hits.is_empty() {
        return;
    }

    let mut killed = Vec::new();
    for mut agent in agents.iter_mut() {
        let id = agent.id;
        let was_alive = agent.is_alive();
        for hit in hits.iter().filter(|h| h.target == id) {
            agent.hit_points = (agent.hit_points - hit.damage).max(0.0);
            agent.last_aggressor = Some(hit.attacker);
            debug!(attacker = hit.attacker.0, target = hit.target.0, damage = hit.damage, "hit");
        }
        if was_alive && !agent.is_alive() {
            killed.push((id, agent.last_aggressor));
        }
    }

    for (victim, killer) in killed {
        let Some(killer) = killer.and_then(|id| by_id.get(&id)) else {
            continue;
        };
        info!(killer = killer.id.0, victim = victim.0, "killed in combat");
        events.record(
            clock.stamp,
            EventType::Combat,
            killer,
            EventOutcome::General(GeneralOutcome {
                description: "killed".into(),
                other_id: Some(victim.0),
            }),
        );
    }
}
