//! Movement System
//!
//! Steps every agent toward its intent target. Stationary actions (eating,
//! gathering, building and the like) do not move the agent.

use bevy_ecs::prelude::*;

use crate::components::{ActiveAction, Agent, AgentKind, GameClock, Target};
use crate::config::{AiConfig, MovementConfig};
use crate::query::WorldSnapshot;

/// Units per hour for an agent, before the flee multiplier.
pub fn speed_of(kind: AgentKind, movement: &MovementConfig) -> f32 {
    match kind {
        AgentKind::TribeMember { .. } => movement.human_speed,
        AgentKind::Predator => movement.predator_speed,
        AgentKind::Prey => movement.prey_speed,
    }
}

/// Whether `action` moves the agent toward its target.
pub fn is_moving(action: ActiveAction) -> bool {
    match action {
        ActiveAction::Walking
        | ActiveAction::Wandering
        | ActiveAction::ReturningHome
        | ActiveAction::Hunting
        | ActiveAction::Attacking
        | ActiveAction::Fleeing
        | ActiveAction::Patrolling
        | ActiveAction::Pioneering
        | ActiveAction::Procreating => true,
        ActiveAction::Idle
        | ActiveAction::Eating
        | ActiveAction::Grazing
        | ActiveAction::Gathering
        | ActiveAction::Storing
        | ActiveAction::Building
        | ActiveAction::Feeding => false,
    }
}

pub fn move_agents(
    mut agents: Query<&mut Agent>,
    snapshot: Res<WorldSnapshot>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
) {
    let movement = &config.movement;
    let hours = clock.hours_per_tick as f32;

    for mut agent in agents.iter_mut() {
        if !agent.is_alive() || !is_moving(agent.intent.active_action) {
            continue;
        }
        let Some(target) = agent.intent.target else {
            continue;
        };
        // Entity targets are approached to within reach, positions exactly
        let (goal, stop_at) = match target {
            Target::Position(position) => (position, 0.0),
            Target::Entity(id) => match snapshot.position_of(id) {
                Some(position) => (position, movement.reach.min(config.combat.attack_range)),
                None => continue,
            },
        };

        let distance = snapshot.distance(agent.position, goal);
        if distance <= stop_at {
            continue;
        }
        let mut step = speed_of(agent.kind, movement) * hours;
        if agent.intent.active_action == ActiveAction::Fleeing {
            step *= movement.flee_multiplier;
        }
        let (position, _) = snapshot.bounds.step_toward(agent.position, goal, step.min(distance - stop_at));
        agent.position = position;
    }
}
