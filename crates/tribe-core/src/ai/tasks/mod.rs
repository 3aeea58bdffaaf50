//! Task definitions and the task set each kind of agent chooses from.

pub mod family;
pub mod food;
pub mod hunting;
pub mod movement;

use crate::ai::task::TaskDefinition;
use crate::components::AgentKind;

pub use family::{can_procreate, court, find_partner, FEED_CHILD, PROCREATE};
pub use food::{EAT_BERRIES, EAT_CORPSE, EAT_STORED_FOOD, GATHER_BERRIES, GRAZE, STORE_FOOD};
pub use hunting::{ATTACK_HOSTILE, ATTACK_HUMAN, HUNT_PREY};
pub use movement::{FLEE, IDLE, RETURN_HOME, WANDER};

/// Utility fallback of the human tree.
pub const HUMAN_TASKS: &[TaskDefinition] = &[
    EAT_BERRIES,
    EAT_STORED_FOOD,
    EAT_CORPSE,
    GATHER_BERRIES,
    STORE_FOOD,
    HUNT_PREY,
    ATTACK_HOSTILE,
    FEED_CHILD,
    RETURN_HOME,
    FLEE,
    IDLE,
];

pub const PREDATOR_TASKS: &[TaskDefinition] = &[HUNT_PREY, EAT_CORPSE, ATTACK_HUMAN, PROCREATE, FLEE, WANDER];

pub const PREY_TASKS: &[TaskDefinition] = &[GRAZE, FLEE, PROCREATE, WANDER];

pub fn tasks_for(kind: AgentKind) -> &'static [TaskDefinition] {
    match kind {
        AgentKind::TribeMember { .. } => HUMAN_TASKS,
        AgentKind::Predator => PREDATOR_TASKS,
        AgentKind::Prey => PREY_TASKS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::blackboard::Blackboard;
    use crate::ai::context::AiSandbox;
    use crate::ai::task::{collect_candidates, run_task_loop, TaskType};
    use crate::ai::testing::{human, predator, prey};
    use crate::components::{ActiveAction, BerryBush, EntityId, Vec2};

    #[test]
    fn test_every_human_score_stays_below_flee() {
        let mut sandbox = AiSandbox::default();
        let mut starving = human(1, 100.0, 100.0);
        starving.hunger = 1.0;
        starving.carried_food = 6.0;
        let bush = BerryBush::new(EntityId(50), Vec2::new(100.0, 100.0), 12.0);
        sandbox.populate(
            vec![starving.clone(), prey(2, 101.0, 100.0), predator(3, 102.0, 100.0)],
            vec![bush],
            vec![],
            vec![],
        );
        let ctx = sandbox.context();
        for candidate in collect_candidates(HUMAN_TASKS, &starving, &ctx) {
            assert!(
                candidate.score < ctx.config.flee.score,
                "{} scored {}",
                candidate.task.id,
                candidate.score
            );
        }
    }

    #[test]
    fn test_idle_prey_wanders_and_scared_prey_flees() {
        let mut sandbox = AiSandbox::default();
        let mut deer = prey(1, 500.0, 500.0);
        sandbox.populate(vec![deer.clone()], vec![], vec![], vec![]);
        let mut bb = Blackboard::default();
        let run = run_task_loop(PREY_TASKS, &mut deer, &mut sandbox.context(), &mut bb).unwrap();
        assert_eq!(run.task.task_type, TaskType::Wander);

        sandbox.populate(vec![deer.clone(), predator(9, 520.0, 500.0)], vec![], vec![], vec![]);
        let run = run_task_loop(PREY_TASKS, &mut deer, &mut sandbox.context(), &mut bb).unwrap();
        assert_eq!(run.task.task_type, TaskType::Flee);
        assert_eq!(deer.intent.active_action, ActiveAction::Fleeing);
    }
}
