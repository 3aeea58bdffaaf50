//! Hunting and fighting. Every target exposes a fixed supply of slot ids,
//! so a prey is never chased by more hunters than it has slots.

use tribe_events::GameTime;

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::ai::steering::{hostiles_near, is_hostile, pursue, slot_ids};
use crate::ai::task::scoring::{blend, distance_term, hunger_need, threat_proximity};
use crate::ai::task::{Task, TaskDefinition, TaskMap, TaskResult, TaskType};
use crate::components::{ActiveAction, Agent, AgentKind, Role, Target};

use super::food::hungry_threshold;

/// How many nearby targets become candidates.
const NEAREST_TARGETS: usize = 3;

fn horizon(ctx: &AiContext<'_>) -> GameTime {
    ctx.now() + ctx.config.claims.lease_hours
}

/// One task per slot for `target`, all sharing the same target.
fn slotted(task_type: TaskType, agent: &Agent, target: &Agent, slots: usize, ctx: &AiContext<'_>) -> TaskMap {
    slot_ids(task_type, target.id, slots)
        .into_iter()
        .map(|id| {
            let task = Task::new(id.clone(), task_type, agent.id, horizon(ctx))
                .at(target.position)
                .targeting(Target::Entity(target.id));
            (id, task)
        })
        .collect()
}

fn target_closeness(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<(f32, f32)> {
    let target = ctx.world.agent(task.target_entity()?).filter(|t| t.is_alive())?;
    let distance = ctx.distance(agent.position, target.position);
    Some((distance, distance_term(distance, ctx.config.hunting.distance_scale)))
}

// hunt_prey

/// Produces the same slot ids for every hunter, predator or human, so the
/// capacity of a prey is shared between them.
fn produce_hunt(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let radius = match agent.kind {
        AgentKind::Predator => ctx.config.hunting.predator_radius,
        AgentKind::TribeMember { .. } if agent.is_adult => ctx.config.hunting.human_radius,
        _ => return TaskMap::new(),
    };
    let slots = ctx.config.hunting.max_hunters_per_prey;
    ctx.world
        .prey
        .by_radius(agent.position, radius)
        .into_iter()
        .filter(|(prey, _)| prey.is_alive())
        .take(NEAREST_TARGETS)
        .flat_map(|(prey, _)| slotted(TaskType::HuntPrey, agent, prey, slots, ctx))
        .collect()
}

fn score_hunt(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let (_, closeness) = target_closeness(agent, task, ctx)?;
    let threshold = hungry_threshold(agent, ctx);
    let need = hunger_need(agent.hunger, threshold);
    match agent.kind {
        AgentKind::Predator if agent.hunger >= threshold => Some(blend(0.3, 0.55, need, closeness)),
        AgentKind::TribeMember { role: Role::Hunter, .. } => Some(blend(0.35, 0.4, need, closeness)),
        AgentKind::TribeMember { .. } if agent.hunger >= threshold => Some(blend(0.15, 0.4, need, closeness)),
        _ => None,
    }
}

fn execute_hunt(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(prey_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if let Some(target) = ctx.world.agent(prey_id) {
        if !matches!(target.kind, AgentKind::Prey) {
            return TaskResult::Failure;
        }
    }
    let slots = ctx.config.hunting.max_hunters_per_prey;
    let give_up = ctx.config.hunting.max_chase_distance;
    pursue(agent, prey_id, ActiveAction::Hunting, TaskType::HuntPrey, slots, give_up, ctx)
        .status()
        .into()
}

pub const HUNT_PREY: TaskDefinition = TaskDefinition {
    task_type: TaskType::HuntPrey,
    producer: produce_hunt,
    scorer: score_hunt,
    executor: execute_hunt,
};

// attack_hostile

fn produce_attack_hostile(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if !agent.is_adult {
        return TaskMap::new();
    }
    let slots = ctx.config.combat.max_attackers_per_target;
    hostiles_near(agent, ctx, ctx.config.combat.detection_radius)
        .into_iter()
        .take(NEAREST_TARGETS)
        .flat_map(|(hostile, _)| slotted(TaskType::AttackHostile, agent, hostile, slots, ctx))
        .collect()
}

/// A hostile is worth fighting when it is a predator, when it hurt this
/// agent, or when it is attacking one of the agent's tribe.
fn is_threat(agent: &Agent, hostile: &Agent, ctx: &AiContext<'_>) -> bool {
    if matches!(hostile.kind, AgentKind::Predator) || agent.last_aggressor == Some(hostile.id) {
        return true;
    }
    hostile
        .intent
        .attack_target
        .and_then(|victim| ctx.world.agent(victim))
        .is_some_and(|victim| victim.tribe().is_some() && victim.tribe() == agent.tribe())
}

fn score_attack_hostile(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    if !agent.is_adult {
        return None;
    }
    let hostile = ctx.world.agent(task.target_entity()?)?;
    if !is_hostile(agent, hostile) || !is_threat(agent, hostile, ctx) {
        return None;
    }
    let (distance, _) = target_closeness(agent, task, ctx)?;
    let proximity = threat_proximity(distance, ctx.config.combat.detection_radius);
    let base = if agent.role() == Some(Role::Warrior) { 0.5 } else { 0.35 };
    Some(blend(base, 0.3, proximity, 1.0))
}

fn execute_attack_hostile(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(enemy) = task.target_entity() else {
        return TaskResult::Failure;
    };
    let slots = ctx.config.combat.max_attackers_per_target;
    let give_up = ctx.config.combat.detection_radius * 2.0;
    pursue(agent, enemy, ActiveAction::Attacking, TaskType::AttackHostile, slots, give_up, ctx)
        .status()
        .into()
}

pub const ATTACK_HOSTILE: TaskDefinition = TaskDefinition {
    task_type: TaskType::AttackHostile,
    producer: produce_attack_hostile,
    scorer: score_attack_hostile,
    executor: execute_attack_hostile,
};

// attack_human (predators)

fn produce_attack_human(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if !matches!(agent.kind, AgentKind::Predator) {
        return TaskMap::new();
    }
    let slots = ctx.config.combat.max_attackers_per_target;
    ctx.world
        .humans
        .by_radius(agent.position, ctx.config.hunting.predator_radius)
        .into_iter()
        .filter(|(human, _)| human.is_alive())
        .take(NEAREST_TARGETS)
        .flat_map(|(human, _)| slotted(TaskType::AttackHuman, agent, human, slots, ctx))
        .collect()
}

fn score_attack_human(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let starving = ctx.config.combat.predator_attack_hunger;
    if agent.hunger < starving {
        return None;
    }
    let (_, closeness) = target_closeness(agent, task, ctx)?;
    Some(blend(0.45, 0.4, hunger_need(agent.hunger, starving), closeness))
}

fn execute_attack_human(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(victim) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if ctx.world.agent(victim).is_some_and(|v| !v.is_human()) {
        return TaskResult::Failure;
    }
    let slots = ctx.config.combat.max_attackers_per_target;
    let give_up = ctx.config.hunting.max_chase_distance;
    pursue(agent, victim, ActiveAction::Attacking, TaskType::AttackHuman, slots, give_up, ctx)
        .status()
        .into()
}

pub const ATTACK_HUMAN: TaskDefinition = TaskDefinition {
    task_type: TaskType::AttackHuman,
    producer: produce_attack_human,
    scorer: score_attack_human,
    executor: execute_attack_human,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::task::run_task_loop;
    use crate::ai::testing::{member, predator, prey};
    use crate::components::EntityId;
    use std::collections::BTreeSet;

    #[test]
    fn test_hunt_ids_are_stable_across_evaluations() {
        let mut sandbox = AiSandbox::default();
        let mut hunter = predator(1, 100.0, 100.0);
        hunter.hunger = 0.7;
        sandbox.populate(vec![hunter.clone(), prey(9, 140.0, 100.0)], vec![], vec![], vec![]);

        let first: Vec<String> = produce_hunt(&hunter, &sandbox.context())
            .keys()
            .map(|id| id.to_string())
            .collect();
        sandbox.stamp.advance_tick(0.25);
        let second: Vec<String> = produce_hunt(&hunter, &sandbox.context())
            .keys()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["hunt_prey-9-slot-0", "hunt_prey-9-slot-1", "hunt_prey-9-slot-2"]);
    }

    #[test]
    fn test_fourth_hunter_is_refused() {
        let mut sandbox = AiSandbox::default();
        let mut hunters: Vec<Agent> = (1..=4)
            .map(|id| {
                let mut p = predator(id, 100.0 + id as f32, 100.0);
                p.hunger = 0.9;
                p
            })
            .collect();
        let mut agents = hunters.clone();
        agents.push(prey(9, 150.0, 100.0));
        sandbox.populate(agents, vec![], vec![], vec![]);

        let mut bb = Blackboard::default();
        let defs = [HUNT_PREY];
        let mut claimed = BTreeSet::new();
        for hunter in &mut hunters {
            if let Some(run) = run_task_loop(&defs, hunter, &mut sandbox.context(), &mut bb) {
                claimed.insert(run.task.id.to_string());
            }
        }
        assert_eq!(claimed.len(), 3);
        assert_eq!(hunters[3].intent.active_action, ActiveAction::Idle);
        assert!(hunters[..3].iter().all(|h| h.intent.is_attacking(EntityId(9))));
    }

    #[test]
    fn test_predator_ignores_humans_until_starving() {
        let mut sandbox = AiSandbox::default();
        let mut hunter = predator(1, 100.0, 100.0);
        let victim = member(2, 1, Role::Gatherer, 120.0, 100.0);
        sandbox.populate(vec![hunter.clone(), victim], vec![], vec![], vec![]);
        let ctx = sandbox.context();
        let tasks = produce_attack_human(&hunter, &ctx);
        assert_eq!(tasks.len(), 3);
        let task = tasks.values().next().unwrap();

        hunter.hunger = 0.5;
        assert_eq!(score_attack_human(&hunter, task, &ctx), None);
        hunter.hunger = 0.95;
        assert!(score_attack_human(&hunter, task, &ctx).is_some());
    }

    #[test]
    fn test_hunting_a_human_with_the_prey_task_fails() {
        let mut sandbox = AiSandbox::default();
        let mut hunter = predator(1, 100.0, 100.0);
        sandbox.populate(
            vec![hunter.clone(), member(2, 1, Role::Gatherer, 110.0, 100.0)],
            vec![],
            vec![],
            vec![],
        );
        let task = Task::new(
            crate::ai::task::TaskId::slot(TaskType::HuntPrey, EntityId(2), 0),
            TaskType::HuntPrey,
            hunter.id,
            GameTime::from_hours(1.0),
        )
        .targeting(Target::Entity(EntityId(2)));
        let mut bb = Blackboard::default();
        assert_eq!(
            execute_hunt(&task, &mut hunter, &mut sandbox.context(), &mut bb),
            TaskResult::Failure
        );
    }

    #[test]
    fn test_warrior_defends_kin_under_attack() {
        let mut sandbox = AiSandbox::default();
        let warrior = member(1, 1, Role::Warrior, 100.0, 100.0);
        let kin = member(2, 1, Role::Gatherer, 110.0, 100.0);
        let mut raider = member(3, 2, Role::Warrior, 120.0, 100.0);
        raider.intent.attack(ActiveAction::Attacking, kin.id, GameTime::ZERO);
        let bystander = member(4, 2, Role::Gatherer, 90.0, 100.0);
        sandbox.populate(vec![warrior.clone(), kin, raider, bystander], vec![], vec![], vec![]);

        let ctx = sandbox.context();
        let tasks = produce_attack_hostile(&warrior, &ctx);
        let scored: Vec<(u64, Option<f32>)> = tasks
            .values()
            .filter(|t| t.id.as_str().ends_with("slot-0"))
            .map(|t| (t.target_entity().unwrap().0, score_attack_hostile(&warrior, t, &ctx)))
            .collect();
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().any(|(id, s)| *id == 3 && s.is_some()));
        assert!(scored.iter().any(|(id, s)| *id == 4 && s.is_none()));
    }
}
