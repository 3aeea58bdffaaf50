//! Fleeing, wandering, going home and idling.

use tribe_events::GameTime;

use crate::ai::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use crate::ai::context::AiContext;
use crate::ai::steering::{flee_from, home_of, random_point_near};
use crate::ai::task::scoring::{lerp, threat_proximity};
use crate::ai::task::{Task, TaskDefinition, TaskId, TaskMap, TaskResult, TaskType};
use crate::components::{ActiveAction, Agent, AgentKind, EntityId, Target};

fn horizon(ctx: &AiContext<'_>) -> GameTime {
    ctx.now() + ctx.config.claims.lease_hours
}

fn single(task: Task) -> TaskMap {
    let mut map = TaskMap::new();
    map.insert(task.id.clone(), task);
    map
}

// flee

/// The agent something should run from: its last aggressor for humans and
/// predators, the nearest predator for prey.
fn threat_of(agent: &Agent, ctx: &AiContext<'_>) -> Option<(EntityId, f32)> {
    match agent.kind {
        AgentKind::Prey => ctx
            .world
            .predators
            .by_radius(agent.position, ctx.config.flee.prey_radius)
            .into_iter()
            .find(|(predator, _)| predator.is_alive())
            .map(|(predator, distance)| (predator.id, distance)),
        AgentKind::TribeMember { .. } | AgentKind::Predator => {
            let aggressor = ctx.world.agent(agent.last_aggressor?)?;
            if !aggressor.is_alive() {
                return None;
            }
            let distance = ctx.distance(agent.position, aggressor.position);
            (distance <= ctx.config.flee.aggressor_radius).then_some((aggressor.id, distance))
        }
    }
}

fn produce_flee(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let Some((threat, _)) = threat_of(agent, ctx) else {
        return TaskMap::new();
    };
    let id = TaskId::of(TaskType::Flee, &[&agent.id, &threat]);
    single(Task::new(id, TaskType::Flee, agent.id, horizon(ctx)).targeting(Target::Entity(threat)))
}

fn score_flee(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let (threat, distance) = threat_of(agent, ctx)?;
    if task.target_entity() != Some(threat) {
        return None;
    }
    match agent.kind {
        AgentKind::Prey => {
            let proximity = threat_proximity(distance, ctx.config.flee.prey_radius);
            Some(lerp(ctx.config.flee.prey_min_score, ctx.config.flee.prey_max_score, proximity))
        }
        _ if agent.health_fraction() < ctx.config.flee.health_fraction => Some(ctx.config.flee.score),
        _ => None,
    }
}

fn execute_flee(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(threat) = task.target_entity() else {
        return TaskResult::Failure;
    };
    let safe_distance = match agent.kind {
        AgentKind::Prey => ctx.config.flee.prey_radius,
        _ => ctx.config.flee.aggressor_radius,
    };
    flee_from(agent, threat, safe_distance, ctx).into()
}

pub const FLEE: TaskDefinition = TaskDefinition {
    task_type: TaskType::Flee,
    producer: produce_flee,
    scorer: score_flee,
    executor: execute_flee,
};

// wander

fn produce_wander(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let id = TaskId::of(TaskType::Wander, &[&agent.id]);
    single(Task::new(id, TaskType::Wander, agent.id, horizon(ctx)))
}

fn score_wander(_agent: &Agent, _task: &Task, _ctx: &AiContext<'_>) -> Option<f32> {
    Some(0.05)
}

/// Walks to a remembered random point, picking a new one on arrival.
fn execute_wander(_task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> TaskResult {
    let now = ctx.now();
    let reach = ctx.config.movement.reach;
    if let Some(point) = bb.position(BlackboardKey::WanderPoint, now) {
        if ctx.distance(agent.position, point) <= reach {
            bb.delete(BlackboardKey::WanderPoint);
            agent.intent.go_idle(now);
            return TaskResult::Success;
        }
        agent.intent.set(ActiveAction::Wandering, Some(Target::Position(point)), now);
        return TaskResult::Running;
    }
    let point = random_point_near(agent.position, ctx.config.movement.wander_radius, ctx);
    bb.set(BlackboardKey::WanderPoint, BlackboardValue::Position(point), now);
    agent.intent.set(ActiveAction::Wandering, Some(Target::Position(point)), now);
    TaskResult::Running
}

pub const WANDER: TaskDefinition = TaskDefinition {
    task_type: TaskType::Wander,
    producer: produce_wander,
    scorer: score_wander,
    executor: execute_wander,
};

// return_home

fn produce_return_home(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let Some(tribe) = agent.tribe() else {
        return TaskMap::new();
    };
    let home = home_of(agent, ctx);
    let id = TaskId::of(TaskType::ReturnHome, &[&agent.id, &tribe]);
    single(
        Task::new(id, TaskType::ReturnHome, agent.id, horizon(ctx))
            .at(home)
            .targeting(Target::Position(home)),
    )
}

fn score_return_home(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let home = task.target_position()?;
    let limit = ctx.config.patrol.max_distance_from_home;
    let distance = ctx.distance(agent.position, home);
    if distance <= limit {
        return None;
    }
    Some(lerp(0.2, 0.5, (distance - limit) / limit.max(1.0)))
}

fn execute_return_home(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let now = ctx.now();
    let Some(home) = task.target_position() else {
        return TaskResult::Failure;
    };
    if ctx.distance(agent.position, home) <= ctx.config.patrol.arrival_distance {
        agent.intent.go_idle(now);
        return TaskResult::Success;
    }
    agent.intent.set(ActiveAction::ReturningHome, Some(Target::Position(home)), now);
    TaskResult::Running
}

pub const RETURN_HOME: TaskDefinition = TaskDefinition {
    task_type: TaskType::ReturnHome,
    producer: produce_return_home,
    scorer: score_return_home,
    executor: execute_return_home,
};

// idle

fn produce_idle(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let id = TaskId::of(TaskType::Idle, &[&agent.id]);
    single(Task::new(id, TaskType::Idle, agent.id, horizon(ctx)))
}

fn score_idle(_agent: &Agent, _task: &Task, _ctx: &AiContext<'_>) -> Option<f32> {
    Some(0.01)
}

fn execute_idle(_task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    agent.intent.go_idle(ctx.now());
    TaskResult::Success
}

pub const IDLE: TaskDefinition = TaskDefinition {
    task_type: TaskType::Idle,
    producer: produce_idle,
    scorer: score_idle,
    executor: execute_idle,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::task::collect_candidates;
    use crate::ai::testing::{human, predator, prey};
    use crate::components::Vec2;

    #[test]
    fn test_prey_flee_score_grows_with_proximity() {
        let mut sandbox = AiSandbox::default();
        let near = prey(1, 100.0, 100.0);
        let far = prey(2, 100.0, 160.0);
        sandbox.populate(
            vec![near.clone(), far.clone(), predator(9, 100.0, 90.0)],
            vec![],
            vec![],
            vec![],
        );
        let ctx = sandbox.context();
        let score = |agent: &Agent| {
            let tasks = produce_flee(agent, &ctx);
            let task = tasks.values().next().unwrap();
            score_flee(agent, task, &ctx).unwrap()
        };
        let (near_score, far_score) = (score(&near), score(&far));
        assert!(near_score > far_score);
        assert!(near_score <= ctx.config.flee.prey_max_score);
        assert!(far_score >= ctx.config.flee.prey_min_score);
    }

    #[test]
    fn test_wounded_human_flees_aggressor_above_everything() {
        let mut sandbox = AiSandbox::default();
        let mut victim = human(1, 100.0, 100.0);
        victim.last_aggressor = Some(EntityId(9));
        sandbox.populate(vec![victim.clone(), predator(9, 120.0, 100.0)], vec![], vec![], vec![]);

        // Healthy: the aggressor is not worth running from
        let ctx = sandbox.context();
        let tasks = produce_flee(&victim, &ctx);
        assert_eq!(score_flee(&victim, tasks.values().next().unwrap(), &ctx), None);

        victim.hit_points = 10.0;
        let candidates = collect_candidates(&[FLEE, IDLE], &victim, &ctx);
        assert_eq!(candidates[0].task.task_type, TaskType::Flee);
        assert_eq!(candidates[0].score, 0.9);
    }

    #[test]
    fn test_wander_remembers_its_point() {
        let mut sandbox = AiSandbox::default();
        let mut animal = prey(1, 200.0, 200.0);
        let mut bb = Blackboard::default();
        let task = produce_wander(&animal, &sandbox.context()).into_values().next().unwrap();

        let mut ctx = sandbox.context();
        assert_eq!(execute_wander(&task, &mut animal, &mut ctx, &mut bb), TaskResult::Running);
        let picked = bb.position(BlackboardKey::WanderPoint, ctx.now()).unwrap();
        assert!(ctx.distance(animal.position, picked) <= ctx.config.movement.wander_radius + 0.01);

        let point = Vec2::new(260.0, 200.0);
        bb.set(BlackboardKey::WanderPoint, BlackboardValue::Position(point), ctx.now());
        assert_eq!(execute_wander(&task, &mut animal, &mut ctx, &mut bb), TaskResult::Running);
        assert_eq!(bb.position(BlackboardKey::WanderPoint, ctx.now()), Some(point));
        assert_eq!(animal.intent.active_action, ActiveAction::Wandering);

        animal.position = point;
        assert_eq!(execute_wander(&task, &mut animal, &mut ctx, &mut bb), TaskResult::Success);
        assert!(bb.position(BlackboardKey::WanderPoint, ctx.now()).is_none());
    }

    #[test]
    fn test_return_home_only_when_far() {
        let mut sandbox = AiSandbox::default();
        let mut member = human(1, 100.0, 100.0);
        sandbox.populate(vec![member.clone(), human(2, 100.0, 100.0)], vec![], vec![], vec![]);
        let ctx = sandbox.context();
        let task = produce_return_home(&member, &ctx).into_values().next().unwrap();
        assert_eq!(score_return_home(&member, &task, &ctx), None);

        member.position = Vec2::new(400.0, 100.0);
        let score = score_return_home(&member, &task, &ctx).unwrap();
        assert!((0.2..=0.5).contains(&score));
    }
}
