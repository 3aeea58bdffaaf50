//! Procreation and feeding children.

use tribe_events::GameTime;

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::ai::effects::WorldEffect;
use crate::ai::steering::approach;
use crate::ai::task::scoring::{hunger_need, population_room};
use crate::ai::task::{Task, TaskDefinition, TaskId, TaskMap, TaskResult, TaskType};
use crate::components::{ActiveAction, Agent, AgentKind, EntityId, Target};
use crate::query::Property;

use super::food::hungry_threshold;

fn horizon(ctx: &AiContext<'_>) -> GameTime {
    ctx.now() + ctx.config.claims.lease_hours
}

/// Current population and cap for the agent's kind (its tribe for humans).
fn population(agent: &Agent, ctx: &AiContext<'_>) -> (usize, usize) {
    let caps = &ctx.config.procreation;
    match agent.kind {
        AgentKind::TribeMember { tribe, .. } => (
            ctx.world.tribe(tribe).map_or(0, |t| t.member_count()),
            caps.tribe_population_cap,
        ),
        AgentKind::Predator => (ctx.world.predators.count(), caps.predator_population_cap),
        AgentKind::Prey => (ctx.world.prey.count(), caps.prey_population_cap),
    }
}

/// Adult, alive, fed, rested since the last birth, and the population has
/// room.
pub fn can_procreate(agent: &Agent, ctx: &AiContext<'_>) -> bool {
    let config = &ctx.config.procreation;
    let rested = agent
        .last_procreation
        .map_or(true, |at| ctx.now().has_elapsed(at, config.cooldown_hours));
    let (count, cap) = population(agent, ctx);
    agent.is_alive() && agent.is_adult && agent.hunger <= config.max_hunger && rested && count < cap
}

fn same_kind(agent: &Agent, other: &Agent) -> bool {
    match (agent.kind, other.kind) {
        (AgentKind::TribeMember { tribe: a, .. }, AgentKind::TribeMember { tribe: b, .. }) => a == b,
        (AgentKind::Predator, AgentKind::Predator) | (AgentKind::Prey, AgentKind::Prey) => true,
        _ => false,
    }
}

fn is_compatible(agent: &Agent, other: &Agent, ctx: &AiContext<'_>) -> bool {
    other.id != agent.id
        && same_kind(agent, other)
        && other.gender == agent.gender.opposite()
        && !agent.family.is_parent(other.id)
        && !other.family.is_parent(agent.id)
        && can_procreate(other, ctx)
}

/// The agent's partner if it is still eligible and nearby, otherwise the
/// nearest eligible mate within the partner radius.
pub fn find_partner(agent: &Agent, ctx: &AiContext<'_>) -> Option<EntityId> {
    let radius = ctx.config.procreation.partner_radius;
    if let Some(partner) = agent.family.partner.and_then(|id| ctx.world.agent(id)) {
        if is_compatible(agent, partner, ctx) && ctx.distance(agent.position, partner.position) <= radius {
            return Some(partner.id);
        }
    }
    let index = match agent.kind {
        AgentKind::TribeMember { .. } => &ctx.world.humans,
        AgentKind::Predator => &ctx.world.predators,
        AgentKind::Prey => &ctx.world.prey,
    };
    index
        .nearest_where(agent.position, radius, |other| is_compatible(agent, other, ctx))
        .map(|(other, _)| other.id)
}

/// Walks to `partner` and, once there, queues the birth. Success once the
/// birth is queued; Failure if the partner is no longer eligible.
pub fn court(agent: &mut Agent, partner: EntityId, ctx: &mut AiContext<'_>) -> TaskResult {
    let now = ctx.now();
    let Some(mate) = ctx.world.agent(partner) else {
        return TaskResult::Failure;
    };
    if !is_compatible(agent, mate, ctx) {
        return TaskResult::Failure;
    }
    let reach = ctx.config.movement.reach;
    if !approach(agent, ActiveAction::Procreating, Target::Entity(partner), mate.position, reach, ctx) {
        return TaskResult::Running;
    }
    ctx.queue(WorldEffect::Procreate {
        parent: agent.id,
        partner,
    });
    agent.last_procreation = Some(now);
    agent.family.partner = Some(partner);
    agent.intent.go_idle(now);
    TaskResult::Success
}

// procreate (animals)

/// One id per pair, so only one of the two initiates.
fn pair_id(a: EntityId, b: EntityId) -> TaskId {
    TaskId::of(TaskType::Procreate, &[&a.min(b), &a.max(b)])
}

fn produce_procreate(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if agent.is_human() || !can_procreate(agent, ctx) {
        return TaskMap::new();
    }
    let Some(partner) = find_partner(agent, ctx) else {
        return TaskMap::new();
    };
    let id = pair_id(agent.id, partner);
    let mut map = TaskMap::new();
    map.insert(
        id.clone(),
        Task::new(id, TaskType::Procreate, agent.id, horizon(ctx)).targeting(Target::Entity(partner)),
    );
    map
}

fn score_procreate(agent: &Agent, _task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let (count, cap) = population(agent, ctx);
    Some(0.1 + 0.3 * population_room(count, cap))
}

fn execute_procreate(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    match task.target_entity() {
        Some(partner) => court(agent, partner, ctx),
        None => TaskResult::Failure,
    }
}

pub const PROCREATE: TaskDefinition = TaskDefinition {
    task_type: TaskType::Procreate,
    producer: produce_procreate,
    scorer: score_procreate,
    executor: execute_procreate,
};

// feed_child

fn produce_feed_child(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if !agent.is_adult || agent.carried_food <= 0.0 {
        return TaskMap::new();
    }
    ctx.world
        .humans
        .by_property(Property::ParentOf(agent.id))
        .into_iter()
        .filter(|child| child.is_alive() && !child.is_adult)
        .map(|child| {
            let id = TaskId::of(TaskType::FeedChild, &[&agent.id, &child.id]);
            let task = Task::new(id.clone(), TaskType::FeedChild, agent.id, horizon(ctx))
                .at(child.position)
                .targeting(Target::Entity(child.id));
            (id, task)
        })
        .collect()
}

fn score_feed_child(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let child = ctx.world.agent(task.target_entity()?)?;
    let threshold = hungry_threshold(child, ctx);
    if child.hunger < threshold || agent.carried_food <= 0.0 {
        return None;
    }
    Some(0.4 + 0.4 * hunger_need(child.hunger, threshold))
}

fn execute_feed_child(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let now = ctx.now();
    let Some(child) = task.target_entity().and_then(|id| ctx.world.agent(id)) else {
        return TaskResult::Failure;
    };
    if !child.is_alive() || child.hunger <= ctx.config.eating.sated_threshold {
        agent.intent.go_idle(now);
        return TaskResult::Success;
    }
    if agent.carried_food <= 0.0 {
        return TaskResult::Failure;
    }
    let (child_id, child_position) = (child.id, child.position);
    let reach = ctx.config.movement.reach;
    if approach(agent, ActiveAction::Feeding, Target::Entity(child_id), child_position, reach, ctx) {
        let amount = ctx.config.eating.bite.min(agent.carried_food);
        ctx.queue(WorldEffect::Feed {
            parent: agent.id,
            child: child_id,
            amount,
        });
    }
    TaskResult::Running
}

pub const FEED_CHILD: TaskDefinition = TaskDefinition {
    task_type: TaskType::FeedChild,
    producer: produce_feed_child,
    scorer: score_feed_child,
    executor: execute_feed_child,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::{member, prey};
    use crate::components::{Gender, Role};

    fn doe(id: u64, x: f32) -> Agent {
        prey(id, x, 100.0)
    }

    fn buck(id: u64, x: f32) -> Agent {
        let mut agent = prey(id, x, 100.0);
        agent.gender = Gender::Male;
        agent
    }

    #[test]
    fn test_partners_pick_the_same_pair_id() {
        let mut sandbox = AiSandbox::default();
        let (a, b) = (doe(4, 100.0), buck(7, 120.0));
        sandbox.populate(vec![a.clone(), b.clone()], vec![], vec![], vec![]);
        let ctx = sandbox.context();
        let from_a: Vec<TaskId> = produce_procreate(&a, &ctx).into_keys().collect();
        let from_b: Vec<TaskId> = produce_procreate(&b, &ctx).into_keys().collect();
        assert_eq!(from_a, from_b);
        assert_eq!(from_a[0].as_str(), "procreate-4-7");
    }

    #[test]
    fn test_no_partner_of_the_same_gender_or_kin() {
        let mut sandbox = AiSandbox::default();
        let mut child = buck(3, 110.0);
        child.family.mother = Some(EntityId(1));
        let mother = doe(1, 100.0);
        sandbox.populate(vec![mother.clone(), doe(2, 105.0), child], vec![], vec![], vec![]);
        assert_eq!(find_partner(&mother, &sandbox.context()), None);
    }

    #[test]
    fn test_cooldown_blocks_procreation() {
        let mut sandbox = AiSandbox::default();
        sandbox.set_time(GameTime::from_hours(200.0));
        let mut a = doe(1, 100.0);
        a.last_procreation = Some(GameTime::from_hours(150.0));
        sandbox.populate(vec![a.clone()], vec![], vec![], vec![]);
        assert!(!can_procreate(&a, &sandbox.context()));
        a.last_procreation = Some(GameTime::from_hours(50.0));
        assert!(can_procreate(&a, &sandbox.context()));
    }

    #[test]
    fn test_population_cap_blocks_procreation() {
        let mut sandbox = AiSandbox::default();
        sandbox.config.procreation.prey_population_cap = 2;
        let (a, b) = (doe(1, 100.0), buck(2, 104.0));
        sandbox.populate(vec![a.clone(), b], vec![], vec![], vec![]);
        assert!(!can_procreate(&a, &sandbox.context()));
    }

    #[test]
    fn test_court_queues_one_birth_on_arrival() {
        let mut sandbox = AiSandbox::default();
        let (mut a, b) = (doe(1, 100.0), buck(2, 102.0));
        sandbox.populate(vec![a.clone(), b], vec![], vec![], vec![]);
        let result = court(&mut a, EntityId(2), &mut sandbox.context());
        assert_eq!(result, TaskResult::Success);
        assert_eq!(sandbox.effects.len(), 1);
        assert!(a.last_procreation.is_some());
        assert_eq!(a.family.partner, Some(EntityId(2)));
    }

    #[test]
    fn test_parent_feeds_hungry_child() {
        let mut sandbox = AiSandbox::default();
        let mut parent = member(1, 1, Role::Gatherer, 100.0, 100.0);
        parent.carried_food = 3.0;
        let mut child = member(2, 1, Role::Gatherer, 101.0, 100.0).with_age(4.0, 16.0);
        child.family.father = Some(parent.id);
        child.hunger = 0.7;
        sandbox.populate(vec![parent.clone(), child], vec![], vec![], vec![]);

        let mut ctx = sandbox.context();
        let task = produce_feed_child(&parent, &ctx).into_values().next().unwrap();
        assert!(score_feed_child(&parent, &task, &ctx).is_some());
        let mut bb = Blackboard::default();
        assert_eq!(execute_feed_child(&task, &mut parent, &mut ctx, &mut bb), TaskResult::Running);
        assert_eq!(parent.intent.active_action, ActiveAction::Feeding);
        assert!(matches!(
            sandbox.effects.iter().next(),
            Some(WorldEffect::Feed { amount, .. }) if *amount == 1.0
        ));
    }
}
