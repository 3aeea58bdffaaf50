//! Helpers shared by tree leaves and task executors: who is hostile, where
//! home is, and how to chase, claim, flee and wander.

use rand::Rng;

use crate::components::{ActiveAction, Agent, AgentKind, EntityId, Target, Vec2};

use super::behavior_tree::NodeStatus;
use super::context::AiContext;
use super::task::{TaskId, TaskType};

/// Humans fight humans of other tribes; humans and predators fight each
/// other. Prey is hunted, never fought.
pub fn is_hostile(agent: &Agent, other: &Agent) -> bool {
    if agent.id == other.id || !other.is_alive() {
        return false;
    }
    match (agent.kind, other.kind) {
        (AgentKind::TribeMember { tribe: a, .. }, AgentKind::TribeMember { tribe: b, .. }) => a != b,
        (AgentKind::TribeMember { .. }, AgentKind::Predator) => true,
        (AgentKind::Predator, AgentKind::TribeMember { .. }) => true,
        _ => false,
    }
}

/// The tribe's center, or the agent's own position when it has no tribe.
pub fn home_of(agent: &Agent, ctx: &AiContext<'_>) -> Vec2 {
    agent
        .tribe()
        .and_then(|tribe| ctx.world.tribe(tribe))
        .map(|summary| summary.center)
        .unwrap_or(agent.position)
}

/// Hostile agents within `radius`, nearest first.
pub fn hostiles_near<'w>(agent: &Agent, ctx: &AiContext<'w>, radius: f32) -> Vec<(&'w Agent, f32)> {
    let world = ctx.world;
    let mut found: Vec<(&'w Agent, f32)> = world
        .humans
        .by_radius(agent.position, radius)
        .into_iter()
        .chain(world.predators.by_radius(agent.position, radius))
        .filter(|(other, _)| is_hostile(agent, other))
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)));
    found
}

/// Walks toward `target` and switches to `action` once within `reach`.
/// Returns whether the agent has arrived.
pub fn approach(
    agent: &mut Agent,
    action: ActiveAction,
    target: Target,
    position: Vec2,
    reach: f32,
    ctx: &AiContext<'_>,
) -> bool {
    let arrived = ctx.distance(agent.position, position) <= reach;
    let doing = if arrived { action } else { ActiveAction::Walking };
    agent.intent.set(doing, Some(target), ctx.now());
    arrived
}

/// Slot ids for one target.
pub fn slot_ids(task_type: TaskType, target: EntityId, slots: usize) -> Vec<TaskId> {
    (0..slots).map(|n| TaskId::slot(task_type, target, n)).collect()
}

/// True if `agent` holds a slot on `target` or one is free.
pub fn slot_available(agent: EntityId, task_type: TaskType, target: EntityId, slots: usize, ctx: &AiContext<'_>) -> bool {
    let now = ctx.now();
    slot_ids(task_type, target, slots)
        .iter()
        .any(|id| !ctx.claims.is_held_by_other(id, agent, now))
}

/// Claims (or renews) a capacity slot on `target`. The agent's own slot is
/// preferred so it never hops between slots of the same target.
pub fn claim_slot(
    agent: EntityId,
    task_type: TaskType,
    target: EntityId,
    slots: usize,
    ctx: &mut AiContext<'_>,
) -> Option<TaskId> {
    let now = ctx.now();
    let lease = ctx.config.claims.lease_hours;
    let ids = slot_ids(task_type, target, slots);
    if let Some(held) = ctx.claims.held_by(agent, now).filter(|id| ids.contains(id)).cloned() {
        ctx.claims.claim(&held, agent, now, lease);
        return Some(held);
    }
    ids.into_iter().find(|id| ctx.claims.claim(id, agent, now, lease))
}

/// How a chase went this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pursuit {
    /// Target is dead or gone
    Gone,
    /// Target is too far away to keep chasing
    Lost,
    /// Every capacity slot on the target is taken
    Saturated,
    Closing,
    Striking,
}

impl Pursuit {
    pub fn status(self) -> NodeStatus {
        match self {
            Pursuit::Gone => NodeStatus::Success,
            Pursuit::Lost | Pursuit::Saturated => NodeStatus::Failure,
            Pursuit::Closing | Pursuit::Striking => NodeStatus::Running,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Pursuit::Gone => "target gone",
            Pursuit::Lost => "target out of reach",
            Pursuit::Saturated => "target saturated",
            Pursuit::Closing => "closing in",
            Pursuit::Striking => "striking",
        }
    }
}

/// Chases `enemy` with an aggressive action, holding one of its capacity
/// slots while doing so. Gives up past `give_up_distance`.
pub fn pursue(
    agent: &mut Agent,
    enemy: EntityId,
    action: ActiveAction,
    task_type: TaskType,
    slots: usize,
    give_up_distance: f32,
    ctx: &mut AiContext<'_>,
) -> Pursuit {
    let now = ctx.now();
    let target = match ctx.world.agent(enemy) {
        Some(target) if target.is_alive() => target,
        _ => {
            stand_down(agent, enemy, ctx);
            return Pursuit::Gone;
        }
    };
    let distance = ctx.distance(agent.position, target.position);
    if distance > give_up_distance {
        stand_down(agent, enemy, ctx);
        return Pursuit::Lost;
    }
    if claim_slot(agent.id, task_type, enemy, slots, ctx).is_none() {
        stand_down(agent, enemy, ctx);
        return Pursuit::Saturated;
    }

    agent.intent.attack(action, enemy, now);
    if distance <= ctx.config.combat.attack_range {
        Pursuit::Striking
    } else {
        Pursuit::Closing
    }
}

fn stand_down(agent: &mut Agent, enemy: EntityId, ctx: &mut AiContext<'_>) {
    if agent.intent.attack_target == Some(enemy) {
        agent.intent.go_idle(ctx.now());
    }
    ctx.claims.release_all(agent.id);
}

/// Runs directly away from `threat` until it is `safe_distance` away.
/// A threat that is gone or already far enough counts as escaped.
pub fn flee_from(agent: &mut Agent, threat: EntityId, safe_distance: f32, ctx: &AiContext<'_>) -> NodeStatus {
    let now = ctx.now();
    let Some(threat_position) = ctx.world.agent(threat).filter(|t| t.is_alive()).map(|t| t.position) else {
        if agent.intent.active_action == ActiveAction::Fleeing {
            agent.intent.go_idle(now);
        }
        return NodeStatus::Success;
    };
    if ctx.distance(agent.position, threat_position) > safe_distance {
        if agent.intent.active_action == ActiveAction::Fleeing {
            agent.intent.go_idle(now);
        }
        return NodeStatus::Success;
    }
    let away = ctx
        .bounds()
        .away_from(agent.position, threat_position, ctx.config.flee.flee_distance);
    agent.intent.set(ActiveAction::Fleeing, Some(Target::Position(away)), now);
    NodeStatus::Running
}

/// Random point within `radius` of `center`, wrapped onto the map.
pub fn random_point_near(center: Vec2, radius: f32, ctx: &mut AiContext<'_>) -> Vec2 {
    if radius <= 0.0 {
        return center;
    }
    let angle = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = radius * ctx.rng.gen::<f32>().sqrt();
    ctx.bounds()
        .wrap(center + Vec2::new(angle.cos(), angle.sin()) * distance)
}
