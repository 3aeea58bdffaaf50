//! Warrior patrol: defend the territory, engage what comes close, otherwise
//! walk the border.

use rand::seq::SliceRandom;

use crate::ai::behavior_tree::{ActionNode, BoxedNode, ConditionNode, NodeOutcome, Selector, Sequence, Verdict};
use crate::ai::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use crate::ai::context::AiContext;
use crate::ai::steering::{home_of, hostiles_near, is_hostile, pursue, random_point_near, slot_available, Pursuit};
use crate::ai::task::TaskType;
use crate::ai::tasks::food::hungry_threshold;
use crate::components::{ActiveAction, Agent, EntityId, Role, Target};

pub fn warrior_branch() -> BoxedNode {
    Sequence::boxed(
        "Warrior",
        vec![
            ConditionNode::boxed("IsWarrior", |agent, _, _| {
                Verdict::from(agent.role() == Some(Role::Warrior) && agent.is_adult)
            }),
            ConditionNode::boxed("NotHungry", |agent, ctx, _| {
                if agent.hunger < hungry_threshold(agent, ctx) {
                    Verdict::yes()
                } else {
                    Verdict::no("hungry")
                }
            }),
            warrior_patrol(),
        ],
    )
}

/// The three-branch patrol selector.
pub fn warrior_patrol() -> BoxedNode {
    Selector::boxed(
        "WarriorPatrol",
        vec![
            Sequence::boxed(
                "DefendTerritory",
                vec![
                    ConditionNode::boxed("IntruderOnTerritory", find_intruder),
                    ActionNode::boxed("AttackIntruder", |agent, ctx, bb| attack(agent, ctx, bb, true)),
                ],
            ),
            Sequence::boxed(
                "EngageNearby",
                vec![
                    ConditionNode::boxed("HostileNearby", find_nearby_hostile),
                    ActionNode::boxed("AttackNearby", |agent, ctx, bb| attack(agent, ctx, bb, false)),
                ],
            ),
            Sequence::boxed(
                "Patrol",
                vec![
                    ActionNode::boxed("PickPatrolPoint", pick_patrol_point),
                    ActionNode::boxed("WalkToPatrolPoint", walk_to_patrol_point),
                ],
            ),
        ],
    )
}

fn can_attack(agent: &Agent, enemy: &Agent, ctx: &AiContext<'_>) -> bool {
    is_hostile(agent, enemy)
        && slot_available(
            agent.id,
            TaskType::AttackHostile,
            enemy.id,
            ctx.config.combat.max_attackers_per_target,
            ctx,
        )
}

fn too_far_from_home(agent: &Agent, ctx: &AiContext<'_>) -> bool {
    ctx.distance(agent.position, home_of(agent, ctx)) > ctx.config.patrol.max_distance_from_home
}

/// Keeps the current fight going if its target is still valid, otherwise
/// looks for a hostile standing on the tribe's land.
fn find_intruder(agent: &Agent, ctx: &AiContext<'_>, bb: &mut Blackboard) -> Verdict {
    let now = ctx.now();
    let Some(tribe) = agent.tribe() else {
        return Verdict::no("no tribe");
    };
    if let Some(current) = agent.intent.attack_target.filter(|_| agent.intent.active_action.is_aggressive()) {
        if let Some(enemy) = ctx.world.agent(current) {
            if is_hostile(agent, enemy) {
                bb.set(BlackboardKey::AttackTarget, BlackboardValue::Entity(current), now);
                return Verdict::yes().because("continuing attack");
            }
        }
    }
    let intruder = hostiles_near(agent, ctx, ctx.config.combat.detection_radius)
        .into_iter()
        .find(|(enemy, _)| ctx.territory.is_owned_by(enemy.position, tribe) && can_attack(agent, enemy, ctx));
    match intruder {
        Some((enemy, _)) => {
            bb.set(BlackboardKey::AttackTarget, BlackboardValue::Entity(enemy.id), now);
            Verdict::yes()
        }
        None => Verdict::no("no intruders"),
    }
}

fn find_nearby_hostile(agent: &Agent, ctx: &AiContext<'_>, bb: &mut Blackboard) -> Verdict {
    if too_far_from_home(agent, ctx) {
        return Verdict::no("too far from home");
    }
    let nearest = hostiles_near(agent, ctx, ctx.config.combat.detection_radius)
        .into_iter()
        .find(|(enemy, _)| can_attack(agent, enemy, ctx));
    match nearest {
        Some((enemy, _)) => {
            bb.set(BlackboardKey::AttackTarget, BlackboardValue::Entity(enemy.id), ctx.now());
            Verdict::yes()
        }
        None => Verdict::no("no hostiles nearby"),
    }
}

/// Attacks the blackboard's target. Defenders give up once the chase has
/// drifted too far from home.
fn attack(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard, defending: bool) -> NodeOutcome {
    let now = ctx.now();
    let Some(enemy) = bb.entity(BlackboardKey::AttackTarget, now) else {
        return NodeOutcome::failure().because("no attack target");
    };
    if defending && too_far_from_home(agent, ctx) {
        abandon(agent, enemy, ctx, bb);
        return NodeOutcome::failure().because("too far from home");
    }
    let slots = ctx.config.combat.max_attackers_per_target;
    let give_up = ctx.config.combat.detection_radius * 2.0;
    let pursuit = pursue(agent, enemy, ActiveAction::Attacking, TaskType::AttackHostile, slots, give_up, ctx);
    if !matches!(pursuit, Pursuit::Closing | Pursuit::Striking) {
        bb.delete(BlackboardKey::AttackTarget);
    }
    NodeOutcome::new(pursuit.status()).because(pursuit.reason())
}

fn abandon(agent: &mut Agent, enemy: EntityId, ctx: &mut AiContext<'_>, bb: &mut Blackboard) {
    if agent.intent.attack_target == Some(enemy) {
        agent.intent.go_idle(ctx.now());
    }
    ctx.claims.release_all(agent.id);
    bb.delete(BlackboardKey::AttackTarget);
}

/// Keeps the current patrol point until it is reached or the re-pick
/// cooldown passes. New points are border cells, or a ring around home for
/// a tribe with no border yet.
fn pick_patrol_point(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
    let now = ctx.now();
    // Patrolling pursues nothing, so drop any leftover attack slot
    ctx.claims.release_all(agent.id);

    let fresh = bb
        .time(BlackboardKey::PatrolPickedAt, now)
        .is_some_and(|at| !now.has_elapsed(at, ctx.config.patrol.repick_cooldown_hours));
    if fresh && bb.position(BlackboardKey::PatrolPoint, now).is_some() {
        return NodeOutcome::success().because("keeping patrol point");
    }

    let border = agent
        .tribe()
        .map(|tribe| ctx.territory.border_cells(tribe))
        .unwrap_or_default();
    let point = match border.choose(&mut *ctx.rng) {
        Some(cell) => ctx.territory.cell_center(*cell),
        None => {
            let home = home_of(agent, ctx);
            random_point_near(home, ctx.config.patrol.fallback_radius, ctx)
        }
    };
    bb.set(BlackboardKey::PatrolPoint, BlackboardValue::Position(point), now);
    bb.set(BlackboardKey::PatrolPickedAt, BlackboardValue::Time(now), now);
    NodeOutcome::success().because("picked patrol point")
}

fn walk_to_patrol_point(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
    let now = ctx.now();
    let Some(point) = bb.position(BlackboardKey::PatrolPoint, now) else {
        return NodeOutcome::failure().because("no patrol point");
    };
    if ctx.distance(agent.position, point) <= ctx.config.patrol.arrival_distance {
        bb.delete(BlackboardKey::PatrolPoint);
        agent.intent.go_idle(now);
        return NodeOutcome::success().because("arrived");
    }
    agent.intent.set(ActiveAction::Patrolling, Some(Target::Position(point)), now);
    NodeOutcome::running().because("walking patrol")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::behavior_tree::BehaviorTree;
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::{member, predator};
    use crate::components::{TribeId, Vec2};

    fn sandbox_with(agents: Vec<Agent>) -> AiSandbox {
        let mut sandbox = AiSandbox::default();
        sandbox.territory.paint_disc(Vec2::new(200.0, 200.0), 2, TribeId(1));
        sandbox.populate(agents, vec![], vec![], vec![]);
        sandbox
    }

    #[test]
    fn test_patrol_walks_to_border_point_then_succeeds() {
        let mut warrior = member(1, 1, Role::Warrior, 200.0, 200.0);
        let mut sandbox = sandbox_with(vec![warrior.clone()]);
        let tree = BehaviorTree::new(warrior_patrol());
        let mut bb = Blackboard::default();

        let outcome = tree.evaluate(&mut warrior, &mut sandbox.context(), &mut bb);
        assert!(outcome.is_running());
        assert_eq!(warrior.intent.active_action, ActiveAction::Patrolling);
        let point = bb.position(BlackboardKey::PatrolPoint, sandbox.stamp.time).unwrap();
        let cell = sandbox.territory.cell_at(point);
        assert!(sandbox.territory.border_cells(TribeId(1)).contains(&cell));

        // 11 units short of the point: still walking
        warrior.position = Vec2::new(point.x - 11.0, point.y);
        let outcome = tree.evaluate(&mut warrior, &mut sandbox.context(), &mut bb);
        assert!(outcome.is_running());
        assert_eq!(bb.position(BlackboardKey::PatrolPoint, sandbox.stamp.time), Some(point));

        warrior.position = Vec2::new(point.x - 9.0, point.y);
        let outcome = tree.evaluate(&mut warrior, &mut sandbox.context(), &mut bb);
        assert!(outcome.is_success());
        assert!(bb.position(BlackboardKey::PatrolPoint, sandbox.stamp.time).is_none());
    }

    #[test]
    fn test_intruder_on_territory_is_attacked_first() {
        let mut warrior = member(1, 1, Role::Warrior, 200.0, 200.0);
        let intruder = member(2, 2, Role::Gatherer, 215.0, 200.0);
        let outsider = predator(3, 260.0, 200.0);
        let mut sandbox = sandbox_with(vec![warrior.clone(), intruder, outsider]);
        let tree = BehaviorTree::new(warrior_patrol());
        let mut bb = Blackboard::default();

        let outcome = tree.evaluate(&mut warrior, &mut sandbox.context(), &mut bb);
        assert!(outcome.is_running());
        assert!(warrior.intent.is_attacking(EntityId(2)));
    }

    #[test]
    fn test_nearby_hostile_off_territory_is_engaged() {
        let mut warrior = member(1, 1, Role::Warrior, 200.0, 200.0);
        let mut sandbox = sandbox_with(vec![warrior.clone(), predator(3, 270.0, 200.0)]);
        let tree = BehaviorTree::new(warrior_patrol());
        let mut bb = Blackboard::default();

        assert!(tree.evaluate(&mut warrior, &mut sandbox.context(), &mut bb).is_running());
        assert!(warrior.intent.is_attacking(EntityId(3)));
    }

    #[test]
    fn test_defender_gives_up_far_from_home() {
        let mut warrior = member(1, 1, Role::Warrior, 600.0, 200.0);
        let mut sandbox = sandbox_with(vec![
            warrior.clone(),
            member(4, 1, Role::Gatherer, 200.0, 200.0),
            member(6, 1, Role::Gatherer, 200.0, 200.0),
            member(2, 2, Role::Warrior, 610.0, 200.0),
        ]);
        warrior.intent.attack(ActiveAction::Attacking, EntityId(2), sandbox.stamp.time);
        // The tribe center stays near the two members at home
        let mut bb = Blackboard::default();

        let verdict = find_intruder(&warrior, &sandbox.context(), &mut bb);
        assert!(verdict.holds);
        let outcome = attack(&mut warrior, &mut sandbox.context(), &mut bb, true);
        assert!(outcome.is_failure());
        assert_eq!(warrior.intent.active_action, ActiveAction::Idle);
        assert!(bb.entity(BlackboardKey::AttackTarget, sandbox.stamp.time).is_none());
    }

    #[test]
    fn test_dead_target_is_success() {
        let mut warrior = member(1, 1, Role::Warrior, 200.0, 200.0);
        let mut corpse = member(2, 2, Role::Warrior, 205.0, 200.0);
        corpse.hit_points = 0.0;
        let mut sandbox = sandbox_with(vec![warrior.clone(), corpse]);
        let mut bb = Blackboard::default();
        bb.set(BlackboardKey::AttackTarget, BlackboardValue::Entity(EntityId(2)), sandbox.stamp.time);

        let outcome = attack(&mut warrior, &mut sandbox.context(), &mut bb, true);
        assert!(outcome.is_success());
    }
}
