//! Pioneer border expansion by right-hand wall following.
//!
//! A pioneer keeps a facing in its blackboard and walks the inside of its
//! tribe's border with the unclaimed land on its right. Each step it tries,
//! in order: plant the cell to its right and turn right; walk straight on;
//! turn left (up to four times) and walk. With nowhere to go it forgets its
//! facing and starts over from the nearest frontier.

use tribe_events::{EventOutcome, EventType, PlacementOutcome};

use crate::ai::behavior_tree::{ActionNode, BoxedNode, ConditionNode, NodeOutcome, Selector, Sequence, Verdict};
use crate::ai::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use crate::ai::context::AiContext;
use crate::components::{ActiveAction, Agent, Role, Target, TribeId};
use crate::query::{Cell, GridDir};

pub fn pioneer_branch() -> BoxedNode {
    Sequence::boxed(
        "Pioneer",
        vec![
            ConditionNode::boxed("IsPioneer", |agent, _, _| {
                Verdict::from(agent.role() == Some(Role::Pioneer) && agent.is_adult)
            }),
            ConditionNode::boxed("TerritoryBelowTarget", |agent, ctx, _| territory_below_target(agent, ctx)),
            Selector::boxed(
                "Expand",
                vec![
                    Sequence::boxed(
                        "TraceBorder",
                        vec![
                            ConditionNode::boxed("HasFacing", |_, ctx, bb| {
                                Verdict::from(bb.direction(BlackboardKey::PioneerFacing, ctx.now()).is_some())
                            }),
                            ActionNode::boxed("FollowWall", follow_wall),
                        ],
                    ),
                    ActionNode::boxed("WalkToFrontier", walk_to_frontier),
                ],
            ),
        ],
    )
}

/// The tribe wants `cells_per_member` cells per member, up to `max_cells`.
fn territory_below_target(agent: &Agent, ctx: &AiContext<'_>) -> Verdict {
    let Some(tribe) = agent.tribe() else {
        return Verdict::no("no tribe");
    };
    let members = ctx.world.tribe(tribe).map_or(1, |t| t.member_count().max(1));
    let config = &ctx.config.pioneer;
    let target = ((members as f32 * config.cells_per_member).ceil() as usize).min(config.max_cells);
    if ctx.territory.cell_count(tribe) < target {
        Verdict::yes()
    } else {
        Verdict::no("territory large enough")
    }
}

fn can_walk(ctx: &AiContext<'_>, cell: Cell, tribe: TribeId) -> bool {
    ctx.territory.owner_of(cell) == Some(tribe) || ctx.territory.can_place_border(cell, tribe)
}

fn head_for(agent: &mut Agent, cell: Cell, ctx: &AiContext<'_>, bb: &mut Blackboard) {
    let now = ctx.now();
    let center = ctx.territory.cell_center(cell);
    bb.set(BlackboardKey::PioneerStep, BlackboardValue::Position(center), now);
    agent.intent.set(ActiveAction::Pioneering, Some(Target::Position(center)), now);
}

/// One wall-following step. Expects a facing in the blackboard.
pub fn follow_wall(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
    let now = ctx.now();
    let Some(tribe) = agent.tribe() else {
        return NodeOutcome::failure().because("no tribe");
    };
    let Some(facing) = bb.direction(BlackboardKey::PioneerFacing, now) else {
        return NodeOutcome::failure().because("no facing");
    };

    // Still walking onto the previous step's cell
    if let Some(step) = bb.position(BlackboardKey::PioneerStep, now) {
        if ctx.distance(agent.position, step) > ctx.config.movement.reach {
            agent.intent.set(ActiveAction::Pioneering, Some(Target::Position(step)), now);
            return NodeOutcome::running().because("stepping");
        }
        bb.delete(BlackboardKey::PioneerStep);
    }

    let here = ctx.territory.cell_at(agent.position);
    let right = facing.rotate_right();
    let right_cell = ctx.territory.step(here, right);
    if ctx.territory.can_place_border(right_cell, tribe) {
        ctx.territory.paint(right_cell, tribe);
        bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(right), now);
        agent.intent.set(ActiveAction::Pioneering, None, now);
        let position = ctx.territory.cell_center(right_cell);
        ctx.emit(
            EventType::BorderPlanted,
            agent,
            EventOutcome::Placement(PlacementOutcome {
                what: "border".to_string(),
                position: position.to_array(),
            }),
        );
        return NodeOutcome::running().because("planted border");
    }

    let ahead = ctx.territory.step(here, facing);
    if can_walk(ctx, ahead, tribe) {
        head_for(agent, ahead, ctx, bb);
        return NodeOutcome::running().because("walking along border");
    }

    let mut turned = facing;
    for _ in 0..4 {
        turned = turned.rotate_left();
        let cell = ctx.territory.step(here, turned);
        if can_walk(ctx, cell, tribe) {
            bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(turned), now);
            head_for(agent, cell, ctx, bb);
            return NodeOutcome::running().because("turned left");
        }
    }

    bb.delete(BlackboardKey::PioneerFacing);
    bb.delete(BlackboardKey::PioneerStep);
    agent.intent.go_idle(now);
    NodeOutcome::failure().because("boxed in")
}

/// Walks to the nearest owned cell with room to grow, then faces so the
/// open land is on the right.
fn walk_to_frontier(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
    let now = ctx.now();
    let Some(tribe) = agent.tribe() else {
        return NodeOutcome::failure().because("no tribe");
    };
    let Some(frontier) = ctx.territory.nearest_frontier(ctx.bounds(), agent.position, tribe) else {
        return NodeOutcome::failure().because("no frontier");
    };
    if ctx.territory.cell_at(agent.position) != frontier {
        let center = ctx.territory.cell_center(frontier);
        agent.intent.set(ActiveAction::Pioneering, Some(Target::Position(center)), now);
        return NodeOutcome::running().because("walking to frontier");
    }
    let open = GridDir::ALL
        .into_iter()
        .find(|dir| ctx.territory.can_place_border(ctx.territory.step(frontier, *dir), tribe));
    match open {
        Some(dir) => {
            bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(dir.rotate_left()), now);
            bb.delete(BlackboardKey::PioneerStep);
            agent.intent.set(ActiveAction::Pioneering, None, now);
            NodeOutcome::running().because("facing border")
        }
        None => NodeOutcome::failure().because("frontier closed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::member;

    /// A pioneer standing on the only owned cell of its tribe.
    fn lone_cell() -> (AiSandbox, Agent, Cell) {
        let mut sandbox = AiSandbox::default();
        let agent = member(1, 1, Role::Pioneer, 110.0, 110.0);
        let here = sandbox.territory.cell_at(agent.position);
        sandbox.territory.paint(here, TribeId(1));
        sandbox.populate(vec![agent.clone()], vec![], vec![], vec![]);
        (sandbox, agent, here)
    }

    #[test]
    fn test_plants_right_and_turns_right() {
        let (mut sandbox, mut agent, here) = lone_cell();
        let mut bb = Blackboard::default();
        bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(GridDir::EAST), sandbox.stamp.time);

        let outcome = follow_wall(&mut agent, &mut sandbox.context(), &mut bb);

        assert!(outcome.is_running());
        let planted = sandbox.territory.step(here, GridDir::SOUTH);
        assert_eq!(sandbox.territory.owner_of(planted), Some(TribeId(1)));
        assert_eq!(
            bb.direction(BlackboardKey::PioneerFacing, sandbox.stamp.time),
            Some(GridDir::new(0, 1))
        );
        assert_eq!(sandbox.events.len(), 1);
    }

    #[test]
    fn test_walks_ahead_when_right_is_taken() {
        let (mut sandbox, mut agent, here) = lone_cell();
        let south = sandbox.territory.step(here, GridDir::SOUTH);
        sandbox.territory.paint(south, TribeId(2));
        let mut bb = Blackboard::default();
        bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(GridDir::EAST), sandbox.stamp.time);

        let outcome = follow_wall(&mut agent, &mut sandbox.context(), &mut bb);

        assert!(outcome.is_running());
        let ahead = sandbox.territory.cell_center(sandbox.territory.step(here, GridDir::EAST));
        assert_eq!(bb.position(BlackboardKey::PioneerStep, sandbox.stamp.time), Some(ahead));
        assert_eq!(agent.intent.target, Some(Target::Position(ahead)));
        assert_eq!(
            bb.direction(BlackboardKey::PioneerFacing, sandbox.stamp.time),
            Some(GridDir::EAST)
        );
    }

    #[test]
    fn test_boxed_in_clears_facing() {
        let (mut sandbox, mut agent, here) = lone_cell();
        for dy in -2..=2 {
            for dx in -2..=2 {
                if dx != 0 || dy != 0 {
                    sandbox.territory.paint(Cell::new(here.x + dx, here.y + dy), TribeId(2));
                }
            }
        }
        let mut bb = Blackboard::default();
        bb.set(BlackboardKey::PioneerFacing, BlackboardValue::Direction(GridDir::EAST), sandbox.stamp.time);

        let outcome = follow_wall(&mut agent, &mut sandbox.context(), &mut bb);

        assert!(outcome.is_failure());
        assert_eq!(outcome.reason.as_deref(), Some("boxed in"));
        assert!(bb.direction(BlackboardKey::PioneerFacing, sandbox.stamp.time).is_none());
    }

    #[test]
    fn test_frontier_sets_a_facing_with_open_land_on_the_right() {
        let (mut sandbox, mut agent, here) = lone_cell();
        let mut bb = Blackboard::default();

        let outcome = walk_to_frontier(&mut agent, &mut sandbox.context(), &mut bb);

        assert!(outcome.is_running());
        let facing = bb.direction(BlackboardKey::PioneerFacing, sandbox.stamp.time).unwrap();
        let right = sandbox.territory.step(here, facing.rotate_right());
        assert!(sandbox.territory.can_place_border(right, TribeId(1)));
    }
}
