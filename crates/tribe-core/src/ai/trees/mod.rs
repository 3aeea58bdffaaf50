//! Behavior tree assemblies.
//!
//! Tribe members share one tree. Its root is a priority selector:
//! 1. flee when badly hurt and the aggressor is close
//! 2. warrior patrol
//! 3. pioneer border expansion
//! 4. leader building placement
//! 5. procreation
//! 6. utility fallback over the human task set

mod building;
mod pioneer;
mod warrior;

pub use building::{building_branch, is_valid_site};
pub use pioneer::{follow_wall, pioneer_branch};
pub use warrior::{warrior_branch, warrior_patrol};

use bevy_ecs::prelude::*;

use crate::ai::behavior_tree::{
    ActionNode, BehaviorTree, BoxedNode, CachingNode, ConditionNode, NodeOutcome, NodeStatus, Selector,
    Sequence, TimeoutNode, Verdict,
};
use crate::ai::blackboard::{BlackboardKey, BlackboardValue};
use crate::ai::steering::flee_from;
use crate::ai::task::run_task_loop;
use crate::ai::tasks::{can_procreate, court, find_partner, HUMAN_TASKS};
use crate::config::AiConfig;

/// Resource: the shared trees, built once from the configuration.
#[derive(Resource, Debug)]
pub struct BehaviorTrees {
    pub human: BehaviorTree,
}

impl BehaviorTrees {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            human: human_tree(config),
        }
    }
}

pub fn human_tree(config: &AiConfig) -> BehaviorTree {
    BehaviorTree::new(Selector::boxed(
        "Human",
        vec![
            flee_branch(),
            warrior_branch(),
            pioneer_branch(),
            building_branch(config),
            procreation_branch(config),
            utility_fallback(config),
        ],
    ))
}

pub fn flee_branch() -> BoxedNode {
    Sequence::boxed(
        "Flee",
        vec![
            ConditionNode::boxed("LowHealthAndThreatened", |agent, ctx, bb| {
                if agent.health_fraction() >= ctx.config.flee.health_fraction {
                    return Verdict::no("healthy enough");
                }
                let Some(aggressor) = agent
                    .last_aggressor
                    .and_then(|id| ctx.world.agent(id))
                    .filter(|a| a.is_alive())
                else {
                    return Verdict::no("no aggressor");
                };
                if ctx.distance(agent.position, aggressor.position) > ctx.config.flee.aggressor_radius {
                    return Verdict::no("aggressor far away");
                }
                bb.set(BlackboardKey::FleeFrom, BlackboardValue::Entity(aggressor.id), ctx.now());
                Verdict::yes()
            }),
            ActionNode::boxed("RunAway", |agent, ctx, bb| {
                let Some(threat) = bb.entity(BlackboardKey::FleeFrom, ctx.now()) else {
                    return NodeOutcome::failure().because("nothing to flee from");
                };
                let status = flee_from(agent, threat, ctx.config.flee.aggressor_radius, ctx);
                if status.is_complete() {
                    bb.delete(BlackboardKey::FleeFrom);
                }
                NodeOutcome::new(status)
            }),
        ],
    )
}

pub fn procreation_branch(config: &AiConfig) -> BoxedNode {
    Sequence::boxed(
        "Procreation",
        vec![
            ConditionNode::boxed("CanProcreate", |agent, ctx, _| Verdict::from(can_procreate(agent, ctx))),
            CachingNode::boxed(
                "PartnerCache",
                config.procreation.partner_cache_hours,
                ConditionNode::boxed("FindPartner", |agent, ctx, bb| match find_partner(agent, ctx) {
                    Some(partner) => {
                        bb.set(BlackboardKey::PartnerCandidate, BlackboardValue::Entity(partner), ctx.now());
                        Verdict::yes()
                    }
                    None => {
                        bb.delete(BlackboardKey::PartnerCandidate);
                        Verdict::no("no partner")
                    }
                }),
            ),
            ActionNode::boxed("ApproachPartner", |agent, ctx, bb| {
                let Some(partner) = bb.entity(BlackboardKey::PartnerCandidate, ctx.now()) else {
                    CachingNode::invalidate(bb, "PartnerCache");
                    return NodeOutcome::failure().because("partner forgotten");
                };
                let status: NodeStatus = court(agent, partner, ctx).into();
                if status == NodeStatus::Running {
                    return NodeOutcome::running().because("approaching partner");
                }
                bb.delete(BlackboardKey::PartnerCandidate);
                CachingNode::invalidate(bb, "PartnerCache");
                NodeOutcome::new(status)
            }),
        ],
    )
}

/// Runs the utility loop; a task that keeps running for longer than the
/// action timeout is abandoned.
pub fn utility_fallback(config: &AiConfig) -> BoxedNode {
    TimeoutNode::boxed(
        "ActionTimeout",
        config.dispatcher.action_timeout_hours,
        ActionNode::boxed("RunTasks", |agent, ctx, bb| match run_task_loop(HUMAN_TASKS, agent, ctx, bb) {
            Some(run) => NodeOutcome::new(run.result.into()).because(run.task.id.to_string()),
            None => NodeOutcome::failure().because("no applicable task"),
        }),
    )
}
