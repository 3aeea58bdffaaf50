//! Condition and action leaves.

use std::borrow::Cow;

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::components::Agent;

use super::{BehaviorNode, BoxedNode, NodeOutcome, NodeStatus};

/// Result of a condition predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub holds: bool,
    pub reason: Option<Cow<'static, str>>,
}

impl Verdict {
    pub fn yes() -> Self {
        Self { holds: true, reason: None }
    }

    pub fn no(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            holds: false,
            reason: Some(reason.into()),
        }
    }

    pub fn because(mut self, reason: impl Into<Cow<'static, str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl From<bool> for Verdict {
    fn from(holds: bool) -> Self {
        Self { holds, reason: None }
    }
}

type ConditionFn = dyn Fn(&Agent, &AiContext<'_>, &mut Blackboard) -> Verdict + Send + Sync;
type ActionFn = dyn Fn(&mut Agent, &mut AiContext<'_>, &mut Blackboard) -> NodeOutcome + Send + Sync;

/// Predicate over agent, world and blackboard. It may leave data in the
/// blackboard for a following sibling to consume.
pub struct ConditionNode {
    name: &'static str,
    depth: usize,
    predicate: Box<ConditionFn>,
}

impl ConditionNode {
    pub fn new<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&Agent, &AiContext<'_>, &mut Blackboard) -> Verdict + Send + Sync + 'static,
    {
        Self {
            name,
            depth: 0,
            predicate: Box::new(predicate),
        }
    }

    pub fn boxed<F>(name: &'static str, predicate: F) -> BoxedNode
    where
        F: Fn(&Agent, &AiContext<'_>, &mut Blackboard) -> Verdict + Send + Sync + 'static,
    {
        Box::new(Self::new(name, predicate))
    }
}

impl BehaviorNode for ConditionNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let verdict = (self.predicate)(&*agent, &*ctx, bb);
        let status = if verdict.holds {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        };
        NodeOutcome {
            status,
            reason: verdict.reason,
        }
    }
}

/// Mutates the agent (intent, target) or queues a world effect.
pub struct ActionNode {
    name: &'static str,
    depth: usize,
    action: Box<ActionFn>,
}

impl ActionNode {
    pub fn new<F>(name: &'static str, action: F) -> Self
    where
        F: Fn(&mut Agent, &mut AiContext<'_>, &mut Blackboard) -> NodeOutcome + Send + Sync + 'static,
    {
        Self {
            name,
            depth: 0,
            action: Box::new(action),
        }
    }

    pub fn boxed<F>(name: &'static str, action: F) -> BoxedNode
    where
        F: Fn(&mut Agent, &mut AiContext<'_>, &mut Blackboard) -> NodeOutcome + Send + Sync + 'static,
    {
        Box::new(Self::new(name, action))
    }
}

impl BehaviorNode for ActionNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        (self.action)(agent, ctx, bb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::blackboard::{BlackboardKey, BlackboardValue};
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::human;
    use crate::components::EntityId;

    #[test]
    fn test_condition_maps_bool_and_writes_blackboard() {
        let node = ConditionNode::new("Finds", |_agent, ctx, bb| {
            bb.set(BlackboardKey::AttackTarget, BlackboardValue::Entity(EntityId(5)), ctx.now());
            Verdict::yes()
        });
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::default();

        let outcome = node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(outcome.status, NodeStatus::Success);
        assert_eq!(bb.entity(BlackboardKey::AttackTarget, sandbox.stamp.time), Some(EntityId(5)));

        let refuses = ConditionNode::new("Refuses", |_, _, _| Verdict::no("nothing here"));
        let outcome = refuses.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(outcome, NodeOutcome::failure().because("nothing here"));
    }

    #[test]
    fn test_action_mutates_agent() {
        let node = ActionNode::new("Hurt", |agent, _, _| {
            agent.hit_points -= 10.0;
            NodeOutcome::running()
        });
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::default();
        assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_running());
        assert_eq!(agent.hit_points, 90.0);
    }
}
