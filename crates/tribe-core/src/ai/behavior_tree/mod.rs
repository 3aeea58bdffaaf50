//! Behavior Tree Framework
//!
//! Trees are re-walked from the root on every evaluation; there is no stored
//! cursor. A Running action is picked up again only because the same
//! conditions re-detect the same situation from the agent's fields.
//!
//! Nodes are immutable and shared by every agent of an archetype. Anything a
//! node has to remember per agent goes into that agent's `Blackboard`.

mod composite;
mod decorator;
mod leaf;

pub use composite::{Selector, Sequence};
pub use decorator::{CachingNode, CooldownNode, TimeoutNode};
pub use leaf::{ActionNode, ConditionNode, Verdict};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tribe_events::TraceStatus;

use crate::components::Agent;

use super::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use super::context::AiContext;

/// Per-evaluation verdict of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Success,
    Failure,
    Running,
}

impl NodeStatus {
    pub fn is_complete(self) -> bool {
        !matches!(self, NodeStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Success => "success",
            NodeStatus::Failure => "failure",
            NodeStatus::Running => "running",
        }
    }
}

impl From<NodeStatus> for TraceStatus {
    fn from(status: NodeStatus) -> Self {
        match status {
            NodeStatus::Success => TraceStatus::Success,
            NodeStatus::Failure => TraceStatus::Failure,
            NodeStatus::Running => TraceStatus::Running,
        }
    }
}

/// Status plus an optional human-readable reason for debug views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
    pub status: NodeStatus,
    pub reason: Option<Cow<'static, str>>,
}

impl NodeOutcome {
    pub fn new(status: NodeStatus) -> Self {
        Self { status, reason: None }
    }

    pub fn success() -> Self {
        Self::new(NodeStatus::Success)
    }

    pub fn failure() -> Self {
        Self::new(NodeStatus::Failure)
    }

    pub fn running() -> Self {
        Self::new(NodeStatus::Running)
    }

    pub fn because(mut self, reason: impl Into<Cow<'static, str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == NodeStatus::Failure
    }

    pub fn is_running(&self) -> bool {
        self.status == NodeStatus::Running
    }
}

/// A node in a behavior tree.
pub trait BehaviorNode: Send + Sync {
    fn name(&self) -> &'static str;

    /// Depth below the root, for indentation in traces.
    fn depth(&self) -> usize;

    /// Sets this node's depth and its children's.
    fn assign_depth(&mut self, depth: usize);

    /// Evaluates the node without recording it.
    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome;

    /// Evaluates the node and records it in the context's trace, if any.
    fn tick(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let outcome = self.evaluate(agent, ctx, bb);
        ctx.record(self.depth(), self.name(), &outcome);
        outcome
    }
}

pub type BoxedNode = Box<dyn BehaviorNode>;

/// Root wrapper: fixes depths once when the tree is assembled.
pub struct BehaviorTree {
    root: BoxedNode,
}

impl BehaviorTree {
    pub fn new(mut root: BoxedNode) -> Self {
        root.assign_depth(0);
        Self { root }
    }

    pub fn name(&self) -> &'static str {
        self.root.name()
    }

    /// Walks the tree once and stamps the evaluation time, so nodes can
    /// tell whether they were reached on the previous evaluation.
    pub fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let outcome = self.root.tick(agent, ctx, bb);
        let now = ctx.now();
        bb.set(BlackboardKey::LastEvaluation, BlackboardValue::Time(now), now);
        outcome
    }
}

impl std::fmt::Debug for BehaviorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTree").field("root", &self.root.name()).finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted nodes for exercising composites and decorators.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed status and counts how often it was evaluated.
    pub struct Scripted {
        pub name: &'static str,
        pub status: NodeStatus,
        pub calls: Arc<AtomicUsize>,
        depth: usize,
    }

    impl Scripted {
        pub fn new(name: &'static str, status: NodeStatus) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    status,
                    calls: Arc::clone(&calls),
                    depth: 0,
                },
                calls,
            )
        }
    }

    impl BehaviorNode for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn depth(&self) -> usize {
            self.depth
        }

        fn assign_depth(&mut self, depth: usize) {
            self.depth = depth;
        }

        fn evaluate(&self, _agent: &mut Agent, _ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> NodeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            NodeOutcome::new(self.status)
        }
    }

    pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}
