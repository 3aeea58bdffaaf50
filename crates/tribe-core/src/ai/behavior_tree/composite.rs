//! Sequence and Selector.

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::components::Agent;

use super::{BehaviorNode, BoxedNode, NodeOutcome, NodeStatus};

/// Runs children in order until one does not succeed.
pub struct Sequence {
    name: &'static str,
    depth: usize,
    children: Vec<BoxedNode>,
}

impl Sequence {
    pub fn new(name: &'static str, children: Vec<BoxedNode>) -> Self {
        Self { name, depth: 0, children }
    }

    pub fn boxed(name: &'static str, children: Vec<BoxedNode>) -> BoxedNode {
        Box::new(Self::new(name, children))
    }
}

impl BehaviorNode for Sequence {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.assign_depth(depth + 1);
        }
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        for child in &self.children {
            let outcome = child.tick(agent, ctx, bb);
            if outcome.status != NodeStatus::Success {
                return outcome;
            }
        }
        NodeOutcome::success()
    }
}

/// Runs children in priority order until one does not fail.
pub struct Selector {
    name: &'static str,
    depth: usize,
    children: Vec<BoxedNode>,
}

impl Selector {
    pub fn new(name: &'static str, children: Vec<BoxedNode>) -> Self {
        Self { name, depth: 0, children }
    }

    pub fn boxed(name: &'static str, children: Vec<BoxedNode>) -> BoxedNode {
        Box::new(Self::new(name, children))
    }
}

impl BehaviorNode for Selector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.assign_depth(depth + 1);
        }
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        for child in &self.children {
            let outcome = child.tick(agent, ctx, bb);
            if outcome.status != NodeStatus::Failure {
                return outcome;
            }
        }
        NodeOutcome::failure().because("no alternative applies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::behavior_tree::testing::{calls, Scripted};
    use crate::ai::behavior_tree::BehaviorTree;
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::human;

    #[test]
    fn test_sequence_stops_at_running() {
        let (a, a_calls) = Scripted::new("A", NodeStatus::Success);
        let (b, b_calls) = Scripted::new("B", NodeStatus::Running);
        let (c, c_calls) = Scripted::new("C", NodeStatus::Success);
        let tree = BehaviorTree::new(Sequence::boxed("Seq", vec![Box::new(a), Box::new(b), Box::new(c)]));

        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 100.0, 100.0);
        let mut bb = Blackboard::default();
        let outcome = tree.evaluate(&mut agent, &mut sandbox.context(), &mut bb);

        assert_eq!(outcome.status, NodeStatus::Running);
        assert_eq!((calls(&a_calls), calls(&b_calls), calls(&c_calls)), (1, 1, 0));
    }

    #[test]
    fn test_selector_returns_first_success() {
        let (a, a_calls) = Scripted::new("A", NodeStatus::Failure);
        let (b, b_calls) = Scripted::new("B", NodeStatus::Success);
        let (c, c_calls) = Scripted::new("C", NodeStatus::Running);
        let tree = BehaviorTree::new(Selector::boxed("Sel", vec![Box::new(a), Box::new(b), Box::new(c)]));

        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 100.0, 100.0);
        let mut bb = Blackboard::default();
        let outcome = tree.evaluate(&mut agent, &mut sandbox.context(), &mut bb);

        assert_eq!(outcome.status, NodeStatus::Success);
        assert_eq!((calls(&a_calls), calls(&b_calls), calls(&c_calls)), (1, 1, 0));
    }

    #[test]
    fn test_trace_is_post_order_with_depths() {
        let (a, _) = Scripted::new("A", NodeStatus::Failure);
        let (b, _) = Scripted::new("B", NodeStatus::Running);
        let tree = BehaviorTree::new(Selector::boxed(
            "Root",
            vec![Box::new(a), Sequence::boxed("Inner", vec![Box::new(b)])],
        ));

        let mut sandbox = AiSandbox::default().with_trace();
        let mut agent = human(1, 100.0, 100.0);
        let mut bb = Blackboard::default();
        tree.evaluate(&mut agent, &mut sandbox.context(), &mut bb);

        let names: Vec<(usize, &str)> = sandbox
            .trace
            .iter()
            .map(|e| (e.depth, e.name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "A"), (2, "B"), (1, "Inner"), (0, "Root")]);
    }
}
