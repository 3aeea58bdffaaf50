//! Decorators: cooldown, caching and timeout.
//!
//! Each keeps its per-agent memory in the blackboard under its own name, so
//! decorator names must be unique within a tree.

use crate::ai::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use crate::ai::context::AiContext;
use crate::components::Agent;

use super::{BehaviorNode, BoxedNode, NodeOutcome, NodeStatus};

/// Suppresses its child for `hours` after the child last completed.
pub struct CooldownNode {
    name: &'static str,
    depth: usize,
    hours: f64,
    child: BoxedNode,
}

impl CooldownNode {
    pub fn new(name: &'static str, hours: f64, child: BoxedNode) -> Self {
        Self { name, depth: 0, hours, child }
    }

    pub fn boxed(name: &'static str, hours: f64, child: BoxedNode) -> BoxedNode {
        Box::new(Self::new(name, hours, child))
    }
}

impl BehaviorNode for CooldownNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        self.child.assign_depth(depth + 1);
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let now = ctx.now();
        let key = BlackboardKey::CooldownStamp(self.name);
        if let Some(last) = bb.time(key, now) {
            if !now.has_elapsed(last, self.hours) {
                return NodeOutcome::failure().because("cooling down");
            }
        }

        let outcome = self.child.tick(agent, ctx, bb);
        if outcome.status.is_complete() {
            bb.set(key, BlackboardValue::Time(now), now);
        }
        outcome
    }
}

/// Reuses its child's last completed verdict for `hours`.
pub struct CachingNode {
    name: &'static str,
    depth: usize,
    hours: f64,
    child: BoxedNode,
}

impl CachingNode {
    pub fn new(name: &'static str, hours: f64, child: BoxedNode) -> Self {
        Self { name, depth: 0, hours, child }
    }

    pub fn boxed(name: &'static str, hours: f64, child: BoxedNode) -> BoxedNode {
        Box::new(Self::new(name, hours, child))
    }

    /// Forgets the cached verdict so the child runs on the next evaluation.
    pub fn invalidate(bb: &mut Blackboard, name: &'static str) {
        bb.delete(BlackboardKey::CacheVerdict(name));
    }
}

impl BehaviorNode for CachingNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        self.child.assign_depth(depth + 1);
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let now = ctx.now();
        let key = BlackboardKey::CacheVerdict(self.name);
        if let (Some(status), Some(age)) = (bb.status(key, now), bb.age(key, now)) {
            if age < self.hours {
                return NodeOutcome::new(status).because("cached");
            }
        }

        let outcome = self.child.tick(agent, ctx, bb);
        if outcome.status.is_complete() {
            bb.set(key, BlackboardValue::Status(outcome.status), now);
        } else {
            bb.delete(key);
        }
        outcome
    }
}

/// Turns a child that has kept the same action and target Running for
/// `hours` into a Failure and abandons whatever the agent was doing. The
/// window restarts when the action changes or the node was not reached on
/// the agent's previous evaluation.
pub struct TimeoutNode {
    name: &'static str,
    depth: usize,
    hours: f64,
    child: BoxedNode,
}

impl TimeoutNode {
    pub fn new(name: &'static str, hours: f64, child: BoxedNode) -> Self {
        Self { name, depth: 0, hours, child }
    }

    pub fn boxed(name: &'static str, hours: f64, child: BoxedNode) -> BoxedNode {
        Box::new(Self::new(name, hours, child))
    }
}

impl BehaviorNode for TimeoutNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn assign_depth(&mut self, depth: usize) {
        self.depth = depth;
        self.child.assign_depth(depth + 1);
    }

    fn evaluate(&self, agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
        let now = ctx.now();
        let start_key = BlackboardKey::TimeoutStart(self.name);
        let action_key = BlackboardKey::TimeoutAction(self.name);
        let seen_key = BlackboardKey::TimeoutSeen(self.name);

        // Skipped on the previous evaluation: whatever ran back then was
        // interrupted, so its window does not carry over.
        let previous = bb.time(BlackboardKey::LastEvaluation, now);
        if previous.is_some() && bb.time(seen_key, now) != previous {
            bb.delete(start_key);
            bb.delete(action_key);
        }
        bb.set(seen_key, BlackboardValue::Time(now), now);

        if let Some(start) = bb.time(start_key, now) {
            if now.has_elapsed(start, self.hours) {
                bb.delete(start_key);
                bb.delete(action_key);
                agent.intent.go_idle(now);
                ctx.claims.release_all(agent.id);
                return NodeOutcome::failure().because("timed out");
            }
        }

        let outcome = self.child.tick(agent, ctx, bb);
        match outcome.status {
            // The window belongs to one action and target. The start time
            // travels in the value; rewriting keeps the entry younger than
            // the TTL while the same action keeps running.
            NodeStatus::Running => {
                let running = BlackboardValue::Action(agent.intent.active_action, agent.intent.target);
                let start = match bb.get(action_key, now) {
                    Some(watched) if watched == running => bb.time(start_key, now).unwrap_or(now),
                    _ => now,
                };
                bb.set(start_key, BlackboardValue::Time(start), now);
                bb.set(action_key, running, now);
            }
            NodeStatus::Success | NodeStatus::Failure => {
                bb.delete(start_key);
                bb.delete(action_key);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::behavior_tree::testing::{calls, Scripted};
    use crate::ai::context::AiSandbox;
    use crate::ai::behavior_tree::{ActionNode, BehaviorTree, Selector};
    use crate::ai::testing::human;
    use crate::components::{ActiveAction, Target, Vec2};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tribe_events::GameTime;

    #[test]
    fn test_cooldown_suppresses_after_completion() {
        let (child, child_calls) = Scripted::new("Scan", NodeStatus::Success);
        let node = CooldownNode::new("ScanCooldown", 6.0, Box::new(child));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::default();

        assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_success());
        sandbox.set_time(GameTime::from_hours(3.0));
        let suppressed = node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(suppressed.status, NodeStatus::Failure);
        assert_eq!(calls(&child_calls), 1);

        sandbox.set_time(GameTime::from_hours(6.0));
        assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_success());
        assert_eq!(calls(&child_calls), 2);
    }

    #[test]
    fn test_cooldown_does_not_start_while_child_runs() {
        let (child, child_calls) = Scripted::new("Walk", NodeStatus::Running);
        let node = CooldownNode::new("WalkCooldown", 6.0, Box::new(child));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::default();

        for step in 0..4 {
            sandbox.set_time(GameTime::from_hours(step as f64));
            assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_running());
        }
        assert_eq!(calls(&child_calls), 4);
    }

    #[test]
    fn test_caching_reuses_verdict_within_window() {
        let (child, child_calls) = Scripted::new("FindPartner", NodeStatus::Failure);
        let node = CachingNode::new("PartnerCache", 4.0, Box::new(child));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::default();

        assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_failure());
        sandbox.set_time(GameTime::from_hours(2.0));
        let cached = node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert!(cached.is_failure());
        assert_eq!(calls(&child_calls), 1);

        sandbox.set_time(GameTime::from_hours(4.5));
        node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(calls(&child_calls), 2);

        CachingNode::invalidate(&mut bb, "PartnerCache");
        node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(calls(&child_calls), 3);
    }

    #[test]
    fn test_timeout_fails_stuck_child() {
        let (child, child_calls) = Scripted::new("Stuck", NodeStatus::Running);
        let node = TimeoutNode::new("StuckTimeout", 24.0, Box::new(child));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::new(24.0);

        let mut hour = 0.0;
        while hour < 24.0 {
            sandbox.set_time(GameTime::from_hours(hour));
            assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_running());
            hour += 0.5;
        }
        sandbox.set_time(GameTime::from_hours(24.0));
        let outcome = node.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
        assert_eq!(outcome, NodeOutcome::failure().because("timed out"));
        assert_eq!(calls(&child_calls), 48);

        // The next evaluation starts a fresh window
        sandbox.set_time(GameTime::from_hours(24.5));
        assert!(node.evaluate(&mut agent, &mut sandbox.context(), &mut bb).is_running());
    }

    #[test]
    fn test_timeout_window_restarts_after_interruption() {
        let urgent = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&urgent);
        let (child, child_calls) = Scripted::new("Chore", NodeStatus::Running);
        let tree = BehaviorTree::new(Selector::boxed(
            "Root",
            vec![
                ActionNode::boxed("Urgent", move |_, _, _| {
                    if flag.load(Ordering::SeqCst) {
                        NodeOutcome::success()
                    } else {
                        NodeOutcome::failure()
                    }
                }),
                TimeoutNode::boxed("ChoreTimeout", 24.0, Box::new(child)),
            ],
        ));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::new(24.0);
        let mut run = |hour: u32, agent: &mut Agent, bb: &mut Blackboard| {
            sandbox.set_time(GameTime::from_hours(hour as f64));
            tree.evaluate(agent, &mut sandbox.context(), bb)
        };

        for hour in 0..=20 {
            assert!(run(hour, &mut agent, &mut bb).is_running());
        }
        urgent.store(true, Ordering::SeqCst);
        for hour in 21..30 {
            assert!(run(hour, &mut agent, &mut bb).is_success());
        }
        urgent.store(false, Ordering::SeqCst);

        let resumed = run(30, &mut agent, &mut bb);
        assert!(resumed.is_running(), "got {:?}", resumed);
        assert_eq!(calls(&child_calls), 22);

        // The new window still catches a stuck child
        for hour in 31..54 {
            assert!(run(hour, &mut agent, &mut bb).is_running());
        }
        assert_eq!(run(54, &mut agent, &mut bb), NodeOutcome::failure().because("timed out"));
    }

    #[test]
    fn test_timeout_window_follows_the_running_action() {
        // A new walk target every 10 hours, never finishing
        let tree = BehaviorTree::new(TimeoutNode::boxed(
            "ErrandTimeout",
            24.0,
            ActionNode::boxed("Errand", |agent, ctx, _| {
                let now = ctx.now();
                let leg = (now.hours() / 10.0).floor() as f32;
                agent
                    .intent
                    .set(ActiveAction::Walking, Some(Target::Position(Vec2::new(leg * 10.0, 0.0))), now);
                NodeOutcome::running()
            }),
        ));
        let mut sandbox = AiSandbox::default();
        let mut agent = human(1, 0.0, 0.0);
        let mut bb = Blackboard::new(24.0);

        for hour in 0..=60 {
            sandbox.set_time(GameTime::from_hours(hour as f64));
            let outcome = tree.evaluate(&mut agent, &mut sandbox.context(), &mut bb);
            assert!(outcome.is_running(), "hour {hour}: {:?}", outcome);
        }
        assert_eq!(agent.intent.active_action, ActiveAction::Walking);
    }
}
