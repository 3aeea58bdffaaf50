//! AI Dispatcher
//!
//! Decides whether an agent is evaluated this tick and routes it by kind:
//! tribe members walk the shared behavior tree, animals run the task loop
//! over their kind's task set.
//!
//! Evaluation is throttled per agent. Each kind has an interval, and ids
//! are spread over a few ticks so that a whole population is not evaluated
//! on the same tick. A decision that finished (Success or Failure) is
//! followed by a fresh one on the next tick.

use tracing::debug;
use tribe_events::{DecisionOutcome, DecisionSource, EventOutcome, EventType, GameTime};

use crate::components::{Agent, AgentKind, AiSchedule};
use crate::config::AiConfig;

use super::behavior_tree::NodeStatus;
use super::blackboard::Blackboard;
use super::context::AiContext;
use super::task::run_task_loop;
use super::tasks::tasks_for;
use super::trees::BehaviorTrees;

/// Hours between evaluations of a still-running decision.
pub fn evaluation_interval(kind: AgentKind, config: &AiConfig) -> f64 {
    match kind {
        AgentKind::TribeMember { .. } => config.dispatcher.human_interval_hours,
        AgentKind::Predator => config.dispatcher.predator_interval_hours,
        AgentKind::Prey => config.dispatcher.prey_interval_hours,
    }
}

/// First evaluation, offset by a few ticks depending on the id.
pub fn initial_schedule(agent: &Agent, now: GameTime, config: &AiConfig) -> AiSchedule {
    let spread = config.dispatcher.phase_spread_ticks.max(1);
    let offset = (agent.id.0 % spread) as f64 * config.simulation.hours_per_tick;
    AiSchedule::starting_at(now + offset)
}

/// What one evaluation decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub source: DecisionSource,
    pub status: NodeStatus,
    pub reason: Option<String>,
}

/// Evaluates `agent` once, whatever its schedule.
pub fn decide(agent: &mut Agent, bb: &mut Blackboard, trees: &BehaviorTrees, ctx: &mut AiContext<'_>) -> Decision {
    match agent.kind {
        AgentKind::TribeMember { .. } => {
            let outcome = trees.human.evaluate(agent, ctx, bb);
            Decision {
                source: DecisionSource::BehaviorTree,
                status: outcome.status,
                reason: outcome.reason.map(|r| r.into_owned()),
            }
        }
        AgentKind::Predator | AgentKind::Prey => match run_task_loop(tasks_for(agent.kind), agent, ctx, bb) {
            Some(run) => Decision {
                source: DecisionSource::TaskLoop,
                status: run.result.into(),
                reason: Some(run.task.id.to_string()),
            },
            None => {
                agent.intent.go_idle(ctx.now());
                Decision {
                    source: DecisionSource::TaskLoop,
                    status: NodeStatus::Failure,
                    reason: Some("no applicable task".to_string()),
                }
            }
        },
    }
}

/// Evaluates `agent` if it is due and reschedules it. Records a decision
/// event whenever the active action changes.
pub fn dispatch(
    agent: &mut Agent,
    bb: &mut Blackboard,
    schedule: &mut AiSchedule,
    trees: &BehaviorTrees,
    ctx: &mut AiContext<'_>,
) -> Option<Decision> {
    let now = ctx.now();
    if !schedule.is_due(now) {
        return None;
    }

    let before = agent.intent.active_action;
    let decision = decide(agent, bb, trees, ctx);

    schedule.evaluations += 1;
    schedule.next_evaluation = if decision.status.is_complete() {
        now
    } else {
        now + evaluation_interval(agent.kind, ctx.config)
    };

    let after = agent.intent.active_action;
    if after != before {
        debug!(
            agent = agent.id.0,
            from = before.as_str(),
            to = after.as_str(),
            status = decision.status.as_str(),
            "decision made"
        );
        ctx.emit(
            EventType::Decision,
            agent,
            EventOutcome::Decision(DecisionOutcome {
                source: decision.source,
                action: after.as_str().to_string(),
                status: decision.status.as_str().to_string(),
                reason: decision.reason.clone(),
            }),
        );
    }
    Some(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::testing::{human, predator, prey};
    use crate::ai::blackboard::{BlackboardKey, BlackboardValue};
    use crate::components::{ActiveAction, Vec2};

    #[test]
    fn test_phase_offsets_spread_by_id() {
        let config = AiConfig::default();
        let hours = config.simulation.hours_per_tick;
        let starts: Vec<f64> = (0..4)
            .map(|id| initial_schedule(&human(id, 0.0, 0.0), GameTime::ZERO, &config).next_evaluation.hours())
            .collect();
        assert_eq!(starts, vec![0.0, hours, 2.0 * hours, 0.0]);
    }

    #[test]
    fn test_routes_by_kind() {
        let mut sandbox = AiSandbox::default();
        let trees = BehaviorTrees::new(&sandbox.config);
        let mut member = human(1, 300.0, 300.0);
        let mut deer = prey(2, 600.0, 600.0);
        sandbox.populate(vec![member.clone(), deer.clone()], vec![], vec![], vec![]);

        let tree = decide(&mut member, &mut Blackboard::default(), &trees, &mut sandbox.context());
        assert_eq!(tree.source, DecisionSource::BehaviorTree);

        let tasks = decide(&mut deer, &mut Blackboard::default(), &trees, &mut sandbox.context());
        assert_eq!(tasks.source, DecisionSource::TaskLoop);
        assert_eq!(deer.intent.active_action, ActiveAction::Wandering);
    }

    #[test]
    fn test_running_waits_for_interval_and_complete_reevaluates() {
        let mut sandbox = AiSandbox::default();
        let trees = BehaviorTrees::new(&sandbox.config);
        let mut deer = prey(2, 600.0, 600.0);
        let mut member = human(1, 300.0, 300.0);
        sandbox.populate(vec![deer.clone(), member.clone()], vec![], vec![], vec![]);
        let mut bb = Blackboard::default();

        let mut schedule = AiSchedule::starting_at(GameTime::ZERO);
        let decision = dispatch(&mut deer, &mut bb, &mut schedule, &trees, &mut sandbox.context()).unwrap();
        assert_eq!(decision.status, NodeStatus::Running);
        assert_eq!(schedule.next_evaluation.hours(), sandbox.config.dispatcher.prey_interval_hours);
        assert_eq!(schedule.evaluations, 1);
        // Not due yet
        assert!(dispatch(&mut deer, &mut bb, &mut schedule, &trees, &mut sandbox.context()).is_none());

        // An idle member finishes its decision and is looked at again next tick
        let mut schedule = AiSchedule::starting_at(GameTime::ZERO);
        let decision = dispatch(&mut member, &mut Blackboard::default(), &mut schedule, &trees, &mut sandbox.context());
        assert!(decision.unwrap().status.is_complete());
        assert_eq!(schedule.next_evaluation, GameTime::ZERO);
    }

    #[test]
    fn test_decision_event_only_on_action_change() {
        let mut sandbox = AiSandbox::default();
        let trees = BehaviorTrees::new(&sandbox.config);
        let mut hunter = predator(1, 100.0, 100.0);
        sandbox.populate(vec![hunter.clone()], vec![], vec![], vec![]);
        let mut bb = Blackboard::default();

        let mut schedule = AiSchedule::starting_at(GameTime::ZERO);
        dispatch(&mut hunter, &mut bb, &mut schedule, &trees, &mut sandbox.context());
        let after_first = sandbox.events.iter().filter(|e| e.event_type == EventType::Decision).count();
        assert_eq!(after_first, 1);

        // Pin the wander point so the second evaluation keeps wandering
        let far = Vec2::new(160.0, 100.0);
        bb.set(BlackboardKey::WanderPoint, BlackboardValue::Position(far), GameTime::ZERO);
        sandbox.set_time(GameTime::from_hours(1.0));
        dispatch(&mut hunter, &mut bb, &mut schedule, &trees, &mut sandbox.context());
        let after_second = sandbox.events.iter().filter(|e| e.event_type == EventType::Decision).count();
        assert_eq!(after_second, 1);
    }
}
