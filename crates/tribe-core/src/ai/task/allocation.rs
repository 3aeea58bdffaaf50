//! Task allocation loop: produce, score, pick, claim, execute.

use tracing::{debug, trace};
use tribe_events::{EventOutcome, EventType, GeneralOutcome, TaskOutcome};

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::components::Agent;

use super::{Task, TaskDefinition, TaskResult};

/// A scored, applicable task.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub task: Task,
    pub score: f32,
    /// Index into the definition slice that produced it
    pub definition: usize,
}

/// What the loop did for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRun {
    pub task: Task,
    pub score: f32,
    pub result: TaskResult,
}

/// Every applicable, unexpired candidate, best first. Equal scores are
/// ordered by ascending task id.
pub fn collect_candidates(definitions: &[TaskDefinition], agent: &Agent, ctx: &AiContext<'_>) -> Vec<Candidate> {
    let now = ctx.now();
    let mut candidates = Vec::new();
    for (index, definition) in definitions.iter().enumerate() {
        for (_, task) in (definition.producer)(agent, ctx) {
            if task.is_expired(now) {
                continue;
            }
            let Some(score) = (definition.scorer)(agent, &task, ctx) else {
                continue;
            };
            if !score.is_finite() {
                continue;
            }
            candidates.push(Candidate {
                task,
                score: score.clamp(0.0, 1.0),
                definition: index,
            });
        }
    }
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.task.id.cmp(&b.task.id))
    });
    candidates
}

/// Runs one allocation round for `agent`.
///
/// The best candidate whose id is not claimed by another agent wins, is
/// claimed, and is executed. Running keeps the claim; Success or Failure
/// releases it. Returns `None` when nothing applies.
pub fn run_task_loop(
    definitions: &[TaskDefinition],
    agent: &mut Agent,
    ctx: &mut AiContext<'_>,
    bb: &mut Blackboard,
) -> Option<TaskRun> {
    let now = ctx.now();
    let previous = ctx.claims.held_by(agent.id, now).cloned();

    let mut chosen = None;
    let mut refused = 0usize;
    for candidate in collect_candidates(definitions, agent, ctx) {
        if let Some(holder) = ctx
            .claims
            .holder_of(&candidate.task.id, now)
            .filter(|holder| *holder != agent.id)
        {
            if refused == 0 {
                trace!(agent = agent.id.0, task = %candidate.task.id, holder = holder.0, "claim refused");
                ctx.events.record(
                    ctx.stamp,
                    EventType::ClaimRefused,
                    agent,
                    EventOutcome::General(GeneralOutcome {
                        description: format!("{} held by another agent", candidate.task.id),
                        other_id: Some(holder.0),
                    }),
                );
            }
            refused += 1;
            continue;
        }
        chosen = Some(candidate);
        break;
    }

    let Some(candidate) = chosen else {
        ctx.claims.release_all(agent.id);
        return None;
    };
    let definition = definitions.get(candidate.definition)?;

    let lease = ctx.config.claims.lease_hours;
    ctx.claims.claim(&candidate.task.id, agent.id, now, lease);

    if previous.as_ref() != Some(&candidate.task.id) {
        debug!(
            agent = agent.id.0,
            task = %candidate.task.id,
            score = candidate.score,
            "task selected"
        );
        ctx.events.record(
            ctx.stamp,
            EventType::TaskSelected,
            agent,
            EventOutcome::Task(TaskOutcome {
                task_id: candidate.task.id.to_string(),
                task_type: candidate.task.task_type.as_str().to_string(),
                score: candidate.score,
                target_id: candidate.task.target_entity().map(|id| id.0),
            }),
        );
    }

    let result = (definition.executor)(&candidate.task, agent, ctx, bb);
    if result != TaskResult::Running {
        ctx.claims.release(&candidate.task.id, agent.id);
    }

    Some(TaskRun {
        task: candidate.task,
        score: candidate.score,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::AiSandbox;
    use crate::ai::task::{TaskId, TaskMap, TaskType};
    use crate::ai::testing::human;
    use crate::components::{EntityId, Target};
    use tribe_events::GameTime;

    fn two_slots(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
        (0..2)
            .map(|n| {
                let id = TaskId::slot(TaskType::HuntPrey, EntityId(99), n);
                let task = Task::new(id.clone(), TaskType::HuntPrey, agent.id, ctx.now() + 1.0)
                    .targeting(Target::Entity(EntityId(99)));
                (id, task)
            })
            .collect()
    }

    fn flat(_: &Agent, _: &Task, _: &AiContext<'_>) -> Option<f32> {
        Some(0.5)
    }

    fn run(_: &Task, _: &mut Agent, _: &mut AiContext<'_>, _: &mut Blackboard) -> TaskResult {
        TaskResult::Running
    }

    fn stale(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
        let id = TaskId::of(TaskType::Idle, &[&agent.id]);
        let mut map = TaskMap::new();
        map.insert(
            id.clone(),
            Task::new(id, TaskType::Idle, agent.id, GameTime::from_hours(ctx.now().hours() - 1.0)),
        );
        map
    }

    fn never(_: &Agent, _: &Task, _: &AiContext<'_>) -> Option<f32> {
        None
    }

    const SLOTS: &[TaskDefinition] = &[TaskDefinition {
        task_type: TaskType::HuntPrey,
        producer: two_slots,
        scorer: flat,
        executor: run,
    }];

    #[test]
    fn test_ties_break_by_id_and_claims_spread_agents() {
        let mut sandbox = AiSandbox::default();
        let mut bb = Blackboard::default();
        let mut first = human(1, 0.0, 0.0);
        let mut second = human(2, 0.0, 0.0);
        let mut third = human(3, 0.0, 0.0);

        let a = run_task_loop(SLOTS, &mut first, &mut sandbox.context(), &mut bb).unwrap();
        let b = run_task_loop(SLOTS, &mut second, &mut sandbox.context(), &mut bb).unwrap();
        let c = run_task_loop(SLOTS, &mut third, &mut sandbox.context(), &mut bb);

        assert_eq!(a.task.id.as_str(), "hunt_prey-99-slot-0");
        assert_eq!(b.task.id.as_str(), "hunt_prey-99-slot-1");
        assert!(c.is_none());

        // The first agent keeps its own slot on re-evaluation
        let again = run_task_loop(SLOTS, &mut first, &mut sandbox.context(), &mut bb).unwrap();
        assert_eq!(again.task.id, a.task.id);
    }

    #[test]
    fn test_expired_and_inapplicable_tasks_are_dropped() {
        const DEFS: &[TaskDefinition] = &[
            TaskDefinition {
                task_type: TaskType::Idle,
                producer: stale,
                scorer: flat,
                executor: run,
            },
            TaskDefinition {
                task_type: TaskType::HuntPrey,
                producer: two_slots,
                scorer: never,
                executor: run,
            },
        ];
        let mut sandbox = AiSandbox::default();
        sandbox.set_time(GameTime::from_hours(5.0));
        let agent = human(1, 0.0, 0.0);
        assert!(collect_candidates(DEFS, &agent, &sandbox.context()).is_empty());
    }
}
