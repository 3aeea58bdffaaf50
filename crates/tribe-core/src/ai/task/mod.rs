//! Task Framework
//!
//! A task type is a declarative triple of free functions:
//! - a producer emits candidate tasks, keyed by a deterministic id
//! - a scorer returns a utility in `0.0..=1.0`, or `None` when the task
//!   does not apply right now
//! - an executor advances the chosen task by one evaluation
//!
//! Tasks are rebuilt from scratch every evaluation; what an agent is doing
//! survives in its `Intent` and `Blackboard`, not in the task.

mod allocation;
pub mod scoring;

pub use allocation::{collect_candidates, run_task_loop, Candidate, TaskRun};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tribe_events::GameTime;

use crate::components::{Agent, EntityId, Target, Vec2};

use super::behavior_tree::NodeStatus;
use super::blackboard::Blackboard;
use super::context::AiContext;

/// Deterministic task identity built from participant ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `{type}-{part}-{part}...`
    pub fn of(task_type: TaskType, parts: &[&dyn fmt::Display]) -> Self {
        let mut id = task_type.as_str().to_string();
        for part in parts {
            id.push('-');
            id.push_str(&part.to_string());
        }
        Self(id)
    }

    /// One id per capacity slot: `{type}-{target}-slot-{n}`.
    pub fn slot(task_type: TaskType, target: EntityId, slot: usize) -> Self {
        Self(format!("{}-{}-slot-{}", task_type.as_str(), target, slot))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    EatBerries,
    EatStoredFood,
    EatCorpse,
    GatherBerries,
    StoreFood,
    HuntPrey,
    AttackHostile,
    AttackHuman,
    FeedChild,
    ReturnHome,
    Flee,
    Procreate,
    Graze,
    Wander,
    Idle,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::EatBerries => "eat_berries",
            TaskType::EatStoredFood => "eat_stored_food",
            TaskType::EatCorpse => "eat_corpse",
            TaskType::GatherBerries => "gather_berries",
            TaskType::StoreFood => "store_food",
            TaskType::HuntPrey => "hunt_prey",
            TaskType::AttackHostile => "attack_hostile",
            TaskType::AttackHuman => "attack_human",
            TaskType::FeedChild => "feed_child",
            TaskType::ReturnHome => "return_home",
            TaskType::Flee => "flee",
            TaskType::Procreate => "procreate",
            TaskType::Graze => "graze",
            TaskType::Wander => "wander",
            TaskType::Idle => "idle",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub position: Option<Vec2>,
    pub creator: EntityId,
    pub target: Option<Target>,
    pub valid_until: GameTime,
}

impl Task {
    pub fn new(id: TaskId, task_type: TaskType, creator: EntityId, valid_until: GameTime) -> Self {
        Self {
            id,
            task_type,
            position: None,
            creator,
            target: None,
            valid_until,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn targeting(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        self.target.and_then(|t| t.entity())
    }

    pub fn target_position(&self) -> Option<Vec2> {
        self.target.and_then(|t| t.position())
    }

    pub fn is_expired(&self, now: GameTime) -> bool {
        self.valid_until < now
    }
}

/// Outcome of one executor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskResult {
    Success,
    Failure,
    Running,
}

impl TaskResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskResult::Success => "success",
            TaskResult::Failure => "failure",
            TaskResult::Running => "running",
        }
    }
}

impl From<TaskResult> for NodeStatus {
    fn from(result: TaskResult) -> Self {
        match result {
            TaskResult::Success => NodeStatus::Success,
            TaskResult::Failure => NodeStatus::Failure,
            TaskResult::Running => NodeStatus::Running,
        }
    }
}

impl From<NodeStatus> for TaskResult {
    fn from(status: NodeStatus) -> Self {
        match status {
            NodeStatus::Success => TaskResult::Success,
            NodeStatus::Failure => TaskResult::Failure,
            NodeStatus::Running => TaskResult::Running,
        }
    }
}

pub type TaskMap = BTreeMap<TaskId, Task>;
pub type Producer = fn(&Agent, &AiContext<'_>) -> TaskMap;
pub type Scorer = fn(&Agent, &Task, &AiContext<'_>) -> Option<f32>;
pub type Executor = fn(&Task, &mut Agent, &mut AiContext<'_>, &mut Blackboard) -> TaskResult;

/// Producer, scorer and executor of one task type. Holds no state.
#[derive(Clone, Copy)]
pub struct TaskDefinition {
    pub task_type: TaskType,
    pub producer: Producer,
    pub scorer: Scorer,
    pub executor: Executor,
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("task_type", &self.task_type)
            .finish()
    }
}
