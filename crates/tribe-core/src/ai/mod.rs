//! AI Decision Engine
//!
//! - `blackboard`: per-agent scratch memory with TTL
//! - `behavior_tree`: composites, leaves and decorators
//! - `task`: task framework and the utility allocation loop
//! - `claims`: ledger arbitrating capacity slots between agents
//! - `tasks`: task definitions and per-kind task sets
//! - `trees`: the assembled tribe member tree
//! - `dispatcher`: throttling and routing by agent kind

pub mod behavior_tree;
pub mod blackboard;
pub mod claims;
pub mod context;
pub mod dispatcher;
pub mod effects;
pub mod steering;
pub mod task;
pub mod tasks;
pub mod trees;

#[cfg(test)]
pub(crate) mod testing;

pub use behavior_tree::{BehaviorTree, NodeOutcome, NodeStatus};
pub use blackboard::{Blackboard, BlackboardKey, BlackboardValue};
pub use claims::ClaimLedger;
pub use context::{AiContext, AiSandbox};
pub use dispatcher::{decide, dispatch, initial_schedule, Decision};
pub use effects::{PendingEffects, WorldEffect};
pub use task::{Task, TaskDefinition, TaskId, TaskResult, TaskType};
pub use trees::BehaviorTrees;
