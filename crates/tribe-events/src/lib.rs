//! Shared event types and serialization for the tribal survival simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency of the AI core and of any external trace viewer.

pub mod event;
pub mod timestamp;
pub mod trace;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export time types
pub use timestamp::{GameTime, ParseTimeError, TickStamp, DAYS_PER_YEAR, HOURS_PER_DAY};

// Re-export event types
pub use event::*;

// Re-export trace types
pub use trace::{TraceEntry, TraceStatus, TreeTrace};
