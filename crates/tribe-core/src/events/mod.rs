//! Event recording: per-tick queue and JSONL logger.

pub mod logger;

pub use logger::{actor_of, EventLogger, PendingEvents};
