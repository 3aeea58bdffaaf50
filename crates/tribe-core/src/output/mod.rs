//! Output Module
//!
//! Population and event statistics.

pub mod stats;

pub use stats::*;
