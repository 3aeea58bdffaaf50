//! World Setup
//!
//! World resources, berry bushes, tribes and animals.

pub mod agents;
pub mod world;

pub use agents::*;
pub use world::*;
