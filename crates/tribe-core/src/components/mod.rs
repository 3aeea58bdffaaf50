//! ECS Components
//!
//! Agents, world geometry, the game clock, and food/building entities.

pub mod agent;
pub mod world;

pub use agent::*;
pub use world::*;
