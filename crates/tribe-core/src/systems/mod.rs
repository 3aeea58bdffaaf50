//! ECS Systems
//!
//! One tick runs, in order: clock, needs, snapshot, AI, effects, movement,
//! combat, deaths, leadership, corpse decay, maintenance, event flush.

pub mod ai;
pub mod combat;
pub mod effects;
pub mod lifecycle;
pub mod maintenance;
pub mod movement;
pub mod needs;
pub mod snapshot;

pub use ai::{run_ai, TraceSettings};
pub use combat::resolve_combat;
pub use effects::apply_effects;
pub use lifecycle::{appoint_leaders, decay_corpses, handle_deaths};
pub use maintenance::{evict_blackboards, expire_claims, flush_events, MaintenanceTracker};
pub use movement::move_agents;
pub use needs::{regrow_food, update_needs};
pub use snapshot::{advance_clock, build_snapshot};
