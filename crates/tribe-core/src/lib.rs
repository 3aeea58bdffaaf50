//! Tribal Survival AI Engine Library
//!
//! Public API for the simulation: the AI decision engine, the world query
//! surface, ECS components and systems, and world setup.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod ai;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod query;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::AiConfig;
pub use error::{ConfigError, SimError};

use ai::claims::ClaimLedger;
use ai::effects::PendingEffects;
use ai::trees::BehaviorTrees;
use events::{EventLogger, PendingEvents};
use output::{collect_stats, StatsCollector};
use query::WorldSnapshot;
use setup::SpawnOptions;
use systems::{
    advance_clock, appoint_leaders, apply_effects, build_snapshot, decay_corpses, evict_blackboards,
    expire_claims, flush_events, handle_deaths, move_agents, regrow_food, resolve_combat, run_ai, update_needs,
    MaintenanceTracker, TraceSettings,
};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Inserts every resource the schedule needs and spawns the starting
/// population. Returns how many agents were spawned.
pub fn init_world(world: &mut World, config: AiConfig, options: &SpawnOptions, seed: u64) -> usize {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ids = IdAllocator::new();
    let (bounds, mut territory, soil) = setup::create_world_map(&config);

    world.insert_resource(GameClock::new(config.simulation.hours_per_tick));
    setup::spawn_bushes(world, &mut rng, &mut ids, &config);
    setup::spawn_tribes(world, &mut rng, &mut ids, &mut territory, &config, options);
    setup::spawn_animals(world, &mut rng, &mut ids, &config, options);
    let spawned = setup::get_spawn_summary(world).total_agents;

    world.insert_resource(bounds);
    world.insert_resource(territory);
    world.insert_resource(soil);
    world.insert_resource(WorldSnapshot::empty(bounds));
    world.insert_resource(BehaviorTrees::new(&config));
    world.insert_resource(config);
    world.insert_resource(ids);
    world.insert_resource(SimRng(rng));
    world.insert_resource(ClaimLedger::new());
    world.insert_resource(PendingEffects::new());
    world.insert_resource(PendingEvents::new());
    world.insert_resource(MaintenanceTracker::new());
    world.insert_resource(StatsCollector::new());
    world.init_resource::<TraceSettings>();
    if !world.contains_resource::<EventLogger>() {
        world.insert_resource(EventLogger::null());
    }
    spawned
}

/// The per-tick system order.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            advance_clock,
            (update_needs, regrow_food),
            build_snapshot,
            run_ai,
            apply_effects,
            move_agents,
            resolve_combat,
            handle_deaths,
            appoint_leaders,
            decay_corpses,
            (evict_blackboards, expire_claims),
            collect_stats,
            flush_events,
        )
            .chain(),
    );
    schedule
}
