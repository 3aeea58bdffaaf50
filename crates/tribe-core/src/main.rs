//! Tribal Survival Simulation
//!
//! Headless runner: tribes, predators and prey choosing one action per tick,
//! with decisions and births logged as JSONL.

use bevy_ecs::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tribe_core::components::{EntityId, GameClock};
use tribe_core::config::{AiConfig, DEFAULT_TUNING_PATH};
use tribe_core::error::Result;
use tribe_core::events::EventLogger;
use tribe_core::output::{write_stats, StatsCollector};
use tribe_core::setup::SpawnOptions;
use tribe_core::systems::TraceSettings;
use tribe_core::{build_schedule, init_world};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "tribe_sim")]
#[command(about = "A tribal survival simulation driven by behavior trees and utility tasks")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate (defaults to the configured run length)
    #[arg(long)]
    ticks: Option<u64>,

    /// Tuning file
    #[arg(long, default_value = DEFAULT_TUNING_PATH)]
    config: PathBuf,

    /// Write AI events as JSONL to this file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write final statistics as JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    tribes: usize,

    #[arg(long, default_value_t = 8)]
    members_per_tribe: usize,

    #[arg(long, default_value_t = 40)]
    prey: usize,

    #[arg(long, default_value_t = 6)]
    predators: usize,

    /// Print the behavior tree trace of this agent whenever it is evaluated
    #[arg(long)]
    trace_agent: Option<u64>,

    /// Interval between population reports (in ticks)
    #[arg(long, default_value_t = 100)]
    report_interval: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!("simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = if args.config.exists() {
        AiConfig::load(&args.config)?
    } else {
        warn!("{} not found; using default tuning", args.config.display());
        AiConfig::default()
    };
    let ticks = args.ticks.unwrap_or(config.simulation.default_ticks);
    info!(seed = args.seed, ticks, hours_per_tick = config.simulation.hours_per_tick, "tribe_sim starting");

    let mut world = World::new();
    if let Some(path) = &args.events {
        world.insert_resource(EventLogger::new(path)?);
        info!("logging events to {}", path.display());
    }

    let options = SpawnOptions {
        tribes: args.tribes,
        members_per_tribe: args.members_per_tribe,
        prey: args.prey,
        predators: args.predators,
    };
    let spawned = init_world(&mut world, config, &options, args.seed);
    info!(agents = spawned, tribes = options.tribes, "world created");
    if let Some(agent) = args.trace_agent {
        world.insert_resource(TraceSettings::for_agent(EntityId(agent)));
    }

    let mut schedule = build_schedule();
    for _ in 0..ticks {
        schedule.run(&mut world);

        if let Some(trace) = world.resource_mut::<TraceSettings>().take() {
            println!("tick {} agent {}\n{}", trace.tick, trace.agent_id, trace.render());
        }

        let tick = world.resource::<GameClock>().tick();
        if args.report_interval > 0 && tick % args.report_interval == 0 {
            let latest = &world.resource::<StatsCollector>().latest;
            info!(
                tick,
                humans = latest.humans,
                predators = latest.predators,
                prey = latest.prey,
                corpses = latest.corpses,
                "population"
            );
            for (tribe, stats) in &latest.tribes {
                info!(
                    tribe,
                    members = stats.members,
                    cells = stats.territory_cells,
                    storages = stats.storages,
                    zones = stats.planting_zones,
                    "tribe"
                );
            }
        }
    }

    world.resource_mut::<EventLogger>().flush()?;
    let stats = world.resource::<StatsCollector>().generate_stats(ticks);
    info!(
        events = stats.total_events,
        peak_humans = stats.peak_humans,
        "simulation complete after {} ticks",
        ticks
    );
    if let Some(path) = &args.stats {
        write_stats(&stats, path)?;
        info!("wrote statistics to {}", path.display());
    }
    Ok(())
}
