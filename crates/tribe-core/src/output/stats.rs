//! Statistics Output
//!
//! Collects population and event statistics for analysis.

use bevy_ecs::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::components::GameClock;
use crate::events::PendingEvents;
use crate::query::{TerritoryGrid, WorldSnapshot};

/// Population at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStats {
    pub tick: u64,
    pub humans: usize,
    pub predators: usize,
    pub prey: usize,
    pub corpses: usize,
    pub tribes: BTreeMap<u64, TribeStats>,
}

/// Statistics for a tribe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TribeStats {
    pub members: usize,
    pub adults: usize,
    pub territory_cells: usize,
    pub storages: usize,
    pub planting_zones: usize,
    pub stored_food: f32,
}

impl PopulationStats {
    pub fn capture(tick: u64, snapshot: &WorldSnapshot, territory: &TerritoryGrid) -> Self {
        let tribes = snapshot
            .tribes
            .values()
            .map(|tribe| {
                (
                    tribe.id.0,
                    TribeStats {
                        members: tribe.member_count(),
                        adults: tribe.adults,
                        territory_cells: territory.cell_count(tribe.id),
                        storages: tribe.storages,
                        planting_zones: tribe.planting_zones,
                        stored_food: tribe.stored_food,
                    },
                )
            })
            .collect();
        Self {
            tick,
            humans: snapshot.humans.count(),
            predators: snapshot.predators.count(),
            prey: snapshot.prey.count(),
            corpses: snapshot.corpses.count(),
            tribes,
        }
    }
}

/// Overall simulation statistics
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub average_events_per_tick: f64,
    pub peak_humans: usize,
    pub final_population: PopulationStats,
}

/// Resource to accumulate statistics during simulation
#[derive(Resource, Debug, Default)]
pub struct StatsCollector {
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub peak_humans: usize,
    pub latest: PopulationStats,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the events of one tick
    pub fn record_events<'a>(&mut self, events: impl Iterator<Item = &'a tribe_events::AiEvent>) {
        for event in events {
            self.total_events += 1;
            let type_name = format!("{:?}", event.event_type);
            *self.events_by_type.entry(type_name).or_insert(0) += 1;
        }
    }

    pub fn record_population(&mut self, population: PopulationStats) {
        self.peak_humans = self.peak_humans.max(population.humans);
        self.latest = population;
    }

    /// Generate final statistics
    pub fn generate_stats(&self, total_ticks: u64) -> SimulationStats {
        let average_events_per_tick = if total_ticks > 0 {
            self.total_events as f64 / total_ticks as f64
        } else {
            0.0
        };
        SimulationStats {
            total_ticks,
            total_events: self.total_events,
            events_by_type: self.events_by_type.clone(),
            average_events_per_tick,
            peak_humans: self.peak_humans,
            final_population: self.latest.clone(),
        }
    }
}

/// Tallies this tick's events and population; runs before the flush.
pub fn collect_stats(
    mut stats: ResMut<StatsCollector>,
    events: Res<PendingEvents>,
    snapshot: Res<WorldSnapshot>,
    territory: Res<TerritoryGrid>,
    clock: Res<GameClock>,
) {
    stats.record_events(events.iter());
    stats.record_population(PopulationStats::capture(clock.tick(), &snapshot, &territory));
}

/// Write statistics as pretty JSON
pub fn write_stats(stats: &SimulationStats, path: impl AsRef<Path>) -> crate::error::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribe_events::fixtures::sample_events;

    #[test]
    fn test_stats_collector_new() {
        let collector = StatsCollector::new();
        assert_eq!(collector.total_events, 0);
        assert!(collector.events_by_type.is_empty());
    }

    #[test]
    fn test_peak_humans_tracked() {
        let mut collector = StatsCollector::new();
        collector.record_population(PopulationStats {
            humans: 10,
            ..Default::default()
        });
        collector.record_population(PopulationStats {
            humans: 4,
            ..Default::default()
        });
        assert_eq!(collector.peak_humans, 10);
        assert_eq!(collector.latest.humans, 4);
    }

    #[test]
    fn test_events_counted_by_type() {
        let events = sample_events();
        let mut collector = StatsCollector::new();
        collector.record_events(events.iter());
        assert_eq!(collector.total_events, events.len());
        let stats = collector.generate_stats(2);
        assert_eq!(stats.average_events_per_tick, events.len() as f64 / 2.0);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("stats.json");
        write_stats(&StatsCollector::new().generate_stats(0), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"total_ticks\": 0"));
    }
}
