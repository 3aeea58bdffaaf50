//! Maintenance Systems
//!
//! Periodic housekeeping: sweeping expired blackboard entries, lapsing
//! unrenewed claims, and flushing the tick's events to the log.

use bevy_ecs::prelude::*;
use tracing::{trace, warn};
use tribe_events::GameTime;

use crate::ai::blackboard::Blackboard;
use crate::ai::claims::ClaimLedger;
use crate::components::GameClock;
use crate::config::AiConfig;
use crate::events::{EventLogger, PendingEvents};

/// Resource to track when blackboards were last swept
#[derive(Resource, Debug, Default)]
pub struct MaintenanceTracker {
    pub last_eviction: GameTime,
    pub evicted_total: usize,
}

impl MaintenanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a sweep is due
    pub fn should_evict(&self, now: GameTime, interval_hours: f64) -> bool {
        now.has_elapsed(self.last_eviction, interval_hours)
    }
}

pub fn evict_blackboards(
    mut blackboards: Query<&mut Blackboard>,
    mut tracker: ResMut<MaintenanceTracker>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
) {
    let now = clock.now();
    if !tracker.should_evict(now, config.blackboard.eviction_interval_hours) {
        return;
    }
    let evicted: usize = blackboards.iter_mut().map(|mut bb| bb.evict_expired(now)).sum();
    tracker.last_eviction = now;
    tracker.evicted_total += evicted;
    trace!(evicted, "blackboards swept");
}

pub fn expire_claims(mut claims: ResMut<ClaimLedger>, clock: Res<GameClock>) {
    let lapsed = claims.expire(clock.now());
    if lapsed > 0 {
        trace!(lapsed, "claims lapsed");
    }
}

/// Moves the tick's events into the logger.
pub fn flush_events(mut pending: ResMut<PendingEvents>, mut logger: ResMut<EventLogger>) {
    if pending.is_empty() {
        return;
    }
    if let Err(e) = logger.log_batch(&pending.drain()) {
        warn!("failed to write events: {}", e);
    }
}
