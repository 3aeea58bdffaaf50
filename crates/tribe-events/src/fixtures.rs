//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers from other
//! crates.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // tribe-events = { path = "../tribe-events", features = ["test-fixtures"] }
//!
//! use tribe_events::fixtures;
//!
//! let events = fixtures::sample_events();
//! ```

use crate::{
    ActorSnapshot, AiEvent, DecisionOutcome, DecisionSource, EventOutcome, EventType,
    GameTime, GeneralOutcome, PlacementOutcome, TaskOutcome, TickStamp, TraceEntry,
    TraceStatus, TreeTrace,
};

/// Returns a short, ordered event stream:
/// - a warrior starting a patrol
/// - a predator selecting a hunt slot
/// - a refused fourth hunt claim
/// - a pioneer planting a border marker
/// - a birth
pub fn sample_events() -> Vec<AiEvent> {
    let at = |tick: u64| TickStamp::new(tick, GameTime::from_hours(tick as f64 * 0.25));

    vec![
        AiEvent::new(
            "evt_00000001",
            at(1),
            EventType::Decision,
            ActorSnapshot::new(1, "tribe_member", [100.0, 100.0]).with_tribe(1),
            EventOutcome::Decision(DecisionOutcome {
                source: DecisionSource::BehaviorTree,
                action: "patrolling".into(),
                status: "running".into(),
                reason: Some("walking to border point".into()),
            }),
        ),
        AiEvent::new(
            "evt_00000002",
            at(1),
            EventType::TaskSelected,
            ActorSnapshot::new(20, "predator", [300.0, 40.0]),
            EventOutcome::Task(TaskOutcome {
                task_id: "hunt_prey-31-slot-0".into(),
                task_type: "hunt_prey".into(),
                score: 0.62,
                target_id: Some(31),
            }),
        ),
        AiEvent::new(
            "evt_00000003",
            at(1),
            EventType::ClaimRefused,
            ActorSnapshot::new(23, "predator", [310.0, 44.0]),
            EventOutcome::General(GeneralOutcome {
                description: "hunt_prey-31-slot-0 held by another agent".into(),
                other_id: Some(20),
            }),
        ),
        AiEvent::new(
            "evt_00000004",
            at(2),
            EventType::BorderPlanted,
            ActorSnapshot::new(3, "tribe_member", [140.0, 100.0]).with_tribe(1),
            EventOutcome::Placement(PlacementOutcome {
                what: "border_marker".into(),
                position: [140.0, 116.0],
            }),
        ),
        AiEvent::new(
            "evt_00000005",
            at(3),
            EventType::Birth,
            ActorSnapshot::new(4, "tribe_member", [102.0, 98.0]).with_tribe(1),
            EventOutcome::General(GeneralOutcome {
                description: "child born".into(),
                other_id: Some(42),
            }),
        ),
    ]
}

/// Returns a small tree trace in evaluation (post-) order.
pub fn sample_trace() -> TreeTrace {
    let mut trace = TreeTrace::new(1, 1);
    let entries = [
        (2, "HasLowHealth", TraceStatus::Failure),
        (1, "Flee", TraceStatus::Failure),
        (3, "IntruderInTerritory", TraceStatus::Failure),
        (2, "AttackIntruders", TraceStatus::Failure),
        (3, "HostileNearby", TraceStatus::Failure),
        (2, "AttackHostiles", TraceStatus::Failure),
        (3, "WalkToBorderPoint", TraceStatus::Running),
        (2, "Patrol", TraceStatus::Running),
        (1, "WarriorPatrol", TraceStatus::Running),
        (0, "Human", TraceStatus::Running),
    ];
    trace.entries = entries
        .into_iter()
        .map(|(depth, name, status)| TraceEntry {
            depth,
            name: name.to_string(),
            status,
            reason: None,
        })
        .collect();
    trace
}
