//! Event Types
//!
//! Records emitted by the AI core and the surrounding simulation systems.
//! They are pure observability: nothing in the simulation reads them back.

use serde::{Deserialize, Serialize};

use crate::timestamp::TickStamp;

/// Primary event type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An agent committed to a new active action
    Decision,
    /// The task loop picked a task
    TaskSelected,
    /// A capacity slot was already held by another agent
    ClaimRefused,
    /// A pioneer planted a border marker
    BorderPlanted,
    /// A leader placed a building
    Building,
    Combat,
    Birth,
    Death,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Decision,
            EventType::TaskSelected,
            EventType::ClaimRefused,
            EventType::BorderPlanted,
            EventType::Building,
            EventType::Combat,
            EventType::Birth,
            EventType::Death,
        ]
    }
}

/// Which layer of the AI produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    BehaviorTree,
    TaskLoop,
}

/// Snapshot of the agent an event is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub agent_id: u64,
    /// "tribe_member", "predator" or "prey"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tribe_id: Option<u64>,
    pub position: [f32; 2],
}

impl ActorSnapshot {
    pub fn new(agent_id: u64, kind: impl Into<String>, position: [f32; 2]) -> Self {
        Self {
            agent_id,
            kind: kind.into(),
            tribe_id: None,
            position,
        }
    }

    pub fn with_tribe(mut self, tribe_id: u64) -> Self {
        self.tribe_id = Some(tribe_id);
        self
    }
}

/// Event-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventOutcome {
    Decision(DecisionOutcome),
    Task(TaskOutcome),
    Placement(PlacementOutcome),
    General(GeneralOutcome),
}

/// Outcome of one AI evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub source: DecisionSource,
    /// The active action after evaluation, e.g. "attacking"
    pub action: String,
    /// Final status of the root node or executor
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outcome of task selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub task_type: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u64>,
}

/// Outcome of a placement on the map (border markers, buildings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub what: String,
    pub position: [f32; 2],
}

/// Free-form outcome for events without a dedicated payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralOutcome {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_id: Option<u64>,
}

/// One event record, serialized as a JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiEvent {
    pub event_id: String,
    pub timestamp: TickStamp,
    pub event_type: EventType,
    pub actor: ActorSnapshot,
    pub outcome: EventOutcome,
}

impl AiEvent {
    pub fn new(
        event_id: impl Into<String>,
        timestamp: TickStamp,
        event_type: EventType,
        actor: ActorSnapshot,
        outcome: EventOutcome,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            event_type,
            actor,
            outcome,
        }
    }

    /// Serializes the event as a single JSON line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one JSONL line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Checks if this event is about the given agent.
    pub fn involves_agent(&self, agent_id: u64) -> bool {
        if self.actor.agent_id == agent_id {
            return true;
        }
        match &self.outcome {
            EventOutcome::Task(task) => task.target_id == Some(agent_id),
            EventOutcome::General(general) => general.other_id == Some(agent_id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::GameTime;

    fn decision_event() -> AiEvent {
        AiEvent::new(
            "evt_00000001",
            TickStamp::new(4, GameTime::from_hours(1.0)),
            EventType::Decision,
            ActorSnapshot::new(7, "tribe_member", [10.0, 20.0]).with_tribe(1),
            EventOutcome::Decision(DecisionOutcome {
                source: DecisionSource::BehaviorTree,
                action: "patrolling".into(),
                status: "running".into(),
                reason: Some("walking to border point".into()),
            }),
        )
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&EventType::TaskSelected).unwrap();
        assert_eq!(json, "\"task_selected\"");
        assert_eq!(EventType::all().len(), 8);
    }

    #[test]
    fn test_decision_event_json_shape() {
        let json = serde_json::to_value(decision_event()).unwrap();
        assert_eq!(json["event_type"], "decision");
        assert_eq!(json["actor"]["tribe_id"], 1);
        assert_eq!(json["outcome"]["source"], "behavior_tree");
        assert_eq!(json["timestamp"]["time"], 1.0);
    }

    #[test]
    fn test_task_outcome_deserializes_untagged() {
        let json = r#"{"task_id":"hunt-3-9-slot-0","task_type":"hunt_prey","score":0.5,"target_id":9}"#;
        let outcome: EventOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(outcome, EventOutcome::Task(ref t) if t.target_id == Some(9)));
    }

    #[test]
    fn test_involves_agent() {
        let event = decision_event();
        assert!(event.involves_agent(7));
        assert!(!event.involves_agent(8));

        let mut task_event = event.clone();
        task_event.outcome = EventOutcome::Task(TaskOutcome {
            task_id: "attack-7-8-slot-1".into(),
            task_type: "attack_hostile".into(),
            score: 0.7,
            target_id: Some(8),
        });
        assert!(task_event.involves_agent(8));
    }
}
