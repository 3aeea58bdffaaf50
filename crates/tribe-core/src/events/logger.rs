//! Event Logger
//!
//! Append-only JSONL logging of `AiEvent` records.

use bevy_ecs::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tribe_events::{ActorSnapshot, AiEvent, EventOutcome, EventType, TickStamp};

use crate::components::Agent;

/// Resource for logging events to a JSONL file
#[derive(Resource)]
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a logger that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    /// Get the current event count
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Log an event to the file
    pub fn log(&mut self, event: &AiEvent) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Log multiple events
    pub fn log_batch(&mut self, events: &[AiEvent]) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush event logger: {}", e);
        }
    }
}

/// Events recorded during the current tick, drained into the logger at the
/// end of it. Owns the event id sequence.
#[derive(Resource, Debug)]
pub struct PendingEvents {
    events: Vec<AiEvent>,
    next_event_id: u64,
}

impl Default for PendingEvents {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_event_id: 1,
        }
    }
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next event ID
    pub fn next_id(&mut self) -> String {
        let id = format!("evt_{:08}", self.next_event_id);
        self.next_event_id += 1;
        id
    }

    pub fn push(&mut self, event: AiEvent) {
        self.events.push(event);
    }

    /// Records an event about `agent`.
    pub fn record(&mut self, stamp: TickStamp, event_type: EventType, agent: &Agent, outcome: EventOutcome) {
        let id = self.next_id();
        self.events.push(AiEvent::new(id, stamp, event_type, actor_of(agent), outcome));
    }

    pub fn drain(&mut self) -> Vec<AiEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AiEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Snapshot of an agent for an event record.
pub fn actor_of(agent: &Agent) -> ActorSnapshot {
    let actor = ActorSnapshot::new(agent.id.0, agent.kind.as_str(), agent.position.to_array());
    match agent.tribe() {
        Some(tribe) => actor.with_tribe(tribe.0),
        None => actor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentKind, EntityId, Gender, Role, TribeId, Vec2};
    use std::io::BufRead;
    use tribe_events::{GameTime, GeneralOutcome};

    fn agent() -> Agent {
        Agent::new(
            EntityId(3),
            AgentKind::TribeMember { tribe: TribeId(1), role: Role::Hunter },
            Vec2::new(10.0, 20.0),
            Gender::Male,
        )
    }

    fn birth(pending: &mut PendingEvents) {
        pending.record(
            TickStamp::new(1, GameTime::from_hours(0.25)),
            EventType::Birth,
            &agent(),
            EventOutcome::General(GeneralOutcome {
                description: "child born".into(),
                other_id: Some(9),
            }),
        );
    }

    #[test]
    fn test_event_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut logger = EventLogger::new(&path).unwrap();

        let mut pending = PendingEvents::new();
        birth(&mut pending);
        logger.log_batch(&pending.drain()).unwrap();
        logger.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 1);

        let parsed = AiEvent::from_jsonl(&lines[0]).unwrap();
        assert_eq!(parsed.event_id, "evt_00000001");
        assert_eq!(parsed.actor.agent_id, 3);
        assert_eq!(parsed.actor.tribe_id, Some(1));
    }

    #[test]
    fn test_null_logger() {
        let mut logger = EventLogger::null();
        let mut pending = PendingEvents::new();
        birth(&mut pending);
        logger.log_batch(&pending.drain()).unwrap();
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_event_id_generation() {
        let mut pending = PendingEvents::new();
        assert_eq!(pending.next_id(), "evt_00000001");
        assert_eq!(pending.next_id(), "evt_00000002");
        birth(&mut pending);
        assert_eq!(pending.iter().next().map(|e| e.event_id.as_str()), Some("evt_00000003"));
    }

    #[test]
    fn test_pending_events_drain() {
        let mut pending = PendingEvents::new();
        assert!(pending.is_empty());
        birth(&mut pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.drain().len(), 1);
        assert!(pending.is_empty());
    }
}
