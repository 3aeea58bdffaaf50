//! Per-agent scratch memory with time-based eviction.
//!
//! The key set is closed: every behavior that remembers something across
//! evaluations has its own variant. Per-node memory of shared trees
//! (cooldown stamps, cached verdicts, timeout starts) is keyed by node name.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use tribe_events::GameTime;

use crate::components::{ActiveAction, BuildingKind, EntityId, Target, Vec2};
use crate::query::GridDir;

use super::behavior_tree::NodeStatus;

/// Closed set of blackboard keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlackboardKey {
    /// Border point a warrior is walking to
    PatrolPoint,
    /// When the current patrol point was chosen
    PatrolPickedAt,
    /// Hostile a warrior decided to attack
    AttackTarget,
    /// Pioneer wall-following heading
    PioneerFacing,
    /// Cell center a pioneer is stepping onto
    PioneerStep,
    PartnerCandidate,
    FleeFrom,
    WanderPoint,
    /// Building kind a leader decided the tribe needs
    PlannedBuilding,
    CooldownStamp(&'static str),
    CacheVerdict(&'static str),
    TimeoutStart(&'static str),
    /// Action and target a timeout is watching
    TimeoutAction(&'static str),
    /// Last evaluation that reached a timeout node
    TimeoutSeen(&'static str),
    /// When the agent's tree last finished an evaluation
    LastEvaluation,
}

/// Closed set of blackboard values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlackboardValue {
    Entity(EntityId),
    Position(Vec2),
    Direction(GridDir),
    Time(GameTime),
    Status(NodeStatus),
    Flag(bool),
    Building(BuildingKind),
    Count(u32),
    Action(ActiveAction, Option<Target>),
}

impl BlackboardValue {
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            BlackboardValue::Entity(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<Vec2> {
        match self {
            BlackboardValue::Position(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_direction(&self) -> Option<GridDir> {
        match self {
            BlackboardValue::Direction(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<GameTime> {
        match self {
            BlackboardValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<NodeStatus> {
        match self {
            BlackboardValue::Status(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            BlackboardValue::Flag(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_building(&self) -> Option<BuildingKind> {
        match self {
            BlackboardValue::Building(k) => Some(*k),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            BlackboardValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<(ActiveAction, Option<Target>)> {
        match self {
            BlackboardValue::Action(action, target) => Some((*action, *target)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    value: BlackboardValue,
    written_at: GameTime,
}

/// Component: one agent's blackboard
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Blackboard {
    ttl_hours: f64,
    entries: BTreeMap<BlackboardKey, Entry>,
}

impl Blackboard {
    pub fn new(ttl_hours: f64) -> Self {
        Self {
            ttl_hours,
            entries: BTreeMap::new(),
        }
    }

    pub fn ttl_hours(&self) -> f64 {
        self.ttl_hours
    }

    fn is_expired(&self, entry: &Entry, now: GameTime) -> bool {
        now.hours_since(entry.written_at) > self.ttl_hours
    }

    /// Value for `key`, or `None` if absent or older than the TTL.
    pub fn get(&self, key: BlackboardKey, now: GameTime) -> Option<BlackboardValue> {
        self.entries
            .get(&key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.value)
    }

    /// Hours since `key` was written, if it is still live.
    pub fn age(&self, key: BlackboardKey, now: GameTime) -> Option<f64> {
        self.entries
            .get(&key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| now.hours_since(entry.written_at))
    }

    /// Overwrites `key` and stamps it with `now`.
    pub fn set(&mut self, key: BlackboardKey, value: BlackboardValue, now: GameTime) {
        self.entries.insert(key, Entry { value, written_at: now });
    }

    pub fn delete(&mut self, key: BlackboardKey) -> Option<BlackboardValue> {
        self.entries.remove(&key).map(|entry| entry.value)
    }

    pub fn entity(&self, key: BlackboardKey, now: GameTime) -> Option<EntityId> {
        self.get(key, now).and_then(|v| v.as_entity())
    }

    pub fn position(&self, key: BlackboardKey, now: GameTime) -> Option<Vec2> {
        self.get(key, now).and_then(|v| v.as_position())
    }

    pub fn direction(&self, key: BlackboardKey, now: GameTime) -> Option<GridDir> {
        self.get(key, now).and_then(|v| v.as_direction())
    }

    pub fn time(&self, key: BlackboardKey, now: GameTime) -> Option<GameTime> {
        self.get(key, now).and_then(|v| v.as_time())
    }

    pub fn status(&self, key: BlackboardKey, now: GameTime) -> Option<NodeStatus> {
        self.get(key, now).and_then(|v| v.as_status())
    }

    /// Drops every entry older than the TTL. Returns how many were dropped.
    pub fn evict_expired(&mut self, now: GameTime) -> usize {
        let ttl = self.ttl_hours;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.hours_since(entry.written_at) <= ttl);
        before - self.entries.len()
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new(24.0)
    }
}
