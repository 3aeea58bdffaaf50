//! Claim ledger for task ids.
//!
//! Capacity-slotted producers emit one id per slot; the ledger makes sure no
//! two agents bind to the same id. Agents are evaluated in ascending id
//! order and the first to claim wins. An agent holds at most one claim.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use tribe_events::GameTime;

use crate::components::EntityId;

use super::task::TaskId;

#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub holder: EntityId,
    pub expires_at: GameTime,
}

/// Resource: who is working on which task id
#[derive(Resource, Debug, Clone, Default)]
pub struct ClaimLedger {
    by_task: BTreeMap<TaskId, Claim>,
    by_holder: BTreeMap<EntityId, TaskId>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live holder of `task`, ignoring lapsed leases.
    pub fn holder_of(&self, task: &TaskId, now: GameTime) -> Option<EntityId> {
        self.by_task
            .get(task)
            .filter(|claim| claim.expires_at >= now)
            .map(|claim| claim.holder)
    }

    /// True if someone other than `agent` holds a live claim on `task`.
    pub fn is_held_by_other(&self, task: &TaskId, agent: EntityId, now: GameTime) -> bool {
        matches!(self.holder_of(task, now), Some(holder) if holder != agent)
    }

    /// The task `agent` currently holds, if its lease is live.
    pub fn held_by(&self, agent: EntityId, now: GameTime) -> Option<&TaskId> {
        self.by_holder
            .get(&agent)
            .filter(|task| self.holder_of(task, now) == Some(agent))
    }

    /// Claims or renews `task` for `agent` until `now + lease_hours`.
    /// Any other claim the agent held is released. Returns false, changing
    /// nothing, if another agent holds a live claim.
    pub fn claim(&mut self, task: &TaskId, agent: EntityId, now: GameTime, lease_hours: f64) -> bool {
        if self.is_held_by_other(task, agent, now) {
            return false;
        }
        if let Some(previous) = self.by_holder.get(&agent).cloned() {
            if &previous != task {
                self.release(&previous, agent);
            }
        }
        // A lapsed claim by someone else is simply overwritten.
        if let Some(stale) = self.by_task.get(task).map(|c| c.holder) {
            if stale != agent {
                self.by_holder.remove(&stale);
            }
        }
        self.by_task.insert(
            task.clone(),
            Claim {
                holder: agent,
                expires_at: now + lease_hours,
            },
        );
        self.by_holder.insert(agent, task.clone());
        true
    }

    /// Releases `task` if `agent` holds it.
    pub fn release(&mut self, task: &TaskId, agent: EntityId) {
        if self.by_task.get(task).map(|c| c.holder) == Some(agent) {
            self.by_task.remove(task);
        }
        if self.by_holder.get(&agent) == Some(task) {
            self.by_holder.remove(&agent);
        }
    }

    /// Releases whatever `agent` holds.
    pub fn release_all(&mut self, agent: EntityId) {
        if let Some(task) = self.by_holder.remove(&agent) {
            if self.by_task.get(&task).map(|c| c.holder) == Some(agent) {
                self.by_task.remove(&task);
            }
        }
    }

    /// Drops lapsed claims. Returns how many were dropped.
    pub fn expire(&mut self, now: GameTime) -> usize {
        let lapsed: Vec<(TaskId, EntityId)> = self
            .by_task
            .iter()
            .filter(|(_, claim)| claim.expires_at < now)
            .map(|(task, claim)| (task.clone(), claim.holder))
            .collect();
        for (task, holder) in &lapsed {
            self.release(task, *holder);
        }
        lapsed.len()
    }

    pub fn len(&self) -> usize {
        self.by_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hours: f64) -> GameTime {
        GameTime::from_hours(hours)
    }

    fn slot(n: usize) -> TaskId {
        TaskId::new(format!("hunt_prey-9-slot-{}", n))
    }

    #[test]
    fn test_first_committer_wins() {
        let mut ledger = ClaimLedger::new();
        assert!(ledger.claim(&slot(0), EntityId(1), at(0.0), 2.0));
        assert!(!ledger.claim(&slot(0), EntityId(2), at(0.0), 2.0));
        assert_eq!(ledger.holder_of(&slot(0), at(0.0)), Some(EntityId(1)));
        assert!(ledger.claim(&slot(1), EntityId(2), at(0.0), 2.0));
    }

    #[test]
    fn test_renew_and_switch() {
        let mut ledger = ClaimLedger::new();
        ledger.claim(&slot(0), EntityId(1), at(0.0), 2.0);
        assert!(ledger.claim(&slot(0), EntityId(1), at(1.5), 2.0));
        assert_eq!(ledger.holder_of(&slot(0), at(3.0)), Some(EntityId(1)));

        // Switching releases the old slot
        assert!(ledger.claim(&slot(1), EntityId(1), at(2.0), 2.0));
        assert_eq!(ledger.holder_of(&slot(0), at(2.0)), None);
        assert_eq!(ledger.held_by(EntityId(1), at(2.0)), Some(&slot(1)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_lapsed_lease_frees_slot() {
        let mut ledger = ClaimLedger::new();
        ledger.claim(&slot(0), EntityId(1), at(0.0), 2.0);
        assert!(ledger.claim(&slot(0), EntityId(2), at(2.5), 2.0));
        assert_eq!(ledger.held_by(EntityId(1), at(2.5)), None);
        assert_eq!(ledger.held_by(EntityId(2), at(2.5)), Some(&slot(0)));
    }

    #[test]
    fn test_expire_and_release() {
        let mut ledger = ClaimLedger::new();
        ledger.claim(&slot(0), EntityId(1), at(0.0), 2.0);
        ledger.claim(&slot(1), EntityId(2), at(1.0), 2.0);
        assert_eq!(ledger.expire(at(2.5)), 1);
        assert_eq!(ledger.len(), 1);

        ledger.release_all(EntityId(2));
        assert!(ledger.is_empty());
    }
}
