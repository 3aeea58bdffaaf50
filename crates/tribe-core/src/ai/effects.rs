//! Shared-world mutations requested by AI decisions.
//!
//! Decisions only write their own agent and blackboard. Anything touching
//! another entity is queued here and applied later in the same tick by
//! `systems::effects`. Applying an effect twice, or one that has become
//! stale, is harmless: the applier re-checks every precondition.

use bevy_ecs::prelude::*;

use crate::components::{BuildingKind, EntityId, TribeId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEffect {
    PlaceBuilding {
        tribe: TribeId,
        kind: BuildingKind,
        position: Vec2,
    },
    Procreate {
        parent: EntityId,
        partner: EntityId,
    },
    /// Eat berries straight from a bush
    EatBerries {
        agent: EntityId,
        bush: EntityId,
        amount: f32,
    },
    /// Pick berries to carry to storage
    Harvest {
        agent: EntityId,
        bush: EntityId,
        amount: f32,
    },
    EatCorpse {
        agent: EntityId,
        corpse: EntityId,
        amount: f32,
    },
    EatStored {
        agent: EntityId,
        building: EntityId,
        amount: f32,
    },
    /// Move carried food into storage
    Deposit {
        agent: EntityId,
        building: EntityId,
    },
    Feed {
        parent: EntityId,
        child: EntityId,
        amount: f32,
    },
    /// Eat from soil fertility
    Graze {
        agent: EntityId,
        position: Vec2,
        amount: f32,
    },
}

/// Resource: effects queued this tick
#[derive(Resource, Debug, Default)]
pub struct PendingEffects {
    effects: Vec<WorldEffect>,
}

impl PendingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: WorldEffect) {
        self.effects.push(effect);
    }

    pub fn drain(&mut self) -> Vec<WorldEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldEffect> {
        self.effects.iter()
    }

    /// Buildings requested this tick but not yet placed.
    pub fn planned_buildings(&self) -> impl Iterator<Item = (TribeId, BuildingKind, Vec2)> + '_ {
        self.effects.iter().filter_map(|effect| match *effect {
            WorldEffect::PlaceBuilding { tribe, kind, position } => Some((tribe, kind, position)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
