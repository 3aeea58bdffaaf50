//! World Query Surface
//!
//! The read-only view of the world every AI decision in a tick shares:
//! per-category entity indices, per-tribe summaries, plus the territory grid
//! and soil map the AI consults.

pub mod index;
pub mod soil;
pub mod territory;

pub use index::{EntityIndex, Indexed, Property};
pub use soil::SoilMap;
pub use territory::{Cell, GridDir, TerritoryGrid};

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use tribe_events::GameTime;

use crate::components::{
    Agent, AgentKind, BerryBush, Building, BuildingKind, Corpse, EntityId, Role, TribeId, Vec2,
    WorldBounds,
};

/// Aggregates the AI needs about one tribe.
#[derive(Debug, Clone, PartialEq)]
pub struct TribeSummary {
    pub id: TribeId,
    pub leader: Option<EntityId>,
    /// Wrapped mean of member positions
    pub center: Vec2,
    /// Member ids, ascending
    pub members: Vec<EntityId>,
    pub adults: usize,
    pub storages: usize,
    pub stored_food: f32,
    pub storage_capacity: f32,
    pub planting_zones: usize,
}

impl TribeSummary {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Fraction of storage capacity in use; 1.0 when there is no storage.
    pub fn storage_fill(&self) -> f32 {
        if self.storage_capacity <= 0.0 {
            1.0
        } else {
            (self.stored_food / self.storage_capacity).clamp(0.0, 1.0)
        }
    }
}

/// Resource: the tick's consistent snapshot of world state.
#[derive(Resource, Debug)]
pub struct WorldSnapshot {
    pub bounds: WorldBounds,
    pub now: GameTime,
    pub humans: EntityIndex<Agent>,
    pub predators: EntityIndex<Agent>,
    pub prey: EntityIndex<Agent>,
    pub bushes: EntityIndex<BerryBush>,
    pub corpses: EntityIndex<Corpse>,
    pub buildings: EntityIndex<Building>,
    pub tribes: BTreeMap<TribeId, TribeSummary>,
    handles: BTreeMap<EntityId, Entity>,
}

impl WorldSnapshot {
    pub fn empty(bounds: WorldBounds) -> Self {
        Self::build(bounds, GameTime::ZERO, Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn build(
        bounds: WorldBounds,
        now: GameTime,
        agents: Vec<Agent>,
        bushes: Vec<BerryBush>,
        corpses: Vec<Corpse>,
        buildings: Vec<Building>,
    ) -> Self {
        let mut humans = Vec::new();
        let mut predators = Vec::new();
        let mut prey = Vec::new();
        for agent in agents {
            match agent.kind {
                AgentKind::TribeMember { .. } => humans.push(agent),
                AgentKind::Predator => predators.push(agent),
                AgentKind::Prey => prey.push(agent),
            }
        }

        let humans = EntityIndex::new(bounds, humans);
        let buildings = EntityIndex::new(bounds, buildings);
        let tribes = summarize_tribes(&bounds, &humans, &buildings);

        Self {
            bounds,
            now,
            humans,
            predators: EntityIndex::new(bounds, predators),
            prey: EntityIndex::new(bounds, prey),
            bushes: EntityIndex::new(bounds, bushes),
            corpses: EntityIndex::new(bounds, corpses),
            buildings,
            tribes,
            handles: BTreeMap::new(),
        }
    }

    /// Attaches the ECS entity for each id so effects can find their targets.
    pub fn with_handles(mut self, handles: BTreeMap<EntityId, Entity>) -> Self {
        self.handles = handles;
        self
    }

    pub fn handle(&self, id: EntityId) -> Option<Entity> {
        self.handles.get(&id).copied()
    }

    /// Any agent, whatever its kind.
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.humans
            .get(id)
            .or_else(|| self.predators.get(id))
            .or_else(|| self.prey.get(id))
    }

    /// Position of any entity in the snapshot.
    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.agent(id)
            .map(|a| a.position)
            .or_else(|| self.bushes.get(id).map(|b| b.position))
            .or_else(|| self.corpses.get(id).map(|c| c.position))
            .or_else(|| self.buildings.get(id).map(|b| b.position))
    }

    pub fn tribe(&self, id: TribeId) -> Option<&TribeSummary> {
        self.tribes.get(&id)
    }

    /// Buildings of one tribe and kind, ascending by id.
    pub fn tribe_buildings(&self, tribe: TribeId, kind: BuildingKind) -> Vec<&Building> {
        self.buildings
            .by_property(Property::BuildingKind(kind))
            .into_iter()
            .filter(|b| b.tribe == tribe)
            .collect()
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.bounds.distance(a, b)
    }

    pub fn reset_property_cache(&self) {
        self.humans.reset_property_cache();
        self.predators.reset_property_cache();
        self.prey.reset_property_cache();
        self.bushes.reset_property_cache();
        self.corpses.reset_property_cache();
        self.buildings.reset_property_cache();
    }
}

fn summarize_tribes(
    bounds: &WorldBounds,
    humans: &EntityIndex<Agent>,
    buildings: &EntityIndex<Building>,
) -> BTreeMap<TribeId, TribeSummary> {
    let mut grouped: BTreeMap<TribeId, Vec<&Agent>> = BTreeMap::new();
    for human in humans.all() {
        if let Some(tribe) = human.tribe() {
            grouped.entry(tribe).or_default().push(human);
        }
    }

    grouped
        .into_iter()
        .map(|(id, members)| {
            let leader = members
                .iter()
                .find(|m| m.role() == Some(Role::Leader))
                .map(|m| m.id);
            let anchor = leader
                .and_then(|l| humans.get(l))
                .or_else(|| members.first().copied())
                .map(|a| a.position)
                .unwrap_or(Vec2::ZERO);
            let offset = members
                .iter()
                .fold(Vec2::ZERO, |acc, m| acc + bounds.delta(anchor, m.position));
            let center = bounds.wrap(anchor + offset * (1.0 / members.len().max(1) as f32));

            let mut summary = TribeSummary {
                id,
                leader,
                center,
                members: members.iter().map(|m| m.id).collect(),
                adults: members.iter().filter(|m| m.is_adult).count(),
                storages: 0,
                stored_food: 0.0,
                storage_capacity: 0.0,
                planting_zones: 0,
            };
            for building in buildings.by_property(Property::Tribe(id)) {
                match building.kind {
                    BuildingKind::Storage => {
                        summary.storages += 1;
                        summary.stored_food += building.stored_food;
                        summary.storage_capacity += building.capacity;
                    }
                    BuildingKind::PlantingZone => summary.planting_zones += 1,
                }
            }
            (id, summary)
        })
        .collect()
}
