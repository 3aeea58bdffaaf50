//! Per-category entity index.
//!
//! A linear-scan stand-in for a real spatial index: fine for a few hundred
//! entities. Every result is ordered deterministically so that two agents
//! asking the same question get the same answer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::components::{
    ActiveAction, Agent, BerryBush, Building, BuildingKind, Corpse, EntityId, Gender, Rect, Role,
    TribeId, Vec2, WorldBounds,
};

/// A lookup key for `EntityIndex::by_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Tribe(TribeId),
    Role(Role),
    Adult(bool),
    Gender(Gender),
    ParentOf(EntityId),
    Action(ActiveAction),
    AttackTarget(EntityId),
    BuildingKind(BuildingKind),
}

/// Anything that can live in an `EntityIndex`.
pub trait Indexed {
    fn id(&self) -> EntityId;
    fn position(&self) -> Vec2;

    /// Whether this entity has the given property. Unknown keys never match.
    fn has_property(&self, _property: &Property) -> bool {
        false
    }
}

impl Indexed for Agent {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn has_property(&self, property: &Property) -> bool {
        match *property {
            Property::Tribe(tribe) => self.tribe() == Some(tribe),
            Property::Role(role) => self.role() == Some(role),
            Property::Adult(adult) => self.is_adult == adult,
            Property::Gender(gender) => self.gender == gender,
            // Children of `id`
            Property::ParentOf(id) => self.family.is_parent(id),
            Property::Action(action) => self.intent.active_action == action,
            Property::AttackTarget(id) => self.intent.attack_target == Some(id),
            Property::BuildingKind(_) => false,
        }
    }
}

impl Indexed for BerryBush {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }
}

impl Indexed for Corpse {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }
}

impl Indexed for Building {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn has_property(&self, property: &Property) -> bool {
        match *property {
            Property::Tribe(tribe) => self.tribe == tribe,
            Property::BuildingKind(kind) => self.kind == kind,
            _ => false,
        }
    }
}

/// Immutable collection of one entity category, rebuilt every tick.
#[derive(Debug)]
pub struct EntityIndex<T> {
    bounds: WorldBounds,
    items: Vec<T>,
    by_id: BTreeMap<EntityId, usize>,
    property_cache: Mutex<HashMap<Property, Vec<usize>>>,
}

impl<T: Indexed> EntityIndex<T> {
    pub fn new(bounds: WorldBounds, mut items: Vec<T>) -> Self {
        items.sort_by_key(|item| item.id());
        let by_id = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.id(), i))
            .collect();
        Self {
            bounds,
            items,
            by_id,
            property_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn empty(bounds: WorldBounds) -> Self {
        Self::new(bounds, Vec::new())
    }

    /// All entities, ascending by id.
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.by_id.get(&id).and_then(|i| self.items.get(*i))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Entities within `radius` of `center` (wrapped), nearest first, ties by id.
    pub fn by_radius(&self, center: Vec2, radius: f32) -> Vec<(&T, f32)> {
        let mut found: Vec<(&T, f32)> = self
            .items
            .iter()
            .map(|item| (item, self.bounds.distance(center, item.position())))
            .filter(|(_, d)| *d <= radius)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id().cmp(&b.0.id())));
        found
    }

    /// Nearest entity within `radius` that satisfies `filter`.
    pub fn nearest_where(
        &self,
        center: Vec2,
        radius: f32,
        mut filter: impl FnMut(&T) -> bool,
    ) -> Option<(&T, f32)> {
        self.by_radius(center, radius)
            .into_iter()
            .find(|(item, _)| filter(*item))
    }

    /// Entities inside `rect`, ascending by id.
    pub fn by_rect(&self, rect: &Rect) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| self.bounds.rect_contains(rect, item.position()))
            .collect()
    }

    /// Entities with `property`, ascending by id. Results are cached until
    /// `reset_property_cache`.
    pub fn by_property(&self, property: Property) -> Vec<&T> {
        let mut cache = match self.property_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slots = cache.entry(property).or_insert_with(|| {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.has_property(&property))
                .map(|(i, _)| i)
                .collect()
        });
        slots.iter().filter_map(|i| self.items.get(*i)).collect()
    }

    pub fn reset_property_cache(&self) {
        match self.property_cache.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn cached_properties(&self) -> usize {
        match self.property_cache.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
