//! World Components
//!
//! Geometry on the wrap-around map, the game clock, and the non-agent
//! entities agents care about: berry bushes, corpses and buildings.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tribe_events::{GameTime, TickStamp};

use super::agent::{EntityId, TribeId};

/// 2D position or direction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Axis-aligned rectangle; `min` is the top-left corner on the wrapped map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(min: Vec2, width: f32, height: f32) -> Self {
        Self { min, width, height }
    }

    /// Square of half-size `radius` around `center`.
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            min: Vec2::new(center.x - radius, center.y - radius),
            width: radius * 2.0,
            height: radius * 2.0,
        }
    }
}

/// Size of the toroidal world. Every distance in the simulation goes through
/// this type so that the map edges wrap.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Maps any position back onto the map.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }

    /// Shortest vector from `from` to `to`, crossing edges when shorter.
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(to.x - from.x, self.width),
            wrap_axis(to.y - from.y, self.height),
        )
    }

    /// Wrapped distance.
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length()
    }

    pub fn rect_contains(&self, rect: &Rect, p: Vec2) -> bool {
        let dx = (p.x - rect.min.x).rem_euclid(self.width);
        let dy = (p.y - rect.min.y).rem_euclid(self.height);
        dx <= rect.width && dy <= rect.height
    }

    /// Moves `from` up to `step` units toward `to`. Returns the new position
    /// and whether it reached `to`.
    pub fn step_toward(&self, from: Vec2, to: Vec2, step: f32) -> (Vec2, bool) {
        let delta = self.delta(from, to);
        let distance = delta.length();
        if distance <= step {
            return (self.wrap(to), true);
        }
        (self.wrap(from + delta.normalize() * step), false)
    }

    /// Point `distance` units from `from`, directly away from `threat`.
    pub fn away_from(&self, from: Vec2, threat: Vec2, distance: f32) -> Vec2 {
        let mut dir = self.delta(threat, from).normalize();
        if dir == Vec2::ZERO {
            dir = Vec2::new(1.0, 0.0);
        }
        self.wrap(from + dir * distance)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(1000.0, 1000.0)
    }
}

fn wrap_axis(d: f32, size: f32) -> f32 {
    let half = size / 2.0;
    let d = d.rem_euclid(size);
    if d > half {
        d - size
    } else {
        d
    }
}

/// Resource: the simulation clock
#[derive(Resource, Debug, Clone)]
pub struct GameClock {
    pub stamp: TickStamp,
    /// In-game hours that pass per tick
    pub hours_per_tick: f64,
}

impl GameClock {
    pub fn new(hours_per_tick: f64) -> Self {
        Self {
            stamp: TickStamp::start(),
            hours_per_tick,
        }
    }

    pub fn now(&self) -> GameTime {
        self.stamp.time
    }

    pub fn tick(&self) -> u64 {
        self.stamp.tick
    }

    pub fn advance_tick(&mut self) {
        self.stamp.advance_tick(self.hours_per_tick);
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(0.25)
    }
}

/// Component: a berry bush
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BerryBush {
    pub id: EntityId,
    pub position: Vec2,
    pub berries: f32,
    pub max_berries: f32,
}

impl BerryBush {
    pub fn new(id: EntityId, position: Vec2, max_berries: f32) -> Self {
        Self {
            id,
            position,
            berries: max_berries,
            max_berries,
        }
    }

    pub fn has_berries(&self) -> bool {
        self.berries >= 1.0
    }
}

/// Component: remains of a dead agent, edible by humans and predators
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpse {
    pub id: EntityId,
    pub position: Vec2,
    pub food: f32,
    pub decays_at: GameTime,
}

/// Kind of building a tribe leader can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Storage,
    PlantingZone,
}

impl BuildingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingKind::Storage => "storage",
            BuildingKind::PlantingZone => "planting_zone",
        }
    }
}

/// Component: a building owned by a tribe
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub kind: BuildingKind,
    pub tribe: TribeId,
    pub position: Vec2,
    /// Food held (storage only)
    pub stored_food: f32,
    pub capacity: f32,
}

impl Building {
    pub fn new(id: EntityId, kind: BuildingKind, tribe: TribeId, position: Vec2, capacity: f32) -> Self {
        Self {
            id,
            kind,
            tribe,
            position,
            stored_food: 0.0,
            capacity,
        }
    }

    pub fn free_capacity(&self) -> f32 {
        (self.capacity - self.stored_food).max(0.0)
    }
}
