//! Agent Components
//!
//! The single `Agent` record the AI reads and writes, plus the small types
//! hanging off it: kind, role, intent and family links.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tribe_events::GameTime;

use super::world::Vec2;

/// Stable identifier for anything in the world (agents, bushes, buildings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a tribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TribeId(pub u64);

impl fmt::Display for TribeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource: hands out entity ids in creation order
#[derive(Resource, Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> EntityId {
        if self.next == 0 {
            self.next = 1;
        }
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Makes sure ids up to and including `id` are never handed out.
    pub fn reserve_through(&mut self, id: EntityId) {
        if self.next <= id.0 {
            self.next = id.0 + 1;
        }
    }
}

/// Role of a tribe member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Leader,
    Warrior,
    Pioneer,
    Hunter,
    Gatherer,
}

impl Default for Role {
    fn default() -> Self {
        Role::Gatherer
    }
}

/// What kind of agent this is; dispatch matches on it exhaustively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    TribeMember { tribe: TribeId, role: Role },
    Predator,
    Prey,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::TribeMember { .. } => "tribe_member",
            AgentKind::Predator => "predator",
            AgentKind::Prey => "prey",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Female => Gender::Male,
            Gender::Male => Gender::Female,
        }
    }
}

/// The one thing an agent is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveAction {
    #[default]
    Idle,
    Wandering,
    Walking,
    ReturningHome,
    Eating,
    Grazing,
    Gathering,
    Storing,
    Hunting,
    Attacking,
    Fleeing,
    Patrolling,
    Pioneering,
    Building,
    Procreating,
    Feeding,
}

impl ActiveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveAction::Idle => "idle",
            ActiveAction::Wandering => "wandering",
            ActiveAction::Walking => "walking",
            ActiveAction::ReturningHome => "returning_home",
            ActiveAction::Eating => "eating",
            ActiveAction::Grazing => "grazing",
            ActiveAction::Gathering => "gathering",
            ActiveAction::Storing => "storing",
            ActiveAction::Hunting => "hunting",
            ActiveAction::Attacking => "attacking",
            ActiveAction::Fleeing => "fleeing",
            ActiveAction::Patrolling => "patrolling",
            ActiveAction::Pioneering => "pioneering",
            ActiveAction::Building => "building",
            ActiveAction::Procreating => "procreating",
            ActiveAction::Feeding => "feeding",
        }
    }

    /// Actions during which the combat system deals damage to `attack_target`.
    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActiveAction::Attacking | ActiveAction::Hunting)
    }
}

impl fmt::Display for ActiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an agent is headed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Entity(EntityId),
    Position(Vec2),
}

impl Target {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Target::Entity(id) => Some(*id),
            Target::Position(_) => None,
        }
    }

    pub fn position(&self) -> Option<Vec2> {
        match self {
            Target::Position(p) => Some(*p),
            Target::Entity(_) => None,
        }
    }
}

/// The agent's committed goal. Overwriting it is how goals are switched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Intent {
    pub active_action: ActiveAction,
    pub target: Option<Target>,
    pub attack_target: Option<EntityId>,
    /// When `active_action` last changed
    pub since: GameTime,
}

impl Intent {
    /// Commits to an action. `since` only moves when the action changes.
    pub fn set(&mut self, action: ActiveAction, target: Option<Target>, now: GameTime) {
        if self.active_action != action {
            self.since = now;
        }
        self.active_action = action;
        self.target = target;
        if !action.is_aggressive() {
            self.attack_target = None;
        }
    }

    /// Commits to attacking `enemy`.
    pub fn attack(&mut self, action: ActiveAction, enemy: EntityId, now: GameTime) {
        self.set(action, Some(Target::Entity(enemy)), now);
        self.attack_target = Some(enemy);
    }

    pub fn go_idle(&mut self, now: GameTime) {
        self.set(ActiveAction::Idle, None, now);
    }

    pub fn is_attacking(&self, enemy: EntityId) -> bool {
        self.active_action.is_aggressive() && self.attack_target == Some(enemy)
    }
}

/// Family links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Family {
    pub mother: Option<EntityId>,
    pub father: Option<EntityId>,
    pub partner: Option<EntityId>,
}

impl Family {
    pub fn is_parent(&self, id: EntityId) -> bool {
        self.mother == Some(id) || self.father == Some(id)
    }
}

/// Component: everything the AI core knows about one agent
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: EntityId,
    pub kind: AgentKind,
    pub position: Vec2,
    pub hit_points: f32,
    pub max_hit_points: f32,
    /// 0.0 sated, 1.0 starving
    pub hunger: f32,
    pub age_years: f32,
    pub gender: Gender,
    pub is_adult: bool,
    pub family: Family,
    pub intent: Intent,
    /// Last agent that damaged this one
    pub last_aggressor: Option<EntityId>,
    pub last_procreation: Option<GameTime>,
    /// Berries carried back to storage
    pub carried_food: f32,
}

impl Agent {
    pub fn new(id: EntityId, kind: AgentKind, position: Vec2, gender: Gender) -> Self {
        Self {
            id,
            kind,
            position,
            hit_points: 100.0,
            max_hit_points: 100.0,
            hunger: 0.0,
            age_years: 0.0,
            gender,
            is_adult: false,
            family: Family::default(),
            intent: Intent::default(),
            last_aggressor: None,
            last_procreation: None,
            carried_food: 0.0,
        }
    }

    pub fn with_age(mut self, age_years: f32, adult_age: f32) -> Self {
        self.age_years = age_years;
        self.is_adult = age_years >= adult_age;
        self
    }

    pub fn with_hit_points(mut self, max: f32) -> Self {
        self.hit_points = max;
        self.max_hit_points = max;
        self
    }

    pub fn tribe(&self) -> Option<TribeId> {
        match self.kind {
            AgentKind::TribeMember { tribe, .. } => Some(tribe),
            AgentKind::Predator | AgentKind::Prey => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self.kind {
            AgentKind::TribeMember { role, .. } => Some(role),
            AgentKind::Predator | AgentKind::Prey => None,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self.kind, AgentKind::TribeMember { .. })
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_hit_points <= 0.0 {
            return 0.0;
        }
        (self.hit_points / self.max_hit_points).clamp(0.0, 1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0.0
    }
}

/// Component: when the dispatcher next looks at this agent
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct AiSchedule {
    pub next_evaluation: GameTime,
    pub evaluations: u64,
}

impl AiSchedule {
    pub fn starting_at(time: GameTime) -> Self {
        Self {
            next_evaluation: time,
            evaluations: 0,
        }
    }

    pub fn is_due(&self, now: GameTime) -> bool {
        now >= self.next_evaluation
    }
}
