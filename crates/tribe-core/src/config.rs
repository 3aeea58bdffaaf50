//! Configuration System
//!
//! Every radius, threshold, cooldown and capacity the AI uses is loaded from
//! `tuning.toml` so it can be adjusted without recompiling. Missing sections
//! and fields fall back to the defaults below.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Complete AI configuration.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AiConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub blackboard: BlackboardConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub needs: NeedsConfig,
    #[serde(default)]
    pub hunting: HuntingConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub patrol: PatrolConfig,
    #[serde(default)]
    pub pioneer: PioneerConfig,
    #[serde(default)]
    pub building: BuildingConfig,
    #[serde(default)]
    pub procreation: ProcreationConfig,
    #[serde(default)]
    pub flee: FleeConfig,
    #[serde(default)]
    pub eating: EatingConfig,
    #[serde(default)]
    pub claims: ClaimsConfig,
}

impl AiConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: AiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}; using defaults", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the AI cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
            }
        }
        fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("must be within 0..=1, got {}", value)))
            }
        }

        positive("simulation.hours_per_tick", self.simulation.hours_per_tick)?;
        positive("blackboard.ttl_hours", self.blackboard.ttl_hours)?;
        positive("world.width", self.world.width as f64)?;
        positive("world.height", self.world.height as f64)?;
        positive("world.territory_cell_size", self.world.territory_cell_size as f64)?;
        positive("world.soil_cell_size", self.world.soil_cell_size as f64)?;
        positive("claims.lease_hours", self.claims.lease_hours)?;

        // Per-agent node memory lives in the blackboard, so anything a node
        // must remember has to outlive a write by less than the TTL.
        let ttl = self.blackboard.ttl_hours;
        for (field, hours) in [
            ("building.cooldown_hours", self.building.cooldown_hours),
            ("procreation.partner_cache_hours", self.procreation.partner_cache_hours),
            ("patrol.repick_cooldown_hours", self.patrol.repick_cooldown_hours),
        ] {
            positive(field, hours)?;
            if hours > ttl {
                return Err(ConfigError::invalid(
                    field,
                    format!("{} hours exceeds the blackboard TTL of {} hours", hours, ttl),
                ));
            }
        }
        positive("dispatcher.action_timeout_hours", self.dispatcher.action_timeout_hours)?;

        if self.hunting.max_hunters_per_prey == 0 {
            return Err(ConfigError::invalid("hunting.max_hunters_per_prey", "must be at least 1"));
        }
        if self.combat.max_attackers_per_target == 0 {
            return Err(ConfigError::invalid("combat.max_attackers_per_target", "must be at least 1"));
        }

        fraction("flee.health_fraction", self.flee.health_fraction)?;
        fraction("flee.score", self.flee.score)?;
        fraction("flee.prey_min_score", self.flee.prey_min_score)?;
        fraction("flee.prey_max_score", self.flee.prey_max_score)?;
        if self.flee.prey_min_score > self.flee.prey_max_score {
            return Err(ConfigError::invalid(
                "flee.prey_min_score",
                "must not exceed flee.prey_max_score",
            ));
        }
        fraction("eating.hungry_threshold", self.eating.hungry_threshold)?;
        fraction("eating.sated_threshold", self.eating.sated_threshold)?;
        if self.eating.sated_threshold > self.eating.hungry_threshold {
            return Err(ConfigError::invalid(
                "eating.sated_threshold",
                "must not exceed eating.hungry_threshold",
            ));
        }
        fraction("building.storage_fill_ratio", self.building.storage_fill_ratio)?;

        Ok(())
    }
}

/// Clock and run length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// In-game hours per tick
    pub hours_per_tick: f64,
    pub default_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hours_per_tick: 0.25,
            default_ticks: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackboardConfig {
    /// Entries older than this are never returned
    pub ttl_hours: f64,
    /// How often expired entries are swept
    pub eviction_interval_hours: f64,
}

impl Default for BlackboardConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24.0,
            eviction_interval_hours: 6.0,
        }
    }
}

/// Evaluation cadence per archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub human_interval_hours: f64,
    pub predator_interval_hours: f64,
    pub prey_interval_hours: f64,
    /// Agents are spread over this many ticks by id
    pub phase_spread_ticks: u64,
    /// A utility action that keeps running this long is abandoned
    pub action_timeout_hours: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            human_interval_hours: 0.5,
            predator_interval_hours: 0.5,
            prey_interval_hours: 0.75,
            phase_spread_ticks: 3,
            action_timeout_hours: 24.0,
        }
    }
}

/// Map geometry and the stand-in food model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub territory_cell_size: f32,
    /// Radius in cells of the territory a tribe starts with
    pub initial_territory_radius: i32,
    pub soil_cell_size: f32,
    pub soil_max_fertility: f32,
    pub soil_regen_per_hour: f32,
    pub berry_bushes: usize,
    pub bush_max_berries: f32,
    pub bush_regrowth_per_hour: f32,
    pub corpse_decay_hours: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            territory_cell_size: 20.0,
            initial_territory_radius: 2,
            soil_cell_size: 50.0,
            soil_max_fertility: 10.0,
            soil_regen_per_hour: 0.05,
            berry_bushes: 60,
            bush_max_berries: 12.0,
            bush_regrowth_per_hour: 0.1,
            corpse_decay_hours: 48.0,
        }
    }
}

/// Movement speeds, in world units per in-game hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub human_speed: f32,
    pub predator_speed: f32,
    pub prey_speed: f32,
    /// Multiplier applied while fleeing
    pub flee_multiplier: f32,
    /// Distance at which an agent counts as standing at its target
    pub reach: f32,
    /// How far from its position an idle animal picks a wander point
    pub wander_radius: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            human_speed: 24.0,
            predator_speed: 28.0,
            prey_speed: 26.0,
            flee_multiplier: 1.5,
            reach: 4.0,
            wander_radius: 80.0,
        }
    }
}

/// Hunger, aging and starvation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    pub hunger_per_hour: f32,
    pub starvation_damage_per_hour: f32,
    pub adult_age_years: f32,
    pub max_age_years: f32,
    pub animal_adult_age_years: f32,
    pub animal_max_age_years: f32,
    pub human_hit_points: f32,
    pub predator_hit_points: f32,
    pub prey_hit_points: f32,
    pub corpse_food_human: f32,
    pub corpse_food_predator: f32,
    pub corpse_food_prey: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_per_hour: 0.012,
            starvation_damage_per_hour: 4.0,
            adult_age_years: 16.0,
            max_age_years: 70.0,
            animal_adult_age_years: 2.0,
            animal_max_age_years: 15.0,
            human_hit_points: 100.0,
            predator_hit_points: 120.0,
            prey_hit_points: 60.0,
            corpse_food_human: 6.0,
            corpse_food_predator: 8.0,
            corpse_food_prey: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntingConfig {
    /// Capacity slots per prey, shared by predators and human hunters
    pub max_hunters_per_prey: usize,
    pub predator_radius: f32,
    pub human_radius: f32,
    /// Predators only hunt above this hunger
    pub predator_hunger_threshold: f32,
    /// A hunt is abandoned once the prey is this far away
    pub max_chase_distance: f32,
    pub distance_scale: f32,
}

impl Default for HuntingConfig {
    fn default() -> Self {
        Self {
            max_hunters_per_prey: 3,
            predator_radius: 180.0,
            human_radius: 140.0,
            predator_hunger_threshold: 0.3,
            max_chase_distance: 260.0,
            distance_scale: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub max_attackers_per_target: usize,
    pub attack_range: f32,
    pub detection_radius: f32,
    pub human_damage_per_hour: f32,
    pub predator_damage_per_hour: f32,
    pub prey_damage_per_hour: f32,
    /// Predators attack humans only when this hungry
    pub predator_attack_hunger: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_attackers_per_target: 3,
            attack_range: 6.0,
            detection_radius: 90.0,
            human_damage_per_hour: 60.0,
            predator_damage_per_hour: 80.0,
            prey_damage_per_hour: 0.0,
            predator_attack_hunger: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Patrol point counts as reached within this distance
    pub arrival_distance: f32,
    pub repick_cooldown_hours: f64,
    /// Warriors give up a chase this far from home
    pub max_distance_from_home: f32,
    /// Fallback ring radius when a tribe has no painted territory
    pub fallback_radius: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            arrival_distance: 10.0,
            repick_cooldown_hours: 6.0,
            max_distance_from_home: 200.0,
            fallback_radius: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PioneerConfig {
    /// Pioneers expand until the tribe owns this many cells per member
    pub cells_per_member: f32,
    pub max_cells: usize,
}

impl Default for PioneerConfig {
    fn default() -> Self {
        Self {
            cells_per_member: 6.0,
            max_cells: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub cooldown_hours: f64,
    pub min_tribe_size: usize,
    /// Storage counts as full above this fill ratio
    pub storage_fill_ratio: f32,
    pub zones_per_member: f32,
    pub placement_attempts: usize,
    pub placement_radius: f32,
    pub min_spacing: f32,
    pub storage_capacity: f32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: 12.0,
            min_tribe_size: 4,
            storage_fill_ratio: 0.7,
            zones_per_member: 0.2,
            placement_attempts: 20,
            placement_radius: 70.0,
            min_spacing: 15.0,
            storage_capacity: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcreationConfig {
    /// Only agents below this hunger procreate
    pub max_hunger: f32,
    pub cooldown_hours: f64,
    pub partner_radius: f32,
    pub partner_cache_hours: f64,
    pub tribe_population_cap: usize,
    pub predator_population_cap: usize,
    pub prey_population_cap: usize,
}

impl Default for ProcreationConfig {
    fn default() -> Self {
        Self {
            max_hunger: 0.4,
            cooldown_hours: 96.0,
            partner_radius: 150.0,
            partner_cache_hours: 4.0,
            tribe_population_cap: 30,
            predator_population_cap: 12,
            prey_population_cap: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeConfig {
    /// Flee below this fraction of max hit points
    pub health_fraction: f32,
    pub aggressor_radius: f32,
    pub flee_distance: f32,
    /// Fixed utility of the low-health flee task
    pub score: f32,
    pub prey_radius: f32,
    pub prey_min_score: f32,
    pub prey_max_score: f32,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            health_fraction: 0.15,
            aggressor_radius: 80.0,
            flee_distance: 60.0,
            score: 0.9,
            prey_radius: 70.0,
            prey_min_score: 0.3,
            prey_max_score: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EatingConfig {
    pub hungry_threshold: f32,
    /// Eating stops below this hunger
    pub sated_threshold: f32,
    pub search_radius: f32,
    pub distance_scale: f32,
    /// Hunger removed per unit of food
    pub hunger_per_food: f32,
    /// Food eaten per evaluation at the source
    pub bite: f32,
    pub carry_capacity: f32,
    pub graze_threshold: f32,
}

impl Default for EatingConfig {
    fn default() -> Self {
        Self {
            hungry_threshold: 0.4,
            sated_threshold: 0.1,
            search_radius: 160.0,
            distance_scale: 50.0,
            hunger_per_food: 0.12,
            bite: 1.0,
            carry_capacity: 6.0,
            graze_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// A claim lapses when not renewed for this long
    pub lease_hours: f64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self { lease_hours: 2.0 }
    }
}
