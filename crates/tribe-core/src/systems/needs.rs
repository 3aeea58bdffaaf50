//! Needs System
//!
//! Hunger, starvation, aging and the regrowth of food sources.

use bevy_ecs::prelude::*;
use tribe_events::{DAYS_PER_YEAR, HOURS_PER_DAY};

use crate::components::{Agent, AgentKind, BerryBush, GameClock};
use crate::config::{AiConfig, NeedsConfig};
use crate::query::SoilMap;

/// Age at which an agent of `kind` counts as an adult.
pub fn adult_age(kind: AgentKind, needs: &NeedsConfig) -> f32 {
    match kind {
        AgentKind::TribeMember { .. } => needs.adult_age_years,
        AgentKind::Predator | AgentKind::Prey => needs.animal_adult_age_years,
    }
}

/// Age at which an agent of `kind` dies of old age.
pub fn max_age(kind: AgentKind, needs: &NeedsConfig) -> f32 {
    match kind {
        AgentKind::TribeMember { .. } => needs.max_age_years,
        AgentKind::Predator | AgentKind::Prey => needs.animal_max_age_years,
    }
}

/// Advances one agent's needs by `hours`.
pub fn tick_needs(agent: &mut Agent, hours: f32, needs: &NeedsConfig) {
    agent.hunger = (agent.hunger + needs.hunger_per_hour * hours).min(1.0);
    if agent.hunger >= 1.0 {
        agent.hit_points = (agent.hit_points - needs.starvation_damage_per_hour * hours).max(0.0);
    }

    agent.age_years += hours / (HOURS_PER_DAY * DAYS_PER_YEAR) as f32;
    agent.is_adult = agent.age_years >= adult_age(agent.kind, needs);
    if agent.age_years >= max_age(agent.kind, needs) {
        agent.hit_points = 0.0;
    }
}

pub fn update_needs(mut agents: Query<&mut Agent>, config: Res<AiConfig>, clock: Res<GameClock>) {
    let hours = clock.hours_per_tick as f32;
    for mut agent in agents.iter_mut() {
        if agent.is_alive() {
            tick_needs(&mut agent, hours, &config.needs);
        }
    }
}

pub fn regrow_food(
    mut bushes: Query<&mut BerryBush>,
    mut soil: ResMut<SoilMap>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
) {
    let hours = clock.hours_per_tick as f32;
    for mut bush in bushes.iter_mut() {
        if bush.berries < bush.max_berries {
            bush.berries = (bush.berries + config.world.bush_regrowth_per_hour * hours).min(bush.max_berries);
        }
    }
    soil.regenerate(config.world.soil_regen_per_hour * hours);
}
