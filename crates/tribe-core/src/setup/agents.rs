//! Agent Setup
//!
//! Spawns tribes around the map center, each on a disc of starting
//! territory, and scatters predators and prey.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;

use crate::ai::blackboard::Blackboard;
use crate::ai::dispatcher::initial_schedule;
use crate::components::{Agent, AgentKind, GameClock, Gender, IdAllocator, Role, TribeId, Vec2};
use crate::config::AiConfig;
use crate::query::TerritoryGrid;

/// How many of each kind to spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnOptions {
    pub tribes: usize,
    pub members_per_tribe: usize,
    pub prey: usize,
    pub predators: usize,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            tribes: 3,
            members_per_tribe: 8,
            prey: 40,
            predators: 6,
        }
    }
}

/// Role of the `index`-th founding member: one leader, then a mix
/// weighted toward gatherers.
pub fn founding_role(index: usize) -> Role {
    const ROTATION: [Role; 6] = [
        Role::Warrior,
        Role::Pioneer,
        Role::Gatherer,
        Role::Hunter,
        Role::Gatherer,
        Role::Warrior,
    ];
    if index == 0 {
        Role::Leader
    } else {
        ROTATION[(index - 1) % ROTATION.len()]
    }
}

/// Where tribe `index` of `count` settles: evenly spaced on a ring.
pub fn settlement(index: usize, count: usize, config: &AiConfig) -> Vec2 {
    let center = Vec2::new(config.world.width / 2.0, config.world.height / 2.0);
    if count <= 1 {
        return center;
    }
    let radius = config.world.width.min(config.world.height) * 0.3;
    let angle = std::f32::consts::TAU * index as f32 / count as f32;
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

fn spawn_agent(world: &mut World, agent: Agent, config: &AiConfig) {
    let now = world.get_resource::<GameClock>().map(|c| c.now()).unwrap_or_default();
    let schedule = initial_schedule(&agent, now, config);
    world.spawn((agent, Blackboard::new(config.blackboard.ttl_hours), schedule));
}

pub fn spawn_tribes(
    world: &mut World,
    rng: &mut impl Rng,
    ids: &mut IdAllocator,
    territory: &mut TerritoryGrid,
    config: &AiConfig,
    options: &SpawnOptions,
) {
    for t in 0..options.tribes {
        let tribe = TribeId(t as u64 + 1);
        let home = settlement(t, options.tribes, config);
        territory.paint_disc(home, config.world.initial_territory_radius, tribe);

        for i in 0..options.members_per_tribe {
            let offset = Vec2::new(rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0));
            let gender = if i % 2 == 0 { Gender::Male } else { Gender::Female };
            let age = rng.gen_range(config.needs.adult_age_years..config.needs.adult_age_years + 20.0);
            let mut agent = Agent::new(
                ids.next_id(),
                AgentKind::TribeMember {
                    tribe,
                    role: founding_role(i),
                },
                home + offset,
                gender,
            )
            .with_hit_points(config.needs.human_hit_points)
            .with_age(age, config.needs.adult_age_years);
            agent.hunger = rng.gen_range(0.0..0.3);
            spawn_agent(world, agent, config);
        }
    }
}

pub fn spawn_animals(world: &mut World, rng: &mut impl Rng, ids: &mut IdAllocator, config: &AiConfig, options: &SpawnOptions) {
    let kinds = std::iter::repeat(AgentKind::Prey)
        .take(options.prey)
        .chain(std::iter::repeat(AgentKind::Predator).take(options.predators));
    for kind in kinds {
        let position = Vec2::new(
            rng.gen_range(0.0..config.world.width),
            rng.gen_range(0.0..config.world.height),
        );
        let gender = if rng.gen_bool(0.5) { Gender::Female } else { Gender::Male };
        let adult = config.needs.animal_adult_age_years;
        let max_hit_points = match kind {
            AgentKind::Predator => config.needs.predator_hit_points,
            _ => config.needs.prey_hit_points,
        };
        let mut agent = Agent::new(ids.next_id(), kind, position, gender)
            .with_hit_points(max_hit_points)
            .with_age(rng.gen_range(adult..adult + 4.0), adult);
        agent.hunger = rng.gen_range(0.0..0.3);
        spawn_agent(world, agent, config);
    }
}

/// Counts of agents per kind and per tribe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnSummary {
    pub total_agents: usize,
    pub predators: usize,
    pub prey: usize,
    pub by_tribe: BTreeMap<TribeId, usize>,
}

pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut summary = SpawnSummary::default();
    let mut query = world.query::<&Agent>();
    for agent in query.iter(world) {
        summary.total_agents += 1;
        match agent.kind {
            AgentKind::TribeMember { tribe, .. } => *summary.by_tribe.entry(tribe).or_insert(0) += 1,
            AgentKind::Predator => summary.predators += 1,
            AgentKind::Prey => summary.prey += 1,
        }
    }
    summary
}
