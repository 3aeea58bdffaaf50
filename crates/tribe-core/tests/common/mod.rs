//! Shared helpers for integration tests.

#![allow(dead_code)]

use bevy_ecs::prelude::*;
use tribe_core::ai::blackboard::Blackboard;
use tribe_core::ai::dispatcher::initial_schedule;
use tribe_core::components::{Agent, AgentKind, EntityId, GameClock, Gender, IdAllocator, Role, TribeId, Vec2};
use tribe_core::setup::SpawnOptions;
use tribe_core::{build_schedule, init_world, AiConfig};

pub fn member(id: u64, tribe: u64, role: Role, x: f32, y: f32) -> Agent {
    let gender = if id % 2 == 0 { Gender::Female } else { Gender::Male };
    Agent::new(
        EntityId(id),
        AgentKind::TribeMember {
            tribe: TribeId(tribe),
            role,
        },
        Vec2::new(x, y),
        gender,
    )
    .with_age(25.0, 16.0)
}

pub fn predator(id: u64, x: f32, y: f32) -> Agent {
    Agent::new(EntityId(id), AgentKind::Predator, Vec2::new(x, y), Gender::Male)
        .with_age(5.0, 2.0)
        .with_hit_points(120.0)
}

pub fn prey(id: u64, x: f32, y: f32) -> Agent {
    Agent::new(EntityId(id), AgentKind::Prey, Vec2::new(x, y), Gender::Female)
        .with_age(3.0, 1.0)
        .with_hit_points(60.0)
}

/// A populated world and its schedule.
pub struct Harness {
    pub world: World,
    pub schedule: Schedule,
}

impl Harness {
    pub fn new(seed: u64, options: SpawnOptions) -> Self {
        Self::with_config(seed, options, AiConfig::default())
    }

    pub fn with_config(seed: u64, options: SpawnOptions, config: AiConfig) -> Self {
        let mut world = World::new();
        init_world(&mut world, config, &options, seed);
        Self {
            world,
            schedule: build_schedule(),
        }
    }

    /// A world with no spawned population; add agents with `spawn`.
    pub fn empty(seed: u64) -> Self {
        let mut config = AiConfig::default();
        config.world.berry_bushes = 0;
        Self::with_config(
            seed,
            SpawnOptions {
                tribes: 0,
                members_per_tribe: 0,
                prey: 0,
                predators: 0,
            },
            config,
        )
    }

    pub fn spawn(&mut self, agent: Agent) -> Entity {
        let config = self.world.resource::<AiConfig>().clone();
        let now = self.world.resource::<GameClock>().now();
        let schedule = initial_schedule(&agent, now, &config);
        self.world.resource_mut::<IdAllocator>().reserve_through(agent.id);
        self.world
            .spawn((agent, Blackboard::new(config.blackboard.ttl_hours), schedule))
            .id()
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.schedule.run(&mut self.world);
        }
    }

    /// Every agent, ascending by id.
    pub fn agents(&mut self) -> Vec<Agent> {
        let mut query = self.world.query::<&Agent>();
        let mut agents: Vec<Agent> = query.iter(&self.world).cloned().collect();
        agents.sort_by_key(|a| a.id);
        agents
    }

    pub fn agent(&mut self, id: u64) -> Option<Agent> {
        self.agents().into_iter().find(|a| a.id == EntityId(id))
    }
}
