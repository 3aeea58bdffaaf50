//! Agent builders for unit tests.

use crate::components::{Agent, AgentKind, EntityId, Gender, Role, TribeId, Vec2};

/// Adult gatherer of tribe 1.
pub fn human(id: u64, x: f32, y: f32) -> Agent {
    member(id, 1, Role::Gatherer, x, y)
}

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
