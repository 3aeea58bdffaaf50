//! Clock and Snapshot Systems
//!
//! The clock advances first; the snapshot is then rebuilt from the ECS so
//! every decision of the tick reads the same world.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;

use crate::components::{Agent, BerryBush, Building, Corpse, GameClock, WorldBounds};
use crate::query::WorldSnapshot;

/// Advances the game clock by one tick.
pub fn advance_clock(mut clock: ResMut<GameClock>) {
    clock.advance_tick();
}

/// Rebuilds the `WorldSnapshot` resource from the current components.
pub fn build_snapshot(
    mut snapshot: ResMut<WorldSnapshot>,
    bounds: Res<WorldBounds>,
    clock: Res<GameClock>,
    agents: Query<(Entity, &Agent)>,
    bushes: Query<(Entity, &BerryBush)>,
    corpses: Query<(Entity, &Corpse)>,
    buildings: Query<(Entity, &Building)>,
) {
    let mut handles = BTreeMap::new();
    let agents = agents
        .iter()
        .map(|(entity, agent)| {
            handles.insert(agent.id, entity);
            agent.clone()
        })
        .collect();
    let bushes = bushes
        .iter()
        .map(|(entity, bush)| {
            handles.insert(bush.id, entity);
            bush.clone()
        })
        .collect();
    let corpses = corpses
        .iter()
        .map(|(entity, corpse)| {
            handles.insert(corpse.id, entity);
            corpse.clone()
        })
        .collect();
    let buildings = buildings
        .iter()
        .map(|(entity, building)| {
            handles.insert(building.id, entity);
            building.clone()
        })
        .collect();

    *snapshot =
        WorldSnapshot::build(*bounds, clock.now(), agents, bushes, corpses, buildings).with_handles(handles);
}
