//! World Setup
//!
//! Map-wide resources and the berry bushes scattered over the map.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{BerryBush, IdAllocator, Vec2, WorldBounds};
use crate::config::AiConfig;
use crate::query::{SoilMap, TerritoryGrid};

/// Bounds, territory grid and soil map sized from the configuration.
pub fn create_world_map(config: &AiConfig) -> (WorldBounds, TerritoryGrid, SoilMap) {
    let bounds = WorldBounds::new(config.world.width, config.world.height);
    let territory = TerritoryGrid::new(&bounds, config.world.territory_cell_size);
    let soil = SoilMap::new(&bounds, config.world.soil_cell_size, config.world.soil_max_fertility);
    (bounds, territory, soil)
}

/// Scatters `config.world.berry_bushes` full bushes uniformly over the map.
pub fn spawn_bushes(world: &mut World, rng: &mut impl Rng, ids: &mut IdAllocator, config: &AiConfig) -> usize {
    let count = config.world.berry_bushes;
    for _ in 0..count {
        let position = Vec2::new(
            rng.gen_range(0.0..config.world.width),
            rng.gen_range(0.0..config.world.height),
        );
        world.spawn(BerryBush::new(ids.next_id(), position, config.world.bush_max_berries));
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_bushes_land_on_map() {
        let config = AiConfig::default();
        let mut world = World::new();
        let mut ids = IdAllocator::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let spawned = spawn_bushes(&mut world, &mut rng, &mut ids, &config);
        assert_eq!(spawned, config.world.berry_bushes);

        let mut query = world.query::<&BerryBush>();
        for bush in query.iter(&world) {
            assert!(bush.position.x < config.world.width && bush.position.y < config.world.height);
            assert!(bush.has_berries());
        }
    }
}
