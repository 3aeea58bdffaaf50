//! Effect Application System
//!
//! Applies the `WorldEffect`s decisions queued this tick. Targets are looked
//! up through the snapshot's handles and every precondition is re-checked,
//! so a stale or duplicated effect does nothing.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};
use tribe_events::{EventOutcome, EventType, GeneralOutcome};

use crate::ai::blackboard::Blackboard;
use crate::ai::dispatcher::initial_schedule;
use crate::ai::effects::{PendingEffects, WorldEffect};
use crate::components::{
    Agent, AgentKind, BerryBush, Building, BuildingKind, Corpse, EntityId, Family, Gender, GameClock, IdAllocator,
    Role, Vec2,
};
use crate::config::AiConfig;
use crate::events::PendingEvents;
use crate::query::{SoilMap, WorldSnapshot};
use crate::SimRng;

/// Everything the applier mutates besides the queue itself.
#[derive(bevy_ecs::system::SystemParam)]
pub struct EffectTargets<'w, 's> {
    agents: Query<'w, 's, &'static mut Agent>,
    bushes: Query<'w, 's, &'static mut BerryBush>,
    corpses: Query<'w, 's, &'static mut Corpse>,
    buildings: Query<'w, 's, &'static mut Building>,
    soil: ResMut<'w, SoilMap>,
}

#[allow(clippy::too_many_arguments)]
pub fn apply_effects(
    mut commands: Commands,
    mut pending: ResMut<PendingEffects>,
    mut targets: EffectTargets,
    snapshot: Res<WorldSnapshot>,
    config: Res<AiConfig>,
    clock: Res<GameClock>,
    mut ids: ResMut<IdAllocator>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<PendingEvents>,
) {
    let mut couples: BTreeSet<(EntityId, EntityId)> = BTreeSet::new();
    let mut placed: Vec<Vec2> = Vec::new();
    let hunger_per_food = config.eating.hunger_per_food;

    for effect in pending.drain() {
        match effect {
            WorldEffect::PlaceBuilding { tribe, kind, position } => {
                let spacing = config.building.min_spacing;
                let crowded = !snapshot.buildings.by_radius(position, spacing).is_empty()
                    || placed.iter().any(|p| snapshot.distance(*p, position) < spacing);
                if crowded {
                    debug!(tribe = tribe.0, kind = kind.as_str(), "building site taken");
                    continue;
                }
                placed.push(position);
                let capacity = match kind {
                    BuildingKind::Storage => config.building.storage_capacity,
                    BuildingKind::PlantingZone => 0.0,
                };
                commands.spawn(Building::new(ids.next_id(), kind, tribe, position, capacity));
                if kind == BuildingKind::PlantingZone {
                    commands.spawn(BerryBush::new(ids.next_id(), position, config.world.bush_max_berries));
                }
                info!(tribe = tribe.0, kind = kind.as_str(), x = position.x, y = position.y, "building raised");
            }

            WorldEffect::Procreate { parent, partner } => {
                let pair = (parent.min(partner), parent.max(partner));
                if !couples.insert(pair) {
                    continue;
                }
                let (Some(parent_entity), Some(partner_entity)) = (snapshot.handle(parent), snapshot.handle(partner))
                else {
                    continue;
                };
                let (Ok(a), Ok(b)) = (
                    targets.agents.get(parent_entity),
                    targets.agents.get(partner_entity),
                ) else {
                    continue;
                };
                if !a.is_alive() || !b.is_alive() {
                    continue;
                }
                let child = newborn(ids.next_id(), a, b, &config, &mut rng.0);
                let parent_snapshot = a.clone();

                if let Ok(mut other) = targets.agents.get_mut(partner_entity) {
                    other.last_procreation = Some(clock.now());
                    other.family.partner = Some(parent);
                }
                info!(
                    child = child.id.0,
                    kind = child.kind.as_str(),
                    mother = child.family.mother.map_or(0, |m| m.0),
                    father = child.family.father.map_or(0, |f| f.0),
                    "child born"
                );
                events.record(
                    clock.stamp,
                    EventType::Birth,
                    &parent_snapshot,
                    EventOutcome::General(GeneralOutcome {
                        description: "child born".into(),
                        other_id: Some(child.id.0),
                    }),
                );
                let schedule = initial_schedule(&child, clock.now(), &config);
                commands.spawn((child, Blackboard::new(config.blackboard.ttl_hours), schedule));
            }

            WorldEffect::EatBerries { agent, bush, amount } => {
                let Some(taken) = snapshot
                    .handle(bush)
                    .and_then(|e| targets.bushes.get_mut(e).ok())
                    .map(|mut bush| take(&mut bush.berries, amount))
                else {
                    continue;
                };
                feed_agent(&mut targets.agents, &snapshot, agent, taken * hunger_per_food);
            }

            WorldEffect::Harvest { agent, bush, amount } => {
                let Some(mut picker) = snapshot.handle(agent).and_then(|e| targets.agents.get_mut(e).ok()) else {
                    continue;
                };
                let room = (config.eating.carry_capacity - picker.carried_food).max(0.0);
                let Some(taken) = snapshot
                    .handle(bush)
                    .and_then(|e| targets.bushes.get_mut(e).ok())
                    .map(|mut bush| take(&mut bush.berries, amount.min(room)))
                else {
                    continue;
                };
                picker.carried_food += taken;
            }

            WorldEffect::EatCorpse { agent, corpse, amount } => {
                let Some(taken) = snapshot
                    .handle(corpse)
                    .and_then(|e| targets.corpses.get_mut(e).ok())
                    .map(|mut corpse| take(&mut corpse.food, amount))
                else {
                    continue;
                };
                feed_agent(&mut targets.agents, &snapshot, agent, taken * hunger_per_food);
            }

            WorldEffect::EatStored { agent, building, amount } => {
                let Some(taken) = snapshot
                    .handle(building)
                    .and_then(|e| targets.buildings.get_mut(e).ok())
                    .map(|mut storage| take(&mut storage.stored_food, amount))
                else {
                    continue;
                };
                feed_agent(&mut targets.agents, &snapshot, agent, taken * hunger_per_food);
            }

            WorldEffect::Deposit { agent, building } => {
                let (Some(agent_entity), Some(building_entity)) = (snapshot.handle(agent), snapshot.handle(building))
                else {
                    continue;
                };
                let (Ok(mut carrier), Ok(mut storage)) = (
                    targets.agents.get_mut(agent_entity),
                    targets.buildings.get_mut(building_entity),
                ) else {
                    continue;
                };
                let moved = carrier.carried_food.min(storage.free_capacity());
                carrier.carried_food -= moved;
                storage.stored_food += moved;
            }

            WorldEffect::Feed { parent, child, amount } => {
                let Some(given) = snapshot
                    .handle(parent)
                    .and_then(|e| targets.agents.get_mut(e).ok())
                    .map(|mut giver| take(&mut giver.carried_food, amount))
                else {
                    continue;
                };
                feed_agent(&mut targets.agents, &snapshot, child, given * hunger_per_food);
            }

            WorldEffect::Graze { agent, position, amount } => {
                let taken = targets.soil.deplete(position, amount);
                feed_agent(&mut targets.agents, &snapshot, agent, taken * hunger_per_food);
            }
        }
    }
}

/// Removes up to `amount` from `stock` and returns what was taken.
fn take(stock: &mut f32, amount: f32) -> f32 {
    let taken = amount.min(*stock).max(0.0);
    *stock -= taken;
    taken
}

fn feed_agent(agents: &mut Query<&mut Agent>, snapshot: &WorldSnapshot, id: EntityId, relief: f32) {
    if relief <= 0.0 {
        return;
    }
    if let Some(mut agent) = snapshot.handle(id).and_then(|e| agents.get_mut(e).ok()) {
        agent.hunger = (agent.hunger - relief).max(0.0);
    }
}

/// A child of `a` and `b`, born where the mother stands.
fn newborn(id: EntityId, a: &Agent, b: &Agent, config: &AiConfig, rng: &mut impl Rng) -> Agent {
    let (mother, father) = if a.gender == Gender::Female { (a, b) } else { (b, a) };
    let kind = match a.kind {
        AgentKind::TribeMember { tribe, .. } => AgentKind::TribeMember {
            tribe,
            role: Role::Gatherer,
        },
        other => other,
    };
    let max_hit_points = match kind {
        AgentKind::TribeMember { .. } => config.needs.human_hit_points,
        AgentKind::Predator => config.needs.predator_hit_points,
        AgentKind::Prey => config.needs.prey_hit_points,
    };
    let gender = if rng.gen_bool(0.5) { Gender::Female } else { Gender::Male };

    let mut child = Agent::new(id, kind, mother.position, gender).with_hit_points(max_hit_points);
    child.family = Family {
        mother: Some(mother.id),
        father: Some(father.id),
        partner: None,
    };
    child
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_never_goes_negative() {
        let mut stock = 2.5;
        assert_eq!(take(&mut stock, 1.0), 1.0);
        assert_eq!(take(&mut stock, 4.0), 1.5);
        assert_eq!(stock, 0.0);
        assert_eq!(take(&mut stock, 1.0), 0.0);
    }

    #[test]
    fn test_newborn_inherits_tribe_and_parents() {
        use crate::ai::testing::member;
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mother = member(2, 3, Role::Warrior, 10.0, 20.0);
        let father = member(5, 3, Role::Leader, 40.0, 20.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let child = newborn(EntityId(9), &father, &mother, &AiConfig::default(), &mut rng);

        assert_eq!(child.tribe(), mother.tribe());
        assert_eq!(child.role(), Some(Role::Gatherer));
        assert_eq!(child.family.mother, Some(EntityId(2)));
        assert_eq!(child.family.father, Some(EntityId(5)));
        assert_eq!(child.position, mother.position);
        assert!(!child.is_adult);
    }
}
