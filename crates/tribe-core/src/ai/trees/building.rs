//! Leader building placement: storage when the stores fill up, planting
//! zones as the tribe grows.

use rand::Rng;
use tracing::debug;
use tribe_events::{EventOutcome, EventType, PlacementOutcome};

use crate::ai::behavior_tree::{
    ActionNode, BoxedNode, ConditionNode, CooldownNode, NodeOutcome, Selector, Sequence, Verdict,
};
use crate::ai::blackboard::{Blackboard, BlackboardKey, BlackboardValue};
use crate::ai::context::AiContext;
use crate::ai::effects::WorldEffect;
use crate::components::{ActiveAction, Agent, BuildingKind, Role, Target, TribeId, Vec2};
use crate::config::AiConfig;
use crate::query::TribeSummary;

pub fn building_branch(config: &AiConfig) -> BoxedNode {
    CooldownNode::boxed(
        "BuildingCooldown",
        config.building.cooldown_hours,
        Sequence::boxed(
            "BuildingPlacement",
            vec![
                ConditionNode::boxed("IsLeader", |agent, _, _| {
                    Verdict::from(agent.role() == Some(Role::Leader))
                }),
                ConditionNode::boxed("TribeLargeEnough", |agent, ctx, _| {
                    let size = tribe_of(agent, ctx).map_or(0, |t| t.member_count());
                    if size >= ctx.config.building.min_tribe_size {
                        Verdict::yes()
                    } else {
                        Verdict::no("tribe too small")
                    }
                }),
                Selector::boxed(
                    "ChooseBuilding",
                    vec![
                        Sequence::boxed(
                            "Storage",
                            vec![
                                ConditionNode::boxed("NeedsStorage", needs_storage),
                                ActionNode::boxed("PlaceStorage", place_building),
                            ],
                        ),
                        Sequence::boxed(
                            "PlantingZone",
                            vec![
                                ConditionNode::boxed("NeedsPlantingZone", needs_planting_zone),
                                ActionNode::boxed("PlacePlantingZone", place_building),
                            ],
                        ),
                    ],
                ),
            ],
        ),
    )
}

fn tribe_of<'w>(agent: &Agent, ctx: &AiContext<'w>) -> Option<&'w TribeSummary> {
    let world = ctx.world;
    world.tribe(agent.tribe()?)
}

/// Buildings of `kind` already queued for the tribe this tick.
fn planned(ctx: &AiContext<'_>, tribe: TribeId, kind: BuildingKind) -> usize {
    ctx.effects
        .planned_buildings()
        .filter(|(t, k, _)| *t == tribe && *k == kind)
        .count()
}

fn needs_storage(agent: &Agent, ctx: &AiContext<'_>, bb: &mut Blackboard) -> Verdict {
    let Some(tribe) = tribe_of(agent, ctx) else {
        return Verdict::no("no tribe");
    };
    if planned(ctx, tribe.id, BuildingKind::Storage) > 0 {
        return Verdict::no("storage already planned");
    }
    let full = tribe.storage_fill() >= ctx.config.building.storage_fill_ratio;
    if tribe.storages == 0 || (full && tribe.storages <= tribe.planting_zones) {
        bb.set(
            BlackboardKey::PlannedBuilding,
            BlackboardValue::Building(BuildingKind::Storage),
            ctx.now(),
        );
        return Verdict::yes();
    }
    Verdict::no("storage has room")
}

fn needs_planting_zone(agent: &Agent, ctx: &AiContext<'_>, bb: &mut Blackboard) -> Verdict {
    let Some(tribe) = tribe_of(agent, ctx) else {
        return Verdict::no("no tribe");
    };
    let wanted = (tribe.member_count() as f32 * ctx.config.building.zones_per_member).ceil() as usize;
    let have = tribe.planting_zones + planned(ctx, tribe.id, BuildingKind::PlantingZone);
    if have < wanted {
        bb.set(
            BlackboardKey::PlannedBuilding,
            BlackboardValue::Building(BuildingKind::PlantingZone),
            ctx.now(),
        );
        return Verdict::yes();
    }
    Verdict::no("enough planting zones")
}

/// On the tribe's own land and clear of every building, placed or planned.
pub fn is_valid_site(ctx: &AiContext<'_>, tribe: TribeId, position: Vec2) -> bool {
    let spacing = ctx.config.building.min_spacing;
    ctx.territory.is_owned_by(position, tribe)
        && ctx.world.buildings.by_radius(position, spacing).is_empty()
        && ctx
            .effects
            .planned_buildings()
            .all(|(_, _, planned)| ctx.distance(planned, position) >= spacing)
}

/// Samples offsets around the tribe center until one is a valid site, then
/// commits the building the blackboard asks for.
fn place_building(agent: &mut Agent, ctx: &mut AiContext<'_>, bb: &mut Blackboard) -> NodeOutcome {
    let now = ctx.now();
    let Some(kind) = bb
        .get(BlackboardKey::PlannedBuilding, now)
        .and_then(|value| value.as_building())
    else {
        return NodeOutcome::failure().because("nothing planned");
    };
    let Some(tribe) = tribe_of(agent, ctx) else {
        return NodeOutcome::failure().because("no tribe");
    };
    let (tribe_id, center) = (tribe.id, tribe.center);

    let radius = ctx.config.building.placement_radius;
    let mut site = None;
    for _ in 0..ctx.config.building.placement_attempts {
        let offset = Vec2::new(ctx.rng.gen_range(-radius..=radius), ctx.rng.gen_range(-radius..=radius));
        let candidate = ctx.bounds().wrap(center + offset);
        if is_valid_site(ctx, tribe_id, candidate) {
            site = Some(candidate);
            break;
        }
    }
    let Some(position) = site else {
        return NodeOutcome::failure().because("no valid site");
    };

    bb.delete(BlackboardKey::PlannedBuilding);
    ctx.queue(WorldEffect::PlaceBuilding {
        tribe: tribe_id,
        kind,
        position,
    });
    debug!(leader = agent.id.0, tribe = tribe_id.0, kind = kind.as_str(), "building placed");
    ctx.emit(
        EventType::Building,
        agent,
        EventOutcome::Placement(PlacementOutcome {
            what: kind.as_str().to_string(),
            position: position.to_array(),
        }),
    );
    agent.intent.set(ActiveAction::Building, Some(Target::Position(position)), now);
    NodeOutcome::success().because(kind.as_str())
}
