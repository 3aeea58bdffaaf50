//! Eating, gathering, storing and grazing.

use tribe_events::GameTime;

use crate::ai::blackboard::Blackboard;
use crate::ai::context::AiContext;
use crate::ai::effects::WorldEffect;
use crate::ai::steering::approach;
use crate::ai::task::scoring::{blend, distance_term, hunger_need};
use crate::ai::task::{Task, TaskDefinition, TaskId, TaskMap, TaskResult, TaskType};
use crate::components::{ActiveAction, Agent, AgentKind, BerryBush, BuildingKind, Corpse, Target};

/// How many nearby food sources become candidates.
const NEAREST_SOURCES: usize = 3;

fn horizon(ctx: &AiContext<'_>) -> GameTime {
    ctx.now() + ctx.config.claims.lease_hours
}

/// Hunger above which an agent of this kind goes looking for food.
pub fn hungry_threshold(agent: &Agent, ctx: &AiContext<'_>) -> f32 {
    match agent.kind {
        AgentKind::TribeMember { .. } => ctx.config.eating.hungry_threshold,
        AgentKind::Predator => ctx.config.hunting.predator_hunger_threshold,
        AgentKind::Prey => ctx.config.eating.graze_threshold,
    }
}

pub fn is_sated(agent: &Agent, ctx: &AiContext<'_>) -> bool {
    agent.hunger <= ctx.config.eating.sated_threshold
}

/// True while the agent is eating from the target `task` offers.
fn is_eating_from(agent: &Agent, task: &Task) -> bool {
    matches!(agent.intent.active_action, ActiveAction::Eating | ActiveAction::Grazing)
        && task.target.is_some()
        && agent.intent.target == task.target
}

/// Hunger need behind a meal, or `None` if the agent should not start it.
/// A meal already under way stays applicable until the agent is sated.
fn appetite(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    if is_eating_from(agent, task) {
        let sated = ctx.config.eating.sated_threshold;
        return (agent.hunger > sated).then(|| hunger_need(agent.hunger, sated));
    }
    let threshold = hungry_threshold(agent, ctx);
    (agent.hunger >= threshold).then(|| hunger_need(agent.hunger, threshold))
}

fn bushes_near<'w>(agent: &Agent, ctx: &AiContext<'w>) -> Vec<(&'w BerryBush, f32)> {
    ctx.world
        .bushes
        .by_radius(agent.position, ctx.config.eating.search_radius)
        .into_iter()
        .filter(|(bush, _)| bush.has_berries())
        .take(NEAREST_SOURCES)
        .collect()
}

fn corpses_near<'w>(agent: &Agent, ctx: &AiContext<'w>) -> Vec<(&'w Corpse, f32)> {
    let radius = match agent.kind {
        AgentKind::Predator => ctx.config.hunting.predator_radius,
        _ => ctx.config.eating.search_radius,
    };
    ctx.world
        .corpses
        .by_radius(agent.position, radius)
        .into_iter()
        .filter(|(corpse, _)| corpse.food > 0.0)
        .take(NEAREST_SOURCES)
        .collect()
}

fn closeness(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let target = match task.target? {
        Target::Entity(id) => ctx.world.position_of(id)?,
        Target::Position(p) => p,
    };
    Some(distance_term(
        ctx.distance(agent.position, target),
        ctx.config.eating.distance_scale,
    ))
}

// eat_berries

fn produce_eat_berries(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    bushes_near(agent, ctx)
        .into_iter()
        .map(|(bush, _)| {
            let id = TaskId::of(TaskType::EatBerries, &[&agent.id, &bush.id]);
            let task = Task::new(id.clone(), TaskType::EatBerries, agent.id, horizon(ctx))
                .at(bush.position)
                .targeting(Target::Entity(bush.id));
            (id, task)
        })
        .collect()
}

fn score_eat_berries(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let need = appetite(agent, task, ctx)?;
    ctx.world.bushes.get(task.target_entity()?).filter(|b| b.has_berries())?;
    Some(blend(0.3, 0.5, need, closeness(agent, task, ctx)?))
}

fn execute_eat_berries(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(bush_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if is_sated(agent, ctx) {
        agent.intent.go_idle(ctx.now());
        return TaskResult::Success;
    }
    let Some(bush) = ctx.world.bushes.get(bush_id).filter(|b| b.has_berries()) else {
        return TaskResult::Failure;
    };
    let action = if agent.is_human() { ActiveAction::Eating } else { ActiveAction::Grazing };
    if approach(agent, action, Target::Entity(bush_id), bush.position, ctx.config.movement.reach, ctx) {
        ctx.queue(WorldEffect::EatBerries {
            agent: agent.id,
            bush: bush_id,
            amount: ctx.config.eating.bite,
        });
    }
    TaskResult::Running
}

pub const EAT_BERRIES: TaskDefinition = TaskDefinition {
    task_type: TaskType::EatBerries,
    producer: produce_eat_berries,
    scorer: score_eat_berries,
    executor: execute_eat_berries,
};

// eat_stored_food

fn produce_eat_stored(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let Some(tribe) = agent.tribe() else {
        return TaskMap::new();
    };
    ctx.world
        .tribe_buildings(tribe, BuildingKind::Storage)
        .into_iter()
        .filter(|storage| storage.stored_food >= ctx.config.eating.bite)
        .map(|storage| {
            let id = TaskId::of(TaskType::EatStoredFood, &[&agent.id, &storage.id]);
            let task = Task::new(id.clone(), TaskType::EatStoredFood, agent.id, horizon(ctx))
                .at(storage.position)
                .targeting(Target::Entity(storage.id));
            (id, task)
        })
        .collect()
}

fn score_eat_stored(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let need = appetite(agent, task, ctx)?;
    ctx.world
        .buildings
        .get(task.target_entity()?)
        .filter(|b| b.stored_food >= ctx.config.eating.bite)?;
    Some(blend(0.25, 0.5, need, closeness(agent, task, ctx)?))
}

fn execute_eat_stored(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(building_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if is_sated(agent, ctx) {
        agent.intent.go_idle(ctx.now());
        return TaskResult::Success;
    }
    let bite = ctx.config.eating.bite;
    let Some(storage) = ctx.world.buildings.get(building_id).filter(|b| b.stored_food >= bite) else {
        return TaskResult::Failure;
    };
    if approach(agent, ActiveAction::Eating, Target::Entity(building_id), storage.position, ctx.config.movement.reach, ctx) {
        ctx.queue(WorldEffect::EatStored {
            agent: agent.id,
            building: building_id,
            amount: bite,
        });
    }
    TaskResult::Running
}

pub const EAT_STORED_FOOD: TaskDefinition = TaskDefinition {
    task_type: TaskType::EatStoredFood,
    producer: produce_eat_stored,
    scorer: score_eat_stored,
    executor: execute_eat_stored,
};

// eat_corpse

fn produce_eat_corpse(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if matches!(agent.kind, AgentKind::Prey) {
        return TaskMap::new();
    }
    corpses_near(agent, ctx)
        .into_iter()
        .map(|(corpse, _)| {
            let id = TaskId::of(TaskType::EatCorpse, &[&agent.id, &corpse.id]);
            let task = Task::new(id.clone(), TaskType::EatCorpse, agent.id, horizon(ctx))
                .at(corpse.position)
                .targeting(Target::Entity(corpse.id));
            (id, task)
        })
        .collect()
}

fn score_eat_corpse(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let need = appetite(agent, task, ctx)?;
    ctx.world.corpses.get(task.target_entity()?).filter(|c| c.food > 0.0)?;
    let closeness = closeness(agent, task, ctx)?;
    match agent.kind {
        // Scavenging beats hunting for a predator
        AgentKind::Predator => Some(blend(0.4, 0.45, need, closeness)),
        AgentKind::TribeMember { .. } => Some(blend(0.2, 0.45, need, closeness)),
        AgentKind::Prey => None,
    }
}

fn execute_eat_corpse(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(corpse_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if is_sated(agent, ctx) {
        agent.intent.go_idle(ctx.now());
        return TaskResult::Success;
    }
    let Some(corpse) = ctx.world.corpses.get(corpse_id).filter(|c| c.food > 0.0) else {
        return TaskResult::Failure;
    };
    if approach(agent, ActiveAction::Eating, Target::Entity(corpse_id), corpse.position, ctx.config.movement.reach, ctx) {
        ctx.queue(WorldEffect::EatCorpse {
            agent: agent.id,
            corpse: corpse_id,
            amount: ctx.config.eating.bite,
        });
    }
    TaskResult::Running
}

pub const EAT_CORPSE: TaskDefinition = TaskDefinition {
    task_type: TaskType::EatCorpse,
    producer: produce_eat_corpse,
    scorer: score_eat_corpse,
    executor: execute_eat_corpse,
};

// gather_berries

fn storage_has_room(agent: &Agent, ctx: &AiContext<'_>) -> bool {
    agent.tribe().is_some_and(|tribe| {
        ctx.world
            .tribe_buildings(tribe, BuildingKind::Storage)
            .iter()
            .any(|storage| storage.free_capacity() > 0.0)
    })
}

fn produce_gather(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    if !agent.is_adult || agent.carried_food >= ctx.config.eating.carry_capacity || !storage_has_room(agent, ctx) {
        return TaskMap::new();
    }
    bushes_near(agent, ctx)
        .into_iter()
        .map(|(bush, _)| {
            let id = TaskId::of(TaskType::GatherBerries, &[&agent.id, &bush.id]);
            let task = Task::new(id.clone(), TaskType::GatherBerries, agent.id, horizon(ctx))
                .at(bush.position)
                .targeting(Target::Entity(bush.id));
            (id, task)
        })
        .collect()
}

fn score_gather(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    if agent.hunger >= ctx.config.eating.hungry_threshold || agent.carried_food >= ctx.config.eating.carry_capacity {
        return None;
    }
    ctx.world.bushes.get(task.target_entity()?).filter(|b| b.has_berries())?;
    let fill = agent
        .tribe()
        .and_then(|tribe| ctx.world.tribe(tribe))
        .map(|summary| summary.storage_fill())
        .unwrap_or(1.0);
    if fill >= 1.0 {
        return None;
    }
    let base = if agent.role() == Some(crate::components::Role::Gatherer) { 0.45 } else { 0.2 };
    Some(blend(base, 0.2, 1.0 - fill, closeness(agent, task, ctx)?))
}

fn execute_gather(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(bush_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if agent.carried_food >= ctx.config.eating.carry_capacity {
        return TaskResult::Success;
    }
    let Some(bush) = ctx.world.bushes.get(bush_id).filter(|b| b.has_berries()) else {
        return TaskResult::Failure;
    };
    if approach(agent, ActiveAction::Gathering, Target::Entity(bush_id), bush.position, ctx.config.movement.reach, ctx) {
        ctx.queue(WorldEffect::Harvest {
            agent: agent.id,
            bush: bush_id,
            amount: ctx.config.eating.bite,
        });
    }
    TaskResult::Running
}

pub const GATHER_BERRIES: TaskDefinition = TaskDefinition {
    task_type: TaskType::GatherBerries,
    producer: produce_gather,
    scorer: score_gather,
    executor: execute_gather,
};

// store_food

fn produce_store(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let Some(tribe) = agent.tribe() else {
        return TaskMap::new();
    };
    if agent.carried_food <= 0.0 {
        return TaskMap::new();
    }
    ctx.world
        .tribe_buildings(tribe, BuildingKind::Storage)
        .into_iter()
        .filter(|storage| storage.free_capacity() > 0.0)
        .map(|storage| {
            let id = TaskId::of(TaskType::StoreFood, &[&agent.id, &storage.id]);
            let task = Task::new(id.clone(), TaskType::StoreFood, agent.id, horizon(ctx))
                .at(storage.position)
                .targeting(Target::Entity(storage.id));
            (id, task)
        })
        .collect()
}

fn score_store(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    if agent.carried_food <= 0.0 {
        return None;
    }
    ctx.world
        .buildings
        .get(task.target_entity()?)
        .filter(|b| b.free_capacity() > 0.0)?;
    let load = agent.carried_food / ctx.config.eating.carry_capacity.max(f32::EPSILON);
    Some(blend(0.3, 0.4, load, closeness(agent, task, ctx)?))
}

fn execute_store(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    let Some(building_id) = task.target_entity() else {
        return TaskResult::Failure;
    };
    if agent.carried_food <= 0.0 {
        agent.intent.go_idle(ctx.now());
        return TaskResult::Success;
    }
    let Some(storage) = ctx.world.buildings.get(building_id).filter(|b| b.free_capacity() > 0.0) else {
        return TaskResult::Failure;
    };
    if approach(agent, ActiveAction::Storing, Target::Entity(building_id), storage.position, ctx.config.movement.reach, ctx) {
        ctx.queue(WorldEffect::Deposit {
            agent: agent.id,
            building: building_id,
        });
    }
    TaskResult::Running
}

pub const STORE_FOOD: TaskDefinition = TaskDefinition {
    task_type: TaskType::StoreFood,
    producer: produce_store,
    scorer: score_store,
    executor: execute_store,
};

// graze

fn produce_graze(agent: &Agent, ctx: &AiContext<'_>) -> TaskMap {
    let mut tasks: TaskMap = bushes_near(agent, ctx)
        .into_iter()
        .map(|(bush, _)| {
            let id = TaskId::of(TaskType::Graze, &[&agent.id, &bush.id]);
            let task = Task::new(id.clone(), TaskType::Graze, agent.id, horizon(ctx))
                .at(bush.position)
                .targeting(Target::Entity(bush.id));
            (id, task)
        })
        .collect();

    let patch = ctx.soil.cell_center(agent.position);
    if ctx.soil.fertility_at(patch) >= ctx.config.eating.bite {
        let id = TaskId::of(TaskType::Graze, &[&agent.id, &"soil"]);
        let task = Task::new(id.clone(), TaskType::Graze, agent.id, horizon(ctx))
            .at(patch)
            .targeting(Target::Position(patch));
        tasks.insert(id, task);
    }
    tasks
}

fn score_graze(agent: &Agent, task: &Task, ctx: &AiContext<'_>) -> Option<f32> {
    let need = appetite(agent, task, ctx)?;
    match task.target? {
        Target::Entity(bush) => {
            ctx.world.bushes.get(bush).filter(|b| b.has_berries())?;
            Some(blend(0.2, 0.6, need, closeness(agent, task, ctx)?))
        }
        Target::Position(patch) => {
            let fertility = ctx.soil.fertility_at(patch);
            if fertility < ctx.config.eating.bite {
                return None;
            }
            let richness = fertility / ctx.config.world.soil_max_fertility.max(f32::EPSILON);
            Some(blend(0.15, 0.5, need, closeness(agent, task, ctx)?) * richness)
        }
    }
}

fn execute_graze(task: &Task, agent: &mut Agent, ctx: &mut AiContext<'_>, _bb: &mut Blackboard) -> TaskResult {
    if is_sated(agent, ctx) {
        agent.intent.go_idle(ctx.now());
        return TaskResult::Success;
    }
    let bite = ctx.config.eating.bite;
    let reach = ctx.config.movement.reach;
    match task.target {
        Some(Target::Entity(bush_id)) => {
            let Some(bush) = ctx.world.bushes.get(bush_id).filter(|b| b.has_berries()) else {
                return TaskResult::Failure;
            };
            if approach(agent, ActiveAction::Grazing, Target::Entity(bush_id), bush.position, reach, ctx) {
                ctx.queue(WorldEffect::EatBerries {
                    agent: agent.id,
                    bush: bush_id,
                    amount: bite,
                });
            }
            TaskResult::Running
        }
        Some(Target::Position(patch)) => {
            if ctx.soil.fertility_at(patch) < bite {
                return TaskResult::Failure;
            }
            if approach(agent, ActiveAction::Grazing, Target::Position(patch), patch, reach, ctx) {
                ctx.queue(WorldEffect::Graze {
                    agent: agent.id,
                    position: patch,
                    amount: bite,
                });
            }
            TaskResult::Running
        }
        None => TaskResult::Failure,
    }
}

pub const GRAZE: TaskDefinition = TaskDefinition {
    task_type: TaskType::Graze,
    producer: produce_graze,
    scorer: score_graze,
    executor: execute_graze,
};
