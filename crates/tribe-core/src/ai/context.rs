//! Per-evaluation context handed to every node, producer, scorer and executor.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tribe_events::{EventOutcome, EventType, GameTime, TickStamp, TraceEntry};

use crate::components::{Agent, BerryBush, Building, Corpse, Vec2, WorldBounds};
use crate::config::AiConfig;
use crate::events::PendingEvents;
use crate::query::{SoilMap, TerritoryGrid, WorldSnapshot};

use super::behavior_tree::NodeOutcome;
use super::claims::ClaimLedger;
use super::effects::{PendingEffects, WorldEffect};

/// Everything a decision may read, plus the few shared things it may write:
/// the territory grid (painted immediately), the claim ledger, and the effect
/// and event queues.
pub struct AiContext<'a> {
    pub world: &'a WorldSnapshot,
    pub territory: &'a mut TerritoryGrid,
    pub soil: &'a SoilMap,
    pub config: &'a AiConfig,
    pub stamp: TickStamp,
    pub rng: &'a mut SmallRng,
    pub claims: &'a mut ClaimLedger,
    pub effects: &'a mut PendingEffects,
    pub events: &'a mut PendingEvents,
    /// Set only for the agent being traced
    pub trace: Option<&'a mut Vec<TraceEntry>>,
}

impl<'a> AiContext<'a> {
    pub fn now(&self) -> GameTime {
        self.stamp.time
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.world.bounds
    }

    /// Wrapped distance.
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.world.bounds.distance(a, b)
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Appends a node evaluation to the trace, if one is being collected.
    pub fn record(&mut self, depth: usize, name: &'static str, outcome: &NodeOutcome) {
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.push(TraceEntry {
                depth,
                name: name.to_string(),
                status: outcome.status.into(),
                reason: outcome.reason.as_ref().map(|r| r.to_string()),
            });
        }
    }

    pub fn emit(&mut self, event_type: EventType, agent: &Agent, outcome: EventOutcome) {
        self.events.record(self.stamp, event_type, agent, outcome);
    }

    pub fn queue(&mut self, effect: WorldEffect) {
        self.effects.push(effect);
    }
}

/// Owns everything an `AiContext` borrows, so decisions can be driven
/// outside the ECS schedule.
pub struct AiSandbox {
    pub world: WorldSnapshot,
    pub territory: TerritoryGrid,
    pub soil: SoilMap,
    pub config: AiConfig,
    pub stamp: TickStamp,
    pub rng: SmallRng,
    pub claims: ClaimLedger,
    pub effects: PendingEffects,
    pub events: PendingEvents,
    pub trace: Vec<TraceEntry>,
    tracing: bool,
}

impl AiSandbox {
    pub fn new(config: AiConfig) -> Self {
        let bounds = WorldBounds::new(config.world.width, config.world.height);
        Self {
            world: WorldSnapshot::empty(bounds),
            territory: TerritoryGrid::new(&bounds, config.world.territory_cell_size),
            soil: SoilMap::new(&bounds, config.world.soil_cell_size, config.world.soil_max_fertility),
            config,
            stamp: TickStamp::start(),
            rng: SmallRng::seed_from_u64(7),
            claims: ClaimLedger::new(),
            effects: PendingEffects::new(),
            events: PendingEvents::new(),
            trace: Vec::new(),
            tracing: false,
        }
    }

    /// Collects a trace on every evaluation.
    pub fn with_trace(mut self) -> Self {
        self.tracing = true;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Rebuilds the snapshot from the given entities at the current time.
    pub fn populate(
        &mut self,
        agents: Vec<Agent>,
        bushes: Vec<BerryBush>,
        corpses: Vec<Corpse>,
        buildings: Vec<Building>,
    ) {
        self.world = WorldSnapshot::build(self.world.bounds, self.stamp.time, agents, bushes, corpses, buildings);
    }

    pub fn set_time(&mut self, time: GameTime) {
        self.stamp.time = time;
        self.world.now = time;
    }

    pub fn context(&mut self) -> AiContext<'_> {
        AiContext {
            world: &self.world,
            territory: &mut self.territory,
            soil: &self.soil,
            config: &self.config,
            stamp: self.stamp,
            rng: &mut self.rng,
            claims: &mut self.claims,
            effects: &mut self.effects,
            events: &mut self.events,
            trace: if self.tracing { Some(&mut self.trace) } else { None },
        }
    }
}

impl Default for AiSandbox {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::human;
    use tribe_events::TraceStatus;

    #[test]
    fn test_record_only_when_tracing() {
        let mut sandbox = AiSandbox::default();
        sandbox.context().record(0, "Root", &NodeOutcome::success());
        assert!(sandbox.trace.is_empty());

        let mut sandbox = AiSandbox::default().with_trace();
        sandbox
            .context()
            .record(1, "Flee", &NodeOutcome::failure().because("no aggressor"));
        assert_eq!(sandbox.trace.len(), 1);
        assert_eq!(sandbox.trace[0].status, TraceStatus::Failure);
        assert_eq!(sandbox.trace[0].reason.as_deref(), Some("no aggressor"));
    }

    #[test]
    fn test_populate_uses_sandbox_time() {
        let mut sandbox = AiSandbox::default();
        sandbox.set_time(GameTime::from_hours(3.0));
        sandbox.populate(vec![human(1, 10.0, 10.0)], vec![], vec![], vec![]);
        assert_eq!(sandbox.world.now, GameTime::from_hours(3.0));
        assert!(sandbox.world.humans.contains(crate::components::EntityId(1)));
        assert_eq!(sandbox.context().now(), GameTime::from_hours(3.0));
    }
}
