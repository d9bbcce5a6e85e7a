//! Simulation World - main orchestrator
//!
//! Owns the grid store, the tick counter and the seeded random source, and
//! runs the ordered tick pipeline: treatments, plants, insects, environment,
//! publish.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::components::{DeviceId, TreatmentType};
use crate::config::{GardenConfig, SimulationConfig, TickRules};
use crate::error::Result;
use crate::garden::{self, GardenSummary};
use crate::publisher::{NullPublisher, StatePublisher};
use crate::snapshot::WorldStateSnapshot;
use crate::store::{GridStore, HecsGridStore};
use crate::systems::{self, GrowthResult, InsectResult, TreatmentResult};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub treatment: TreatmentResult,
    pub growth: GrowthResult,
    pub insects: InsectResult,
    pub evaporated: usize,
}

pub struct SimulationWorld {
    store: Box<dyn GridStore>,
    tick: u64,
    running: bool,
    rng: StdRng,
    rules: TickRules,
    publisher: Arc<dyn StatePublisher>,
}

impl SimulationWorld {
    /// Empty in-memory garden with default rules and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_store(Box::new(HecsGridStore::new()), TickRules::default(), StdRng::from_entropy())
    }

    pub fn with_store(store: Box<dyn GridStore>, rules: TickRules, rng: StdRng) -> Self {
        Self {
            store,
            tick: 0,
            running: false,
            rng,
            rules,
            publisher: Arc::new(NullPublisher),
        }
    }

    /// Empty garden using the rules and seed of `config`.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_store(Box::new(HecsGridStore::new()), config.rules.clone(), rng)
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn StatePublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn set_publisher(&mut self, publisher: Arc<dyn StatePublisher>) {
        self.publisher = publisher;
    }

    pub fn store(&self) -> &dyn GridStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn GridStore {
        self.store.as_mut()
    }

    pub fn rules(&self) -> &TickRules {
        &self.rules
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mirrors the clock state into published snapshots.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Replace the whole store content with a freshly generated garden.
    pub fn initialize_garden(&mut self, garden: &GardenConfig) -> Result<GardenSummary> {
        garden::initialize_default_garden(self.store.as_mut(), garden, &mut self.rng)
    }

    /// Advance one tick.
    ///
    /// The counter moves first, then each phase runs to completion. A failing
    /// phase aborts the rest of the tick; writes made before it are kept.
    pub fn execute_tick(&mut self) -> Result<TickReport> {
        self.tick += 1;
        let tick = self.tick;
        let store = self.store.as_mut();

        debug!(tick, "phase: treatments");
        let treatment = systems::treatment_system(store, tick, &self.rules, &mut self.rng)?;

        debug!(tick, "phase: plants");
        let growth = systems::plant_growth_system(store, &mut self.rng)?;

        debug!(tick, "phase: insects");
        let insects = systems::insect_system(store, &self.rules, &mut self.rng)?;

        debug!(tick, "phase: environment");
        let evaporated = systems::evaporation_system(store, &self.rules)?;

        debug!(tick, "phase: publish");
        let snapshot = self.snapshot();
        self.publisher.publish(&snapshot);

        let report = TickReport {
            tick,
            treatment,
            growth,
            insects,
            evaporated,
        };
        debug!(
            tick,
            programs = report.treatment.programs_applied,
            offshoots = report.growth.offshoots,
            deaths = report.insects.deaths,
            births = report.insects.births,
            moves = report.insects.moves,
            "tick complete"
        );
        Ok(report)
    }

    pub fn snapshot(&self) -> WorldStateSnapshot {
        WorldStateSnapshot::capture(self.store.as_ref(), self.tick, self.running)
    }

    /// Zero the tick counter without touching the garden.
    pub fn reset_counter(&mut self) {
        self.tick = 0;
        self.running = false;
    }

    /// Zero the counter and remove plants, insects, devices and programs.
    /// Plots and their moisture stay as they are.
    pub fn reset(&mut self) {
        self.reset_counter();
        self.store.clear_dependents();
    }

    /// Apply a treatment around `device` right away, with the manual
    /// strengths. Returns the number of plots reached.
    pub fn apply_manual_treatment(
        &mut self,
        device: DeviceId,
        treatment: TreatmentType,
    ) -> Result<usize> {
        systems::apply_manual_treatment(
            self.store.as_mut(),
            device,
            treatment,
            &self.rules.manual,
            &mut self.rng,
        )
    }

    pub fn entity_count(&self) -> usize {
        let contents = self.store.contents();
        contents.plots.len()
            + contents.plants.len()
            + contents.insects.len()
            + contents.devices.len()
            + contents.programs.len()
    }
}

impl Default for SimulationWorld {
    fn default() -> Self {
        Self::new()
    }
}
