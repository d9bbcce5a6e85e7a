use std::sync::Arc;

use serde::Serialize;
use simulation::{
    ChannelPublisher, ClockState, FanoutPublisher, LogPublisher, SimulationClock,
    SimulationConfig, SimulationWorld,
};

pub const UPDATES_TOPIC: &str = "potager-updates";
pub const SIMULATION_TOPIC: &str = "simulation";

/// Application state shared by every command.
pub struct AppState {
    pub clock: SimulationClock,
    pub config: SimulationConfig,
    pub updates: Arc<ChannelPublisher>,
    pub simulation: Arc<ChannelPublisher>,
}

impl AppState {
    /// Empty garden wired to both publication topics and the log.
    pub fn new(config: SimulationConfig) -> Self {
        let updates = Arc::new(ChannelPublisher::new(UPDATES_TOPIC));
        let simulation = Arc::new(ChannelPublisher::new(SIMULATION_TOPIC));
        let fanout = FanoutPublisher::new()
            .with(updates.clone())
            .with(simulation.clone())
            .with(Arc::new(LogPublisher));

        let world = SimulationWorld::from_config(&config).with_publisher(Arc::new(fanout));
        Self {
            clock: SimulationClock::new(world),
            config,
            updates,
            simulation,
        }
    }
}

// -- Serializable types returned by commands --

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SimulationStatus {
    pub tick: u64,
    pub state: ClockState,
    pub period_ms: Option<u64>,
}

impl SimulationStatus {
    pub fn of(clock: &SimulationClock) -> Self {
        Self {
            tick: clock.current_tick(),
            state: clock.state(),
            period_ms: clock.period().map(|p| p.as_millis() as u64),
        }
    }
}
