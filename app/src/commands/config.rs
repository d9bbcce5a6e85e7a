use serde::Serialize;
use simulation::{period_for_speed, SimulationConfig};

use crate::state::AppState;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SpeedMode {
    pub speed: u32,
    pub interval_ms: u64,
}

pub fn get_config(state: &AppState) -> SimulationConfig {
    state.config.clone()
}

/// A few preset speeds up to the configured maximum.
pub fn get_speeds(state: &AppState) -> Vec<SpeedMode> {
    [1, 2, 5, 10, 20, 50, 100]
        .into_iter()
        .filter(|speed| *speed <= state.config.runner.max_speed)
        .filter_map(|speed| {
            period_for_speed(speed).ok().map(|period| SpeedMode {
                speed,
                interval_ms: period.as_millis() as u64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::RunnerConfig;

    #[test]
    fn test_speeds_respect_maximum() {
        let state = AppState::new(SimulationConfig {
            runner: RunnerConfig { default_speed: 1, max_speed: 10 },
            ..SimulationConfig::default()
        });
        let speeds = get_speeds(&state);
        assert_eq!(speeds.last().unwrap(), &SpeedMode { speed: 10, interval_ms: 100 });
        assert_eq!(speeds[0].interval_ms, 1000);
        assert_eq!(get_config(&state).runner.max_speed, 10);
    }
}
