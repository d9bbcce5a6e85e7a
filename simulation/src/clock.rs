//! Simulation Clock - starts, stops and steps the world
//!
//! The clock owns the world behind a mutex, so the timer thread and manual
//! steps never run two ticks at once. At most one timer thread exists per
//! clock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SimulationError};
use crate::world::{SimulationWorld, TickReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Convert ticks per second into a timer period (`1000 / speed` ms, at
/// least 1 ms).
pub fn period_for_speed(speed: u32) -> Result<Duration> {
    if speed == 0 {
        return Err(SimulationError::Validation("speed must be positive".into()));
    }
    Ok(Duration::from_millis(u64::from((1000 / speed).max(1))))
}

struct TickRunner {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
    period: Duration,
}

impl TickRunner {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

pub struct SimulationClock {
    world: Arc<Mutex<SimulationWorld>>,
    runner: Mutex<Option<TickRunner>>,
}

impl SimulationClock {
    pub fn new(world: SimulationWorld) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
            runner: Mutex::new(None),
        }
    }

    /// Exclusive access to the world. Holding the guard blocks ticks.
    pub fn world(&self) -> MutexGuard<'_, SimulationWorld> {
        lock_world(&self.world)
    }

    /// A timer thread that has exited on its own counts as stopped.
    pub fn state(&self) -> ClockState {
        match self.runner().as_ref() {
            Some(runner) if runner.is_alive() => ClockState::Running,
            _ => ClockState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    /// Period of the active timer, if any.
    pub fn period(&self) -> Option<Duration> {
        self.runner().as_ref().filter(|r| r.is_alive()).map(|r| r.period)
    }

    pub fn current_tick(&self) -> u64 {
        self.world().current_tick()
    }

    /// Tick now and then every `period`. Returns `false` (and changes
    /// nothing) when the clock is already running.
    pub fn start(&self, period: Duration) -> Result<bool> {
        let mut runner = self.runner();
        if let Some(active) = runner.as_ref() {
            if active.is_alive() {
                warn!("simulation clock already running");
                return Ok(false);
            }
            if let Some(dead) = runner.take() {
                let _ = dead.handle.join();
                warn!("previous clock thread had exited, starting a new one");
            }
        }
        if period.is_zero() {
            return Err(SimulationError::Validation("tick period must be positive".into()));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let world = Arc::clone(&self.world);
        self.world().set_running(true);
        let spawned = thread::Builder::new()
            .name("potager-clock".into())
            .spawn(move || {
                let mut next = Instant::now();
                loop {
                    run_scheduled_tick(&world);

                    next += period;
                    let now = Instant::now();
                    if next < now {
                        // overran the period; the missed slots are not replayed
                        next = now;
                    }
                    match stop_rx.recv_timeout(next - now) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("clock thread exited");
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.world().set_running(false);
                return Err(err.into());
            }
        };

        *runner = Some(TickRunner { stop_tx, handle, period });
        info!(period_ms = period.as_millis() as u64, "simulation started");
        Ok(true)
    }

    pub fn start_with_speed(&self, speed: u32) -> Result<bool> {
        self.start(period_for_speed(speed)?)
    }

    /// Cancel the timer. A tick already in flight finishes first. Returns
    /// `false` when the clock was not running.
    pub fn stop(&self) -> bool {
        let Some(runner) = self.runner().take() else {
            debug!("simulation clock already stopped");
            return false;
        };
        let _ = runner.stop_tx.send(());
        if runner.handle.join().is_err() {
            error!("clock thread panicked");
        }
        self.world().set_running(false);
        info!("simulation stopped");
        true
    }

    /// Run exactly one tick on the calling thread, whatever the clock state.
    pub fn step(&self) -> Result<TickReport> {
        self.world().execute_tick()
    }

    /// Stop the timer and zero the tick counter. Entities are left alone.
    pub fn reset_counter(&self) {
        self.stop();
        self.world().reset_counter();
    }

    /// Stop, zero the counter and clear every plant, insect, device and
    /// program. Plots are kept.
    pub fn reset(&self) {
        self.stop();
        self.world().reset();
        info!("simulation reset");
    }

    fn runner(&self) -> MutexGuard<'_, Option<TickRunner>> {
        self.runner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_world(world: &Mutex<SimulationWorld>) -> MutexGuard<'_, SimulationWorld> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A failed or panicking scheduled tick is logged and dropped; the schedule
/// goes on.
fn run_scheduled_tick(world: &Mutex<SimulationWorld>) {
    let mut world = lock_world(world);
    match panic::catch_unwind(AssertUnwindSafe(|| world.execute_tick())) {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => error!(tick = world.current_tick(), error = %err, "tick abandoned"),
        Err(_) => error!(tick = world.current_tick(), "tick panicked, abandoned"),
    }
}
