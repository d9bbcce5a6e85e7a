use serde::{Deserialize, Serialize};
use simulation::{
    Device, DeviceId, NewProgram, PlotId, Program, ProgramId, Result, SimulationError,
    TreatmentType, DEFAULT_RADIUS,
};

use crate::state::AppState;

/// A device together with every program it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceData {
    #[serde(flatten)]
    pub device: Device,
    pub x: i32,
    pub y: i32,
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgram {
    pub start_tick: u64,
    pub duration: u64,
    /// WATER / INSECTICIDE / FERTILIZER (EAU and ENGRAIS are accepted too).
    pub treatment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramUpdate {
    pub start_tick: Option<u64>,
    pub duration: Option<u64>,
    pub treatment: Option<String>,
}

fn device_data(state: &AppState, device: Device) -> Result<DeviceData> {
    let world = state.clock.world();
    let plot = world.store().plot(device.plot)?;
    let programs = world.store().find_programs_by_device(device.id);
    Ok(DeviceData {
        device,
        x: plot.x,
        y: plot.y,
        programs,
    })
}

pub fn list_devices(state: &AppState) -> Result<Vec<DeviceData>> {
    let devices = state.clock.world().store().find_all_devices();
    devices.into_iter().map(|d| device_data(state, d)).collect()
}

pub fn get_device(state: &AppState, id: DeviceId) -> Result<DeviceData> {
    let device = state.clock.world().store().device(id)?;
    device_data(state, device)
}

/// A plot carries at most one device.
pub fn create_device(state: &AppState, plot: PlotId, radius: Option<u32>) -> Result<Device> {
    state
        .clock
        .world()
        .store_mut()
        .insert_device(plot, radius.unwrap_or(DEFAULT_RADIUS))
}

pub fn update_radius(state: &AppState, id: DeviceId, radius: u32) -> Result<Device> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    let mut device = store.device(id)?;
    device.radius = radius;
    store.save_device(&device)?;
    Ok(device)
}

/// Removes the device and its programs.
pub fn delete_device(state: &AppState, id: DeviceId) -> Result<()> {
    state.clock.world().store_mut().delete_device(id)
}

pub fn programs_of(state: &AppState, device: DeviceId) -> Result<Vec<Program>> {
    let world = state.clock.world();
    world.store().device(device)?;
    Ok(world.store().find_programs_by_device(device))
}

pub fn add_program(state: &AppState, device: DeviceId, request: CreateProgram) -> Result<Program> {
    let treatment: TreatmentType = request.treatment.parse()?;
    let mut world = state.clock.world();
    let store = world.store_mut();
    store.device(device)?;
    store.insert_program(NewProgram {
        device,
        start_tick: request.start_tick,
        duration: request.duration,
        treatment,
    })
}

pub fn update_program(state: &AppState, id: ProgramId, update: ProgramUpdate) -> Result<Program> {
    let treatment = update
        .treatment
        .as_deref()
        .map(str::parse::<TreatmentType>)
        .transpose()?;

    let mut world = state.clock.world();
    let store = world.store_mut();
    let mut program = store.program(id)?;
    if let Some(start_tick) = update.start_tick {
        program.start_tick = start_tick;
    }
    if let Some(duration) = update.duration {
        program.duration = duration;
    }
    if let Some(treatment) = treatment {
        program.treatment = treatment;
    }
    store.save_program(&program)?;
    Ok(program)
}

/// When `device` is given, the program must belong to it.
pub fn delete_program(state: &AppState, device: Option<DeviceId>, id: ProgramId) -> Result<()> {
    let mut world = state.clock.world();
    let store = world.store_mut();
    let program = store.program(id)?;
    if let Some(device) = device {
        if program.device != device {
            return Err(SimulationError::InvalidState(format!(
                "program {id} belongs to device {}, not {device}",
                program.device
            )));
        }
    }
    store.delete_program(id)
}

/// Apply a treatment around the device now, with the manual strengths.
/// Returns the number of plots reached.
pub fn apply_treatment(state: &AppState, device: DeviceId, treatment: &str) -> Result<usize> {
    let treatment: TreatmentType = treatment.parse()?;
    state.clock.world().apply_manual_treatment(device, treatment)
}
