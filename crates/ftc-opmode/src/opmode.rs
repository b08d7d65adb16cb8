//! The op mode lifecycle trait.

use std::time::{Duration, Instant};

use ftc_hal::gamepad::Gamepad;
use ftc_hal::registry::HardwareMap;
use ftc_types::HardwareError;

use crate::config::RobotConfig;
use crate::telemetry::Telemetry;

/// Per-tick inputs handed to an op mode.
pub struct LoopContext<'a> {
    /// Time of this tick.
    pub now: Instant,
    /// Time since the previous tick (zero on the first).
    pub dt: Duration,
    /// Step index, counted from the first init-loop call.
    pub tick: u64,
    pub gamepad1: Gamepad,
    pub gamepad2: Gamepad,
    pub telemetry: &'a mut Telemetry,
}

/// A driver-selectable program.
///
/// The runner calls [`init`][OpMode::init] once, [`init_loop`][OpMode::init_loop]
/// while waiting for start, [`start`][OpMode::start] once, then
/// [`loop_tick`][OpMode::loop_tick] every period until stopped, and finally
/// [`stop`][OpMode::stop].
pub trait OpMode {
    fn name(&self) -> &str;

    /// Look devices up and build subsystems.
    ///
    /// # Errors
    ///
    /// Any error aborts the run before the first loop tick.
    fn init(&mut self, hardware_map: &HardwareMap, config: &RobotConfig)
    -> Result<(), HardwareError>;

    /// # Errors
    ///
    /// Errors are logged and the run continues.
    fn init_loop(&mut self, _ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Errors are logged and the run continues.
    fn start(&mut self, _ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Errors are logged and the run continues with the next tick.
    fn loop_tick(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError>;

    /// Put every actuator in a safe state.
    ///
    /// # Errors
    ///
    /// Errors are logged.
    fn stop(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}
