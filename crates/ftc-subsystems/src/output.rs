//! Launcher: flywheel, hood and artifact feeder.
//!
//! The flywheel runs closed-loop on the motor controller's velocity PIDF, so
//! this module only converts RPM to encoder ticks per second and back.  The
//! feeder is a servo that swings into the flywheel for a fixed duration and
//! swings back; it is a timed state machine advanced by [`Output::update`]
//! each loop tick, so a feed never blocks the control loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use ftc_hal::motor::DcMotorEx;
use ftc_hal::registry::{DeviceNames, HardwareMap};
use ftc_hal::servo::Servo;
use ftc_types::{HardwareError, PidfCoefficients, RunMode};

/// Tunable launcher constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    /// Encoder ticks per motor revolution (goBILDA 5203 6000 rpm: 28).
    pub ticks_per_revolution: f64,
    pub gear_ratio: f64,
    /// Flywheel counts as "at speed" when within this many RPM of target.
    pub rpm_tolerance: f64,
    pub feed_position: f64,
    pub reset_position: f64,
    pub feed_duration: Duration,
    pub pidf: PidfCoefficients,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            ticks_per_revolution: 28.0,
            gear_ratio: 1.0,
            rpm_tolerance: 20.0,
            feed_position: 0.5,
            reset_position: 0.0,
            feed_duration: Duration::from_millis(250),
            pidf: PidfCoefficients::default(),
        }
    }
}

/// Feeder servo state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederState {
    Idle,
    Feeding { since: Instant },
}

/// The launcher subsystem.
pub struct Output {
    flywheel: Arc<dyn DcMotorEx>,
    hood: Arc<dyn Servo>,
    transfer: Arc<dyn Servo>,
    settings: OutputSettings,
    target_rpm: f64,
    current_rpm: f64,
    feeder: FeederState,
}

impl Output {
    /// Look up the launcher devices, reset the flywheel encoder, switch it to
    /// closed-loop velocity control and write the PIDF gains.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] for a missing device, or the
    /// driver's error if a configuration write fails.
    pub fn new(
        hardware_map: &HardwareMap,
        names: &DeviceNames,
        settings: OutputSettings,
    ) -> Result<Self, HardwareError> {
        let output = Self {
            flywheel: hardware_map.motor_ex(&names.flywheel)?,
            hood: hardware_map.servo(&names.hood_servo)?,
            transfer: hardware_map.servo(&names.transfer_servo)?,
            settings,
            target_rpm: 0.0,
            current_rpm: 0.0,
            feeder: FeederState::Idle,
        };

        output.flywheel.set_mode(RunMode::StopAndResetEncoder)?;
        output.flywheel.set_mode(RunMode::RunUsingEncoder)?;
        output
            .flywheel
            .set_pidf_coefficients(RunMode::RunUsingEncoder, settings.pidf)?;

        Ok(output)
    }

    fn ticks_per_output_rev(&self) -> f64 {
        self.settings.ticks_per_revolution * self.settings.gear_ratio
    }

    /// Command the flywheel to `target_rpm`, sample its speed, and report
    /// whether it is within tolerance of the target.
    ///
    /// # Errors
    ///
    /// Propagates the velocity write failure.
    pub fn set_target_rpm(&mut self, target_rpm: f64) -> Result<bool, HardwareError> {
        self.target_rpm = target_rpm;

        let ticks_per_second = target_rpm * self.ticks_per_output_rev() / 60.0;
        self.flywheel.set_velocity(ticks_per_second)?;

        self.current_rpm = self.flywheel.velocity() * 60.0 / self.ticks_per_output_rev();
        Ok(self.is_at_target())
    }

    /// Whether the last sampled speed was within tolerance of the target.
    pub fn is_at_target(&self) -> bool {
        (self.current_rpm - self.target_rpm).abs() < self.settings.rpm_tolerance
    }

    /// Swing the feeder into the flywheel.  Ignored while a feed is already
    /// in progress.
    ///
    /// # Errors
    ///
    /// Propagates the servo write failure; the feeder stays idle.
    pub fn feed_artifact(&mut self, now: Instant) -> Result<(), HardwareError> {
        if self.is_feeding() {
            return Ok(());
        }
        self.transfer.set_position(self.settings.feed_position)?;
        self.feeder = FeederState::Feeding { since: now };
        debug!("feeder engaged");
        Ok(())
    }

    /// Advance the feeder: once the feed duration has elapsed the servo is
    /// returned to its reset position.
    ///
    /// # Errors
    ///
    /// Propagates the servo write failure; the feeder stays in `Feeding` and
    /// the reset is retried on the next call.
    pub fn update(&mut self, now: Instant) -> Result<(), HardwareError> {
        if let FeederState::Feeding { since } = self.feeder
            && now.saturating_duration_since(since) >= self.settings.feed_duration
        {
            self.transfer.set_position(self.settings.reset_position)?;
            self.feeder = FeederState::Idle;
            debug!("feeder reset");
        }
        Ok(())
    }

    pub fn is_feeding(&self) -> bool {
        matches!(self.feeder, FeederState::Feeding { .. })
    }

    pub fn feeder_state(&self) -> FeederState {
        self.feeder
    }

    /// Spin the flywheel down and pull the feeder back.  The sampled speed
    /// reads zero until the next [`set_target_rpm`][Self::set_target_rpm].
    ///
    /// # Errors
    ///
    /// Propagates device write failures.
    pub fn stop(&mut self) -> Result<(), HardwareError> {
        self.target_rpm = 0.0;
        self.current_rpm = 0.0;
        self.flywheel.set_velocity(0.0)?;
        self.transfer.set_position(self.settings.reset_position)?;
        self.feeder = FeederState::Idle;
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates the servo write failure.
    pub fn set_hood_position(&mut self, position: f64) -> Result<(), HardwareError> {
        self.hood.set_position(position)
    }

    pub fn hood_position(&self) -> f64 {
        self.hood.position()
    }

    pub fn transfer_position(&self) -> f64 {
        self.transfer.position()
    }

    pub fn target_rpm(&self) -> f64 {
        self.target_rpm
    }

    pub fn current_rpm(&self) -> f64 {
        self.current_rpm
    }

    /// Gains currently loaded on the flywheel controller.
    pub fn pidf_coefficients(&self) -> PidfCoefficients {
        self.flywheel.pidf_coefficients(RunMode::RunUsingEncoder)
    }

    /// Store new gains and push them to the flywheel controller.
    ///
    /// # Errors
    ///
    /// Propagates the controller write failure; the stored gains are only
    /// updated once the write succeeds.
    pub fn set_pidf_coefficients(&mut self, p: f64, i: f64, d: f64, f: f64) -> Result<(), HardwareError> {
        let coefficients = PidfCoefficients::new(p, i, d, f);
        self.flywheel
            .set_pidf_coefficients(RunMode::RunUsingEncoder, coefficients)?;
        self.settings.pidf = coefficients;
        Ok(())
    }

    pub fn feed_duration(&self) -> Duration {
        self.settings.feed_duration
    }

    pub fn set_feed_duration(&mut self, duration: Duration) {
        self.settings.feed_duration = duration;
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }
}
