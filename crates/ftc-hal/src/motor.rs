//! Motor traits.
//!
//! [`DcMotor`] is the open-loop surface (power and direction) used by the
//! drivetrain.  [`DcMotorEx`] adds the encoder-backed velocity loop used by
//! the flywheel.  Handles are shared between the
//! [`HardwareMap`][crate::registry::HardwareMap] and the subsystems, so every
//! method takes `&self` and drivers keep their state behind interior
//! mutability.

use ftc_types::{Direction, HardwareError, PidfCoefficients, RunMode};

/// A DC motor driven by power in `[-1.0, 1.0]`.
pub trait DcMotor: Send + Sync {
    /// Set which way positive power spins the shaft.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the controller rejects the
    /// write.
    fn set_direction(&self, direction: Direction) -> Result<(), HardwareError>;

    fn direction(&self) -> Direction;

    /// Command motor power.  Values outside `[-1.0, 1.0]` are clipped by the
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the controller rejects the
    /// write.
    fn set_power(&self, power: f64) -> Result<(), HardwareError>;

    /// Most recently commanded power.
    fn power(&self) -> f64;
}

/// A DC motor with encoder feedback and an on-controller PIDF velocity loop.
pub trait DcMotorEx: DcMotor {
    /// Switch the controller's run mode.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the controller rejects the
    /// write.
    fn set_mode(&self, mode: RunMode) -> Result<(), HardwareError>;

    fn mode(&self) -> RunMode;

    /// Command a target velocity in encoder ticks per second.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the controller rejects the
    /// write.
    fn set_velocity(&self, ticks_per_second: f64) -> Result<(), HardwareError>;

    /// Measured velocity in encoder ticks per second.
    fn velocity(&self) -> f64;

    /// Write the PIDF gains used by `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the controller rejects the
    /// write.
    fn set_pidf_coefficients(
        &self,
        mode: RunMode,
        coefficients: PidfCoefficients,
    ) -> Result<(), HardwareError>;

    /// Read back the PIDF gains used by `mode`.
    fn pidf_coefficients(&self, mode: RunMode) -> PidfCoefficients;
}
