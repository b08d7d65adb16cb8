//! Positional servo trait.

use ftc_types::HardwareError;

/// A positional servo commanded over the normalised range `[0.0, 1.0]`.
pub trait Servo: Send + Sync {
    /// Move to `position`.  Out-of-range values are clamped by the driver.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the command cannot be applied.
    fn set_position(&self, position: f64) -> Result<(), HardwareError>;

    /// Last commanded position (servos have no position feedback).
    fn position(&self) -> f64;
}
