//! Trait for the goBILDA Pinpoint odometry computer.
//!
//! The Pinpoint fuses two dead-wheel pods with an on-board IMU and reports a
//! [`Pose2D`] in its own frame (X forward, Y left, heading CCW).  Poses read
//! from and written to the driver are always in that frame; conversion to the
//! field frame lives in [`ftc_types::pose`].

use serde::{Deserialize, Serialize};

use ftc_types::HardwareError;
use ftc_types::pose::{DistanceUnit, Pose2D};

/// Supported goBILDA odometry pod models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoBildaOdometryPods {
    Swingarm,
    #[default]
    FourBar,
}

impl GoBildaOdometryPods {
    /// Encoder ticks per millimetre of pod travel.
    pub const fn ticks_per_mm(self) -> f64 {
        match self {
            GoBildaOdometryPods::Swingarm => 13.262_911_92,
            GoBildaOdometryPods::FourBar => 19.894_367_89,
        }
    }
}

/// Counting direction of an odometry pod encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderDirection {
    #[default]
    Forward,
    Reversed,
}

/// Driver surface of the Pinpoint.
pub trait PinpointDriver: Send + Sync {
    /// Pod offsets from the tracking centre: `x_offset` is how far sideways
    /// the forward pod sits, `y_offset` how far forward the strafe pod sits.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the write fails.
    fn set_offsets(
        &self,
        x_offset: f64,
        y_offset: f64,
        unit: DistanceUnit,
    ) -> Result<(), HardwareError>;

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the write fails.
    fn set_encoder_resolution(&self, pods: GoBildaOdometryPods) -> Result<(), HardwareError>;

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the write fails.
    fn set_encoder_directions(
        &self,
        x_encoder: EncoderDirection,
        y_encoder: EncoderDirection,
    ) -> Result<(), HardwareError>;

    /// Read the latest pose and velocity registers from the device.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the bulk read fails.
    fn update(&self) -> Result<(), HardwareError>;

    /// Pose captured by the last [`update`][Self::update].
    fn position(&self) -> Pose2D;

    /// Overwrite the device's pose estimate.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the write fails.
    fn set_position(&self, pose: Pose2D) -> Result<(), HardwareError>;
}
