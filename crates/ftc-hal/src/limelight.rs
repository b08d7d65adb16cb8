//! Trait and result types for the Limelight 3A vision coprocessor.
//!
//! The coprocessor runs AprilTag pipelines on-device and publishes a result
//! snapshot at its poll rate.  [`Limelight3A::latest_result`] returns the
//! newest snapshot, or `None` before the first one arrives.

use serde::{Deserialize, Serialize};

use ftc_types::HardwareError;
use ftc_types::pose::Pose3D;

/// One detected AprilTag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FiducialResult {
    pub fiducial_id: i32,
    /// Horizontal angle from the crosshair to the tag, degrees.
    pub target_x_degrees: f64,
    /// Vertical angle from the crosshair to the tag, degrees.
    pub target_y_degrees: f64,
    /// Robot pose expressed in the tag's frame (X forward, Y strafe, metres).
    #[serde(default)]
    pub robot_pose_target_space: Option<Pose3D>,
}

/// A pipeline result snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlResult {
    pub valid: bool,
    /// Primary target horizontal offset, degrees.
    pub tx: f64,
    /// Primary target vertical offset, degrees.
    pub ty: f64,
    /// Primary target area, percent of the image.
    pub ta: f64,
    pub pipeline_index: i32,
    /// Age of this result in milliseconds.
    pub staleness_ms: u64,
    /// Field pose from tags alone (MegaTag1).
    #[serde(default)]
    pub botpose: Option<Pose3D>,
    /// Field pose fused with the robot yaw (MegaTag2).
    #[serde(default)]
    pub botpose_mt2: Option<Pose3D>,
    #[serde(default)]
    pub fiducials: Vec<FiducialResult>,
}

impl LlResult {
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Driver surface of the Limelight 3A.
pub trait Limelight3A: Send + Sync {
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the device rejects the rate.
    fn set_poll_rate_hz(&self, hz: u32) -> Result<(), HardwareError>;

    /// Start streaming results.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the device cannot be started.
    fn start(&self) -> Result<(), HardwareError>;

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the device cannot be stopped.
    fn stop(&self) -> Result<(), HardwareError>;

    /// Switch the active pipeline (0–9).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] for an index the device rejects.
    fn pipeline_switch(&self, index: i32) -> Result<(), HardwareError>;

    /// Feed the robot's IMU yaw (degrees) for MegaTag2.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceFault`] if the write fails.
    fn update_robot_orientation(&self, yaw_degrees: f64) -> Result<(), HardwareError>;

    /// Newest result snapshot, if any has been received.
    fn latest_result(&self) -> Option<LlResult>;
}
