//! Odometry: wrapper around the goBILDA Pinpoint.
//!
//! The Pinpoint works in its own frame (X forward, Y left).  This wrapper
//! caches the sensor pose each tick, exposes it in both frames, and accepts
//! relocalisation poses in the FTC field frame (from a known autonomous start
//! position or from the vision coprocessor's bot pose).

use std::sync::Arc;

use tracing::debug;

use ftc_hal::pinpoint::{EncoderDirection, GoBildaOdometryPods, PinpointDriver};
use ftc_hal::registry::{DeviceNames, HardwareMap};
use ftc_types::HardwareError;
use ftc_types::pose::{
    AngleUnit, DistanceUnit, Pose2D, Pose3D, ftc_to_pinpoint, pinpoint_to_ftc,
};

/// Physical pod configuration written to the Pinpoint on [`Odometry::init`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PodSettings {
    /// Sideways offset of the forward pod from the tracking centre, mm.
    pub x_offset_mm: f64,
    /// Forward offset of the strafe pod from the tracking centre, mm.
    pub y_offset_mm: f64,
    pub pods: GoBildaOdometryPods,
    pub x_direction: EncoderDirection,
    pub y_direction: EncoderDirection,
}

impl Default for PodSettings {
    fn default() -> Self {
        Self {
            x_offset_mm: -84.0,
            y_offset_mm: -168.0,
            pods: GoBildaOdometryPods::FourBar,
            x_direction: EncoderDirection::Forward,
            y_direction: EncoderDirection::Forward,
        }
    }
}

/// The odometry subsystem.
pub struct Odometry {
    odo: Arc<dyn PinpointDriver>,
    settings: PodSettings,
    /// Sensor-frame pose, mm / rad.
    current_pose: Pose2D,
}

impl Odometry {
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if the Pinpoint is missing.
    pub fn new(
        hardware_map: &HardwareMap,
        names: &DeviceNames,
        settings: PodSettings,
    ) -> Result<Self, HardwareError> {
        Ok(Self {
            odo: hardware_map.pinpoint(&names.odometry)?,
            settings,
            current_pose: Pose2D::new(DistanceUnit::Mm, 0.0, 0.0, AngleUnit::Radians, 0.0),
        })
    }

    /// Configure the pods and place the robot at `starting_ftc_pose`
    /// (FTC field frame).  Call once from the op mode's init.
    ///
    /// # Errors
    ///
    /// Propagates driver write failures.
    pub fn init(&mut self, starting_ftc_pose: Pose2D) -> Result<(), HardwareError> {
        let s = self.settings;
        self.odo
            .set_offsets(s.x_offset_mm, s.y_offset_mm, DistanceUnit::Mm)?;
        self.odo.set_encoder_resolution(s.pods)?;
        self.odo.set_encoder_directions(s.x_direction, s.y_direction)?;
        self.relocalize(starting_ftc_pose)
    }

    /// Read the sensor and cache its pose.  Call every loop tick.
    ///
    /// # Errors
    ///
    /// Propagates the driver's read failure; the cached pose is kept.
    pub fn update(&mut self) -> Result<(), HardwareError> {
        self.odo.update()?;
        self.current_pose = self.odo.position();
        Ok(())
    }

    /// Pose in the Pinpoint frame (X forward, Y left).
    pub fn pose(&self) -> Pose2D {
        self.current_pose
    }

    /// Pose in the FTC field frame (X right, Y forward).
    pub fn ftc_pose(&self) -> Pose2D {
        pinpoint_to_ftc(self.current_pose)
    }

    /// Reset the sensor to an absolute FTC-frame pose.
    ///
    /// # Errors
    ///
    /// Propagates the driver write failure; the cached pose is unchanged.
    pub fn relocalize(&mut self, ftc_pose: Pose2D) -> Result<(), HardwareError> {
        let pinpoint_pose = ftc_to_pinpoint(ftc_pose);
        self.odo.set_position(pinpoint_pose)?;
        self.current_pose = pinpoint_pose;
        debug!(
            x_mm = pinpoint_pose.x(DistanceUnit::Mm),
            y_mm = pinpoint_pose.y(DistanceUnit::Mm),
            heading_rad = pinpoint_pose.heading(AngleUnit::Radians),
            "odometry relocalized"
        );
        Ok(())
    }

    /// Relocalise from a vision bot pose (FTC frame, metres).  `None` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Propagates the driver write failure.
    pub fn relocalize_from_vision(&mut self, pose: Option<&Pose3D>) -> Result<(), HardwareError> {
        match pose {
            Some(p) => self.relocalize(p.to_pose2d()),
            None => Ok(()),
        }
    }
}
