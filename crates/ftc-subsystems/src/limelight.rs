//! Vision: wrapper around the Limelight 3A.
//!
//! [`Limelight::update`] polls the coprocessor each tick and keeps the most
//! recent *valid* result; an invalid or missing poll leaves the previous
//! result in place.  Every getter answers from that cached result and falls
//! back to a neutral value when none has arrived yet.

use std::sync::Arc;

use tracing::debug;

use ftc_hal::limelight::{FiducialResult, Limelight3A, LlResult};
use ftc_hal::registry::{DeviceNames, HardwareMap};
use ftc_types::pose::Pose3D;
use ftc_types::{Alliance, HardwareError, Motif};

/// Pipeline that tracks the goal AprilTags.
pub const TARGETING_PIPELINE_INDEX: i32 = 0;
/// Pipeline that reads the obelisk AprilTags.
pub const OBELISK_PIPELINE_INDEX: i32 = 1;
/// Poll rate requested from the coprocessor.
pub const POLLING_RATE_HZ: u32 = 100;
/// Staleness reported when there is no result.
pub const NO_RESULT_STALENESS_MS: u64 = 9999;

/// Pipeline and poll-rate settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionSettings {
    pub poll_rate_hz: u32,
    pub targeting_pipeline: i32,
    pub obelisk_pipeline: i32,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            poll_rate_hz: POLLING_RATE_HZ,
            targeting_pipeline: TARGETING_PIPELINE_INDEX,
            obelisk_pipeline: OBELISK_PIPELINE_INDEX,
        }
    }
}

/// The vision subsystem.
pub struct Limelight {
    limelight: Arc<dyn Limelight3A>,
    settings: VisionSettings,
    latest_result: Option<LlResult>,
    alliance: Alliance,
}

impl Limelight {
    /// Look up the coprocessor, set its poll rate, start it and select the
    /// targeting pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if the device is missing, or
    /// the driver's error if it cannot be configured.
    pub fn new(
        hardware_map: &HardwareMap,
        names: &DeviceNames,
        settings: VisionSettings,
    ) -> Result<Self, HardwareError> {
        let limelight = hardware_map.limelight(&names.limelight)?;
        limelight.set_poll_rate_hz(settings.poll_rate_hz)?;
        limelight.start()?;

        let mut vision = Self {
            limelight,
            settings,
            latest_result: None,
            alliance: Alliance::Blue,
        };
        vision.set_targeting_pipeline()?;
        Ok(vision)
    }

    /// Poll the coprocessor.  Call every loop tick.
    pub fn update(&mut self) {
        if let Some(result) = self.limelight.latest_result()
            && result.is_valid()
        {
            self.latest_result = Some(result);
        }
    }

    /// Stop the stream.  Call from the op mode's stop.
    ///
    /// # Errors
    ///
    /// Propagates the driver failure.
    pub fn stop(&mut self) -> Result<(), HardwareError> {
        self.limelight.stop()
    }

    // ── Control ──────────────────────────────────────────────────────────

    pub fn set_alliance(&mut self, alliance: Alliance) {
        self.alliance = alliance;
    }

    /// Set the alliance from its name; anything but "red" selects blue.
    pub fn set_alliance_name(&mut self, name: &str) {
        self.alliance = Alliance::from_name(name);
    }

    pub fn alliance(&self) -> Alliance {
        self.alliance
    }

    /// # Errors
    ///
    /// Propagates the driver failure for an index it rejects.
    pub fn set_pipeline(&mut self, index: i32) -> Result<(), HardwareError> {
        self.limelight.pipeline_switch(index)?;
        debug!(pipeline = index, "limelight pipeline switched");
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates the driver failure.
    pub fn set_targeting_pipeline(&mut self) -> Result<(), HardwareError> {
        self.set_pipeline(self.settings.targeting_pipeline)
    }

    /// # Errors
    ///
    /// Propagates the driver failure.
    pub fn set_obelisk_pipeline(&mut self) -> Result<(), HardwareError> {
        self.set_pipeline(self.settings.obelisk_pipeline)
    }

    /// Feed the IMU yaw (degrees) for the MegaTag2 estimate.
    ///
    /// # Errors
    ///
    /// Propagates the driver failure.
    pub fn update_robot_orientation(&mut self, yaw_degrees: f64) -> Result<(), HardwareError> {
        self.limelight.update_robot_orientation(yaw_degrees)
    }

    // ── Autonomous ───────────────────────────────────────────────────────

    /// Motif of the first obelisk tag in view, or [`Motif::Unknown`].
    /// Needs the obelisk pipeline.
    pub fn detected_motif(&self) -> Motif {
        self.visible_tags()
            .iter()
            .find_map(|tag| Motif::from_tag_id(tag.fiducial_id))
            .unwrap_or(Motif::Unknown)
    }

    // ── Alliance goal ────────────────────────────────────────────────────

    fn goal_tag(&self) -> Option<&FiducialResult> {
        self.tag_by_id(self.alliance.goal_tag_id())
    }

    pub fn has_goal_tag(&self) -> bool {
        self.goal_tag().is_some()
    }

    /// Horizontal angle to the alliance goal tag in degrees, or 0.
    pub fn rotation_error_to_goal(&self) -> f64 {
        self.goal_tag().map_or(0.0, |tag| tag.target_x_degrees)
    }

    /// Planar distance to the alliance goal tag in metres, or 0.
    pub fn distance_to_goal(&self) -> f64 {
        self.goal_tag()
            .and_then(|tag| tag.robot_pose_target_space.as_ref())
            .map_or(0.0, |pose| pose.position.x.hypot(pose.position.y))
    }

    /// Sideways offset from the alliance goal tag in metres, or 0.
    pub fn strafe_error_to_goal(&self) -> f64 {
        self.goal_tag()
            .and_then(|tag| tag.robot_pose_target_space.as_ref())
            .map_or(0.0, |pose| pose.position.y)
    }

    // ── Raw result ───────────────────────────────────────────────────────

    pub fn has_valid_result(&self) -> bool {
        self.latest_result.as_ref().is_some_and(LlResult::is_valid)
    }

    fn valid_result(&self) -> Option<&LlResult> {
        self.latest_result.as_ref().filter(|r| r.is_valid())
    }

    /// Field pose from tags alone (MegaTag1).
    pub fn robot_pose(&self) -> Option<&Pose3D> {
        self.valid_result().and_then(|r| r.botpose.as_ref())
    }

    /// Field pose fused with the robot yaw (MegaTag2).
    pub fn robot_pose_mt2(&self) -> Option<&Pose3D> {
        self.valid_result().and_then(|r| r.botpose_mt2.as_ref())
    }

    /// All tags in the cached result; empty when there is none.
    pub fn visible_tags(&self) -> &[FiducialResult] {
        self.valid_result()
            .map(|r| r.fiducials.as_slice())
            .unwrap_or_default()
    }

    pub fn tag_by_id(&self, id: i32) -> Option<&FiducialResult> {
        self.visible_tags().iter().find(|tag| tag.fiducial_id == id)
    }

    pub fn tx(&self) -> f64 {
        self.valid_result().map_or(0.0, |r| r.tx)
    }

    pub fn ty(&self) -> f64 {
        self.valid_result().map_or(0.0, |r| r.ty)
    }

    pub fn ta(&self) -> f64 {
        self.valid_result().map_or(0.0, |r| r.ta)
    }

    /// Active pipeline as reported by the result, or -1.
    pub fn pipeline_index(&self) -> i32 {
        self.valid_result().map_or(-1, |r| r.pipeline_index)
    }

    /// Age of the cached result in ms, or [`NO_RESULT_STALENESS_MS`].
    pub fn staleness_ms(&self) -> u64 {
        self.valid_result()
            .map_or(NO_RESULT_STALENESS_MS, |r| r.staleness_ms)
    }
}
