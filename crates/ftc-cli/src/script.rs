//! Scripted driver and a crude field model for the simulated robot.
//!
//! Each step the [`Scenario`] integrates the wheel powers from the previous
//! step into a new Pinpoint pose, publishes what the camera would see, and
//! returns the gamepads for the current phase of the script.

use std::sync::Arc;
use std::time::Duration;

use ftc_hal::gamepad::Gamepad;
use ftc_hal::limelight::{FiducialResult, LlResult};
use ftc_hal::sim::SimHardware;
use ftc_opmode::config::RobotConfig;
use ftc_opmode::runner::DriverInput;
use ftc_types::pose::{AngleUnit, DistanceUnit, Pose2D, Pose3D, Position, YawPitchRollAngles};
use ftc_types::{Alliance, OBELISK_TAG_GPP};

use crate::args::OpModeKind;

/// Top speed of the chassis at full power.
const MAX_SPEED_MM_S: f64 = 1500.0;
const MAX_TURN_RAD_S: f64 = 3.0;

/// Bearing to the goal, degrees, when the script starts aiming.
const INITIAL_GOAL_BEARING_DEG: f64 = 12.0;

pub struct Scenario {
    kind: OpModeKind,
    sim: Arc<SimHardware>,
    alliance: Alliance,
    period: Duration,
    obelisk_pipeline: i32,
    pose: Pose2D,
    goal_bearing_deg: f64,
}

impl Scenario {
    pub fn new(kind: OpModeKind, sim: Arc<SimHardware>, config: &RobotConfig) -> Self {
        Self {
            kind,
            sim,
            alliance: config.alliance,
            period: config.loop_period(),
            obelisk_pipeline: config.vision.obelisk_pipeline,
            pose: Pose2D::zero(),
            goal_bearing_deg: INITIAL_GOAL_BEARING_DEG,
        }
    }

    /// Advance the Pinpoint pose by one period of the current wheel powers.
    fn integrate(&mut self) {
        let [fl, fr, bl, br] = self.sim.drive_powers();
        let forward = (fl + fr + bl + br) / 4.0;
        let strafe_right = (fl - fr - bl + br) / 4.0;
        let turn_cw = (fl - fr + bl - br) / 4.0;

        let dt = self.period.as_secs_f64();
        let heading = self.pose.heading(AngleUnit::Radians);
        // Pinpoint frame: X forward, Y left, heading counter-clockwise.
        let dx_robot = forward * MAX_SPEED_MM_S * dt;
        let dy_robot = -strafe_right * MAX_SPEED_MM_S * dt;
        let (sin, cos) = heading.sin_cos();
        let turn = -turn_cw * MAX_TURN_RAD_S * dt;

        self.pose = Pose2D::new(
            DistanceUnit::Mm,
            self.pose.x(DistanceUnit::Mm) + dx_robot * cos - dy_robot * sin,
            self.pose.y(DistanceUnit::Mm) + dx_robot * sin + dy_robot * cos,
            AngleUnit::Radians,
            heading + turn,
        );
        self.sim.odometry.move_to(self.pose);

        // The goal bearing follows the robot's turning.
        self.goal_bearing_deg += turn.to_degrees();
    }

    fn goal_result(&self) -> LlResult {
        let tag = FiducialResult {
            fiducial_id: self.alliance.goal_tag_id(),
            target_x_degrees: self.goal_bearing_deg,
            target_y_degrees: 4.0,
            robot_pose_target_space: Some(Pose3D::new(
                Position::new(2.4, 0.3, 0.0),
                YawPitchRollAngles::new(AngleUnit::Degrees, 0.0, 0.0, 0.0),
            )),
        };
        let field_x = -self.pose.y(DistanceUnit::Meter);
        let field_y = self.pose.x(DistanceUnit::Meter);
        let yaw = self.pose.heading(AngleUnit::Degrees);
        let botpose = Pose3D::new(
            Position::new(field_x, field_y, 0.0),
            YawPitchRollAngles::new(AngleUnit::Degrees, yaw, 0.0, 0.0),
        );
        LlResult {
            valid: true,
            tx: tag.target_x_degrees,
            ty: tag.target_y_degrees,
            ta: 1.2,
            pipeline_index: self.sim.limelight.pipeline(),
            staleness_ms: 12,
            botpose: Some(botpose),
            botpose_mt2: Some(botpose),
            fiducials: vec![tag],
        }
    }

    fn obelisk_result(&self) -> LlResult {
        LlResult {
            valid: true,
            pipeline_index: self.sim.limelight.pipeline(),
            staleness_ms: 15,
            fiducials: vec![FiducialResult {
                fiducial_id: OBELISK_TAG_GPP,
                ..FiducialResult::default()
            }],
            ..LlResult::default()
        }
    }

    fn teleop_pads(&self, step: u64) -> Gamepad {
        let mut pad = Gamepad::default();
        match step {
            // drive forward
            2..=50 => pad.left_stick_y = -0.8,
            // toggle turtle and strafe
            51 => pad.left_bumper = true,
            52..=90 => pad.left_stick_x = 0.6,
            // lock onto the goal while spinning up
            91..=140 => {
                pad.left_trigger = 1.0;
                pad.right_trigger = 1.0;
            }
            // fire
            141..=200 => {
                pad.left_trigger = 1.0;
                pad.right_trigger = 1.0;
                pad.a = true;
            }
            // relocalise from vision
            201 => pad.y = true,
            _ => {}
        }
        pad
    }
}

impl DriverInput for Scenario {
    fn poll(&mut self, step: u64) -> [Gamepad; 2] {
        self.integrate();
        match self.kind {
            OpModeKind::TeleOp => {
                let visible = step >= 80;
                self.sim
                    .limelight
                    .publish(visible.then(|| self.goal_result()));
                [self.teleop_pads(step), Gamepad::default()]
            }
            OpModeKind::Obelisk => {
                let on_obelisk =
                    self.sim.limelight.pipeline() == self.obelisk_pipeline && step >= 20;
                self.sim
                    .limelight
                    .publish(on_obelisk.then(|| self.obelisk_result()));
                [Gamepad::default(); 2]
            }
            OpModeKind::Init => [Gamepad::default(); 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftc_hal::limelight::Limelight3A;
    use ftc_hal::motor::DcMotor;

    fn scenario(kind: OpModeKind) -> Scenario {
        let config = RobotConfig::default();
        let sim = Arc::new(SimHardware::new(&config.devices));
        Scenario::new(kind, sim, &config)
    }

    #[test]
    fn full_forward_moves_along_pinpoint_x() {
        let mut s = scenario(OpModeKind::Init);
        for m in [
            &s.sim.front_left,
            &s.sim.front_right,
            &s.sim.back_left,
            &s.sim.back_right,
        ] {
            m.set_power(1.0).unwrap();
        }
        s.poll(0);
        assert!((s.pose.x(DistanceUnit::Mm) - 30.0).abs() < 1e-9);
        assert!(s.pose.y(DistanceUnit::Mm).abs() < 1e-9);
    }

    #[test]
    fn clockwise_turn_reduces_heading_and_bearing() {
        let mut s = scenario(OpModeKind::Init);
        s.sim.front_left.set_power(0.5).unwrap();
        s.sim.back_left.set_power(0.5).unwrap();
        s.sim.front_right.set_power(-0.5).unwrap();
        s.sim.back_right.set_power(-0.5).unwrap();
        s.poll(0);
        assert!(s.pose.heading(AngleUnit::Radians) < 0.0);
        assert!(s.goal_bearing_deg < INITIAL_GOAL_BEARING_DEG);
    }

    #[test]
    fn teleop_publishes_goal_once_visible() {
        let mut s = scenario(OpModeKind::TeleOp);
        s.sim.limelight.start().unwrap();
        s.poll(10);
        assert!(s.sim.limelight.latest_result().is_none());
        s.poll(80);
        let result = s.sim.limelight.latest_result().unwrap();
        assert_eq!(result.fiducials[0].fiducial_id, Alliance::Blue.goal_tag_id());
    }
}
