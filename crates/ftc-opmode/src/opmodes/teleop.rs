//! Driver-controlled period.
//!
//! | Input (gamepad 1) | Action |
//! |---|---|
//! | left stick | translate |
//! | right stick X | rotate |
//! | left bumper (press) | toggle turtle mode |
//! | left trigger > 0.5 | lock rotation onto the alliance goal tag |
//! | right trigger > 0.5 | spin the flywheel to the shot RPM |
//! | A | feed an artifact once the flywheel is at speed |
//! | Y (press) | relocalise odometry from the MegaTag2 pose |
//! | dpad up / down (press) | raise / lower the hood |

use tracing::{debug, warn};

use ftc_hal::gamepad::{Button, Gamepad};
use ftc_hal::registry::HardwareMap;
use ftc_subsystems::aim::GoalAim;
use ftc_subsystems::drivetrain::Drivetrain;
use ftc_subsystems::limelight::Limelight;
use ftc_subsystems::odometry::Odometry;
use ftc_subsystems::output::Output;
use ftc_types::pose::{AngleUnit, DistanceUnit, Pose2D};
use ftc_types::{Alliance, HardwareError};

use crate::config::RobotConfig;
use crate::opmode::{LoopContext, OpMode};

const TRIGGER_THRESHOLD: f64 = 0.5;

struct Robot {
    drivetrain: Drivetrain,
    output: Output,
    odometry: Odometry,
    limelight: Limelight,
}

pub struct TeleOp {
    robot: Option<Robot>,
    aim: GoalAim,
    alliance: Alliance,
    shot_rpm: f64,
    hood_step: f64,
    hood_position: f64,
    previous: Gamepad,
    shots_fired: u32,
}

impl Default for TeleOp {
    fn default() -> Self {
        Self::new()
    }
}

impl TeleOp {
    pub fn new() -> Self {
        Self {
            robot: None,
            aim: RobotConfig::default().goal_aim(),
            alliance: Alliance::Blue,
            shot_rpm: 0.0,
            hood_step: 0.0,
            hood_position: 0.0,
            previous: Gamepad::default(),
            shots_fired: 0,
        }
    }

    pub fn drivetrain(&self) -> Option<&Drivetrain> {
        self.robot.as_ref().map(|r| &r.drivetrain)
    }

    pub fn output(&self) -> Option<&Output> {
        self.robot.as_ref().map(|r| &r.output)
    }

    pub fn odometry(&self) -> Option<&Odometry> {
        self.robot.as_ref().map(|r| &r.odometry)
    }

    pub fn limelight(&self) -> Option<&Limelight> {
        self.robot.as_ref().map(|r| &r.limelight)
    }

    /// Feeds started since init.
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }
}

fn not_initialised() -> HardwareError {
    HardwareError::Config("TeleOp used before init".to_string())
}

impl OpMode for TeleOp {
    fn name(&self) -> &str {
        "TeleOp"
    }

    fn init(
        &mut self,
        hardware_map: &HardwareMap,
        config: &RobotConfig,
    ) -> Result<(), HardwareError> {
        let names = &config.devices;

        let mut drivetrain = Drivetrain::new(hardware_map, names)?;
        drivetrain.set_turtle_multiplier(config.drivetrain.turtle_multiplier);

        let output = Output::new(hardware_map, names, config.output_settings())?;

        let mut odometry = Odometry::new(hardware_map, names, config.pod_settings())?;
        odometry.init(Pose2D::zero())?;

        let mut limelight = Limelight::new(hardware_map, names, config.vision_settings())?;
        limelight.set_alliance(config.alliance);

        self.robot = Some(Robot {
            drivetrain,
            output,
            odometry,
            limelight,
        });
        self.aim = config.goal_aim();
        self.alliance = config.alliance;
        self.shot_rpm = config.output.shot_rpm;
        self.hood_step = config.output.hood_step;
        self.hood_position = 0.0;
        self.previous = Gamepad::default();
        self.shots_fired = 0;
        Ok(())
    }

    fn init_loop(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        ctx.telemetry.add_data("Status", "Initialized");
        ctx.telemetry.add_data("Alliance", self.alliance);
        Ok(())
    }

    fn start(&mut self, _ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        let robot = self.robot.as_mut().ok_or_else(not_initialised)?;
        robot.output.set_hood_position(self.hood_position)
    }

    /// Runs every stage of the tick even when a device write fails, so the
    /// drivetrain always follows the sticks.  Failures are logged as they
    /// happen and the first one is returned after telemetry is written.
    fn loop_tick(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        let robot = self.robot.as_mut().ok_or_else(not_initialised)?;
        let pad = ctx.gamepad1;
        let prev = self.previous;
        self.previous = pad;
        let mut fault = None;

        // Sensors.  A failed odometry read keeps the last pose.
        if let Err(e) = robot.odometry.update() {
            warn!(error = %e, "odometry read failed");
        }
        let heading_deg = robot.odometry.ftc_pose().heading(AngleUnit::Degrees);
        record(
            &mut fault,
            "limelight orientation",
            robot.limelight.update_robot_orientation(heading_deg),
        );
        robot.limelight.update();

        if pad.pressed_since(&prev, Button::LeftBumper) {
            let enabled = !robot.drivetrain.is_turtle_mode();
            robot.drivetrain.set_turtle_mode(enabled);
        }

        if pad.pressed_since(&prev, Button::Y) {
            let pose = robot.limelight.robot_pose_mt2();
            if pose.is_none() {
                debug!("relocalize requested without a vision pose");
            }
            record(&mut fault, "relocalize", robot.odometry.relocalize_from_vision(pose));
        }

        // Launcher.
        let target = if pad.right_trigger > TRIGGER_THRESHOLD {
            self.shot_rpm
        } else {
            0.0
        };
        let at_speed = record(&mut fault, "flywheel", robot.output.set_target_rpm(target))
            .is_some_and(|at_target| at_target && target > 0.0);
        if pad.a
            && at_speed
            && !robot.output.is_feeding()
            && record(&mut fault, "feed", robot.output.feed_artifact(ctx.now)).is_some()
        {
            self.shots_fired += 1;
        }
        record(&mut fault, "feeder", robot.output.update(ctx.now));

        let hood_delta = if pad.pressed_since(&prev, Button::DpadUp) {
            self.hood_step
        } else if pad.pressed_since(&prev, Button::DpadDown) {
            -self.hood_step
        } else {
            0.0
        };
        if hood_delta != 0.0 {
            self.hood_position = (self.hood_position + hood_delta).clamp(0.0, 1.0);
            record(&mut fault, "hood", robot.output.set_hood_position(self.hood_position));
        }

        // Drive.
        let aiming = pad.left_trigger > TRIGGER_THRESHOLD && robot.limelight.has_goal_tag();
        let drive = if aiming {
            let rotation = self
                .aim
                .update(robot.limelight.rotation_error_to_goal(), ctx.dt.as_secs_f64());
            robot
                .drivetrain
                .drive(pad.left_stick_x, -pad.left_stick_y, rotation)
        } else {
            self.aim.reset();
            robot.drivetrain.move_with_gamepad(&pad)
        };
        record(&mut fault, "drive", drive);

        let pose = robot.odometry.ftc_pose();
        let t = &mut *ctx.telemetry;
        t.add_data("Alliance", self.alliance);
        t.add_data("Turtle", robot.drivetrain.is_turtle_mode());
        t.add_data("Aiming", aiming);
        t.add_data("Target RPM", format!("{:.0}", robot.output.target_rpm()));
        t.add_data("Current RPM", format!("{:.0}", robot.output.current_rpm()));
        t.add_data("At Speed", at_speed);
        t.add_data("Feeding", robot.output.is_feeding());
        t.add_data("Shots", self.shots_fired);
        t.add_data("Hood", format!("{:.2}", self.hood_position));
        t.add_data("X (in)", format!("{:.1}", pose.x(DistanceUnit::Inch)));
        t.add_data("Y (in)", format!("{:.1}", pose.y(DistanceUnit::Inch)));
        t.add_data("Heading (deg)", format!("{:.1}", pose.heading(AngleUnit::Degrees)));
        t.add_data("Goal Tag", robot.limelight.has_goal_tag());
        t.add_data("tx", format!("{:.2}", robot.limelight.rotation_error_to_goal()));
        t.add_data("Distance (m)", format!("{:.2}", robot.limelight.distance_to_goal()));
        t.add_data("Staleness (ms)", robot.limelight.staleness_ms());

        fault.map_or(Ok(()), Err)
    }

    /// Every subsystem is stopped even if an earlier one fails.
    fn stop(&mut self) -> Result<(), HardwareError> {
        let Some(robot) = self.robot.as_mut() else {
            return Ok(());
        };
        let mut fault = None;
        record(&mut fault, "drivetrain stop", robot.drivetrain.stop());
        record(&mut fault, "output stop", robot.output.stop());
        record(&mut fault, "limelight stop", robot.limelight.stop());
        fault.map_or(Ok(()), Err)
    }
}

/// Log a failed device write and keep the first failure in `fault`.
fn record<T>(
    fault: &mut Option<HardwareError>,
    action: &str,
    result: Result<T, HardwareError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(action, error = %e, "device write failed");
            fault.get_or_insert(e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use ftc_hal::limelight::{FiducialResult, LlResult};
    use ftc_hal::registry::DeviceNames;
    use ftc_hal::sim::SimHardware;
    use ftc_types::BLUE_GOAL_TAG_ID;
    use ftc_types::pose::{Pose3D, Position, YawPitchRollAngles};

    use crate::telemetry::{Telemetry, TelemetryFrame};

    struct Harness {
        sim: SimHardware,
        op: TeleOp,
        telemetry: Telemetry,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let sim = SimHardware::new(&DeviceNames::default());
            let mut op = TeleOp::new();
            op.init(&sim.hardware_map(), &RobotConfig::default()).unwrap();
            Self {
                sim,
                op,
                telemetry: Telemetry::new(),
                now: Instant::now(),
            }
        }

        fn try_tick(&mut self, pad: Gamepad) -> (Result<(), HardwareError>, TelemetryFrame) {
            self.now += Duration::from_millis(20);
            let mut ctx = LoopContext {
                now: self.now,
                dt: Duration::from_millis(20),
                tick: 0,
                gamepad1: pad,
                gamepad2: Gamepad::default(),
                telemetry: &mut self.telemetry,
            };
            let result = self.op.loop_tick(&mut ctx);
            (result, self.telemetry.update())
        }

        fn tick(&mut self, pad: Gamepad) {
            self.try_tick(pad).0.unwrap();
        }
    }

    fn goal_result(tx: f64) -> LlResult {
        LlResult {
            valid: true,
            tx,
            fiducials: vec![FiducialResult {
                fiducial_id: BLUE_GOAL_TAG_ID,
                target_x_degrees: tx,
                ..FiducialResult::default()
            }],
            ..LlResult::default()
        }
    }

    #[test]
    fn sticks_drive_the_wheels() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            left_stick_y: -1.0,
            ..Gamepad::default()
        });
        assert_eq!(h.sim.drive_powers(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn left_bumper_toggles_turtle_on_press_only() {
        let mut h = Harness::new();
        let held = Gamepad {
            left_bumper: true,
            ..Gamepad::default()
        };
        h.tick(held);
        h.tick(held);
        assert!(h.op.drivetrain().unwrap().is_turtle_mode());
        h.tick(Gamepad::default());
        h.tick(held);
        assert!(!h.op.drivetrain().unwrap().is_turtle_mode());
    }

    #[test]
    fn trigger_and_a_fire_one_artifact() {
        let mut h = Harness::new();
        let shoot = Gamepad {
            right_trigger: 1.0,
            a: true,
            ..Gamepad::default()
        };
        h.tick(shoot);
        assert!(h.op.output().unwrap().is_feeding());
        assert_eq!(h.op.output().unwrap().transfer_position(), 0.5);

        // Holding A does not re-trigger mid-feed; after 250 ms it resets.
        for _ in 0..13 {
            h.tick(shoot);
        }
        assert_eq!(h.op.shots_fired(), 1);
        assert!(!h.op.output().unwrap().is_feeding());
        assert_eq!(h.op.output().unwrap().transfer_position(), 0.0);
    }

    #[test]
    fn no_feed_without_flywheel() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            a: true,
            ..Gamepad::default()
        });
        assert!(!h.op.output().unwrap().is_feeding());
        assert_eq!(h.op.shots_fired(), 0);
    }

    #[test]
    fn left_trigger_aims_at_goal() {
        let mut h = Harness::new();
        h.sim.limelight.publish(Some(goal_result(10.0)));
        h.tick(Gamepad {
            left_trigger: 1.0,
            ..Gamepad::default()
        });
        let [fl, fr, bl, br] = h.sim.drive_powers();
        // Positive tx turns clockwise: left side forward, right side back.
        assert!(fl > 0.0 && bl > 0.0);
        assert!(fr < 0.0 && br < 0.0);
    }

    #[test]
    fn y_relocalizes_from_vision() {
        let mut h = Harness::new();
        let mut result = goal_result(0.0);
        result.botpose_mt2 = Some(Pose3D::new(
            Position::new(1.0, -0.5, 0.0),
            YawPitchRollAngles::new(AngleUnit::Degrees, 45.0, 0.0, 0.0),
        ));
        h.sim.limelight.publish(Some(result));
        h.tick(Gamepad {
            y: true,
            ..Gamepad::default()
        });
        let pose = h.op.odometry().unwrap().ftc_pose();
        assert!((pose.x(DistanceUnit::Meter) - 1.0).abs() < 1e-9);
        assert!((pose.y(DistanceUnit::Meter) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn dpad_nudges_hood_within_range() {
        let mut h = Harness::new();
        let up = Gamepad {
            dpad_up: true,
            ..Gamepad::default()
        };
        h.tick(up);
        h.tick(Gamepad::default());
        h.tick(up);
        assert!((h.op.output().unwrap().hood_position() - 0.1).abs() < 1e-9);

        let down = Gamepad {
            dpad_down: true,
            ..Gamepad::default()
        };
        for _ in 0..5 {
            h.tick(down);
            h.tick(Gamepad::default());
        }
        assert_eq!(h.op.output().unwrap().hood_position(), 0.0);
    }

    #[test]
    fn stop_zeroes_actuators() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            left_stick_x: 0.5,
            right_trigger: 1.0,
            ..Gamepad::default()
        });
        h.op.stop().unwrap();
        assert_eq!(h.sim.drive_powers(), [0.0; 4]);
        assert!(!h.sim.limelight.is_running());
    }

    #[test]
    fn faulted_feeder_and_camera_do_not_hold_the_drive() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            left_stick_y: -1.0,
            right_trigger: 1.0,
            a: true,
            ..Gamepad::default()
        });
        assert!(h.op.output().unwrap().is_feeding());

        h.sim.transfer_servo.set_fault(Some("stalled"));
        h.sim.limelight.set_fault(Some("usb disconnected"));
        let forward = Gamepad {
            left_stick_y: -1.0,
            ..Gamepad::default()
        };
        for _ in 0..14 {
            let (result, frame) = h.try_tick(forward);
            assert!(matches!(
                result,
                Err(HardwareError::DeviceFault { ref device, .. }) if device == "limelight"
            ));
            assert_eq!(h.sim.drive_powers(), [1.0; 4]);
            assert_eq!(frame.get("Feeding"), Some("true"));
        }

        for _ in 0..20 {
            let (result, _) = h.try_tick(Gamepad::default());
            assert!(result.is_err());
        }
        assert_eq!(h.sim.drive_powers(), [0.0; 4]);
        // The servo never reached its reset position, so the feed is still open.
        assert!(h.op.output().unwrap().is_feeding());

        h.sim.transfer_servo.set_fault(None);
        h.sim.limelight.set_fault(None);
        h.tick(Gamepad::default());
        assert!(!h.op.output().unwrap().is_feeding());
        assert_eq!(h.op.output().unwrap().transfer_position(), 0.0);
    }

    #[test]
    fn stuck_feeder_alone_still_reports_its_fault() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            right_trigger: 1.0,
            a: true,
            ..Gamepad::default()
        });
        h.sim.transfer_servo.set_fault(Some("stalled"));
        for _ in 0..12 {
            h.tick(Gamepad {
                left_stick_x: 0.5,
                ..Gamepad::default()
            });
        }
        // The 250 ms feed expires on this tick and the reset write fails.
        let (result, _) = h.try_tick(Gamepad {
            left_stick_x: 0.5,
            ..Gamepad::default()
        });
        assert!(matches!(
            result,
            Err(HardwareError::DeviceFault { ref device, .. }) if device == "transferServo"
        ));
        let [fl, fr, bl, br] = h.sim.drive_powers();
        assert!(fl > 0.0 && br > 0.0 && fr < 0.0 && bl < 0.0);
    }

    #[test]
    fn stop_reaches_every_subsystem_when_camera_faults() {
        let mut h = Harness::new();
        h.tick(Gamepad {
            left_stick_y: -1.0,
            right_trigger: 1.0,
            ..Gamepad::default()
        });
        h.sim.limelight.set_fault(Some("usb disconnected"));
        assert!(h.op.stop().is_err());
        assert_eq!(h.sim.drive_powers(), [0.0; 4]);
        assert_eq!(h.sim.flywheel.target_velocity(), 0.0);
        assert_eq!(h.op.output().unwrap().current_rpm(), 0.0);
    }

    #[test]
    fn loop_before_init_is_an_error() {
        let mut op = TeleOp::new();
        let mut telemetry = Telemetry::new();
        let mut ctx = LoopContext {
            now: Instant::now(),
            dt: Duration::ZERO,
            tick: 0,
            gamepad1: Gamepad::default(),
            gamepad2: Gamepad::default(),
            telemetry: &mut telemetry,
        };
        assert!(matches!(
            op.loop_tick(&mut ctx),
            Err(HardwareError::Config(_))
        ));
        assert!(op.stop().is_ok());
    }
}
