//! In-process simulated drivers for tests and the simulation CLI.
//!
//! Every driver records the commands it receives and returns plausible
//! state, so the subsystems and op modes can run headless.  Tests keep the
//! concrete `Arc<Sim*>` handles from [`SimHardware`] to script sensor input
//! and assert on commanded output.
//!
//! # Example
//!
//! ```rust
//! use ftc_hal::motor::DcMotor;
//! use ftc_hal::registry::DeviceNames;
//! use ftc_hal::sim::SimHardware;
//!
//! let sim = SimHardware::new(&DeviceNames::default());
//! let map = sim.hardware_map();
//!
//! map.motor("frontLeft").unwrap().set_power(0.25).unwrap();
//! assert!((sim.front_left.power() - 0.25).abs() < 1e-12);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ftc_types::pose::{DistanceUnit, Pose2D};
use ftc_types::{Direction, HardwareError, PidfCoefficients, RunMode};

use crate::limelight::{Limelight3A, LlResult};
use crate::motor::{DcMotor, DcMotorEx};
use crate::pinpoint::{EncoderDirection, GoBildaOdometryPods, PinpointDriver};
use crate::registry::{DeviceNames, HardwareMap};
use crate::servo::Servo;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_fault(device: &str, fault: &Mutex<Option<String>>) -> Result<(), HardwareError> {
    match lock(fault).as_ref() {
        Some(details) => Err(HardwareError::DeviceFault {
            device: device.to_string(),
            details: details.clone(),
        }),
        None => Ok(()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Motor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MotorState {
    direction: Direction,
    power: f64,
    mode: RunMode,
    target_velocity: f64,
    measured_velocity: Option<f64>,
    pidf: HashMap<RunMode, PidfCoefficients>,
    mode_history: Vec<RunMode>,
}

/// A simulated motor.
///
/// In [`RunMode::RunUsingEncoder`] the measured velocity tracks the
/// commanded velocity exactly unless overridden with
/// [`set_measured_velocity`][Self::set_measured_velocity].
#[derive(Debug)]
pub struct SimMotor {
    name: String,
    state: Mutex<MotorState>,
    fault: Mutex<Option<String>>,
}

impl SimMotor {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(MotorState::default()),
            fault: Mutex::new(None),
        })
    }

    /// Force the velocity the encoder reports, or `None` to follow the
    /// commanded velocity again.
    pub fn set_measured_velocity(&self, ticks_per_second: Option<f64>) {
        lock(&self.state).measured_velocity = ticks_per_second;
    }

    /// Make every subsequent write fail with `details`, or clear the fault.
    pub fn set_fault(&self, details: Option<&str>) {
        *lock(&self.fault) = details.map(str::to_string);
    }

    pub fn target_velocity(&self) -> f64 {
        lock(&self.state).target_velocity
    }

    /// Every run mode written, in order.
    pub fn mode_history(&self) -> Vec<RunMode> {
        lock(&self.state).mode_history.clone()
    }
}

impl DcMotor for SimMotor {
    fn set_direction(&self, direction: Direction) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        lock(&self.state).direction
    }

    fn set_power(&self, power: f64) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).power = power.clamp(-1.0, 1.0);
        Ok(())
    }

    fn power(&self) -> f64 {
        lock(&self.state).power
    }
}

impl DcMotorEx for SimMotor {
    fn set_mode(&self, mode: RunMode) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        let mut state = lock(&self.state);
        state.mode = mode;
        state.mode_history.push(mode);
        if mode == RunMode::StopAndResetEncoder {
            state.target_velocity = 0.0;
            state.power = 0.0;
        }
        Ok(())
    }

    fn mode(&self) -> RunMode {
        lock(&self.state).mode
    }

    fn set_velocity(&self, ticks_per_second: f64) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).target_velocity = ticks_per_second;
        Ok(())
    }

    fn velocity(&self) -> f64 {
        let state = lock(&self.state);
        match (state.measured_velocity, state.mode) {
            (Some(v), _) => v,
            (None, RunMode::RunUsingEncoder) => state.target_velocity,
            (None, _) => 0.0,
        }
    }

    fn set_pidf_coefficients(
        &self,
        mode: RunMode,
        coefficients: PidfCoefficients,
    ) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).pidf.insert(mode, coefficients);
        Ok(())
    }

    fn pidf_coefficients(&self, mode: RunMode) -> PidfCoefficients {
        lock(&self.state)
            .pidf
            .get(&mode)
            .copied()
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Servo
// ────────────────────────────────────────────────────────────────────────────

/// A simulated servo.  Positions are clamped to `[0.0, 1.0]`.
#[derive(Debug)]
pub struct SimServo {
    name: String,
    position: Mutex<f64>,
    history: Mutex<Vec<f64>>,
    fault: Mutex<Option<String>>,
}

impl SimServo {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            position: Mutex::new(0.0),
            history: Mutex::new(Vec::new()),
            fault: Mutex::new(None),
        })
    }

    pub fn set_fault(&self, details: Option<&str>) {
        *lock(&self.fault) = details.map(str::to_string);
    }

    /// Every position commanded, in order.
    pub fn history(&self) -> Vec<f64> {
        lock(&self.history).clone()
    }
}

impl Servo for SimServo {
    fn set_position(&self, position: f64) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        let clamped = position.clamp(0.0, 1.0);
        *lock(&self.position) = clamped;
        lock(&self.history).push(clamped);
        Ok(())
    }

    fn position(&self) -> f64 {
        *lock(&self.position)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pinpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct PinpointState {
    offsets_mm: (f64, f64),
    pods: Option<GoBildaOdometryPods>,
    directions: (EncoderDirection, EncoderDirection),
    /// Where the robot "really" is; copied to `reported` on update.
    true_pose: Pose2D,
    reported: Pose2D,
    update_count: u64,
}

/// A simulated Pinpoint.  [`move_to`][Self::move_to] places the robot; the
/// new pose becomes visible after the next [`PinpointDriver::update`].
#[derive(Debug)]
pub struct SimPinpoint {
    name: String,
    state: Mutex<PinpointState>,
    fault: Mutex<Option<String>>,
}

impl SimPinpoint {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(PinpointState::default()),
            fault: Mutex::new(None),
        })
    }

    /// Move the simulated robot to `pose` (sensor frame).
    pub fn move_to(&self, pose: Pose2D) {
        lock(&self.state).true_pose = pose;
    }

    pub fn set_fault(&self, details: Option<&str>) {
        *lock(&self.fault) = details.map(str::to_string);
    }

    pub fn offsets_mm(&self) -> (f64, f64) {
        lock(&self.state).offsets_mm
    }

    pub fn pods(&self) -> Option<GoBildaOdometryPods> {
        lock(&self.state).pods
    }

    pub fn encoder_directions(&self) -> (EncoderDirection, EncoderDirection) {
        lock(&self.state).directions
    }

    pub fn update_count(&self) -> u64 {
        lock(&self.state).update_count
    }
}

impl PinpointDriver for SimPinpoint {
    fn set_offsets(
        &self,
        x_offset: f64,
        y_offset: f64,
        unit: DistanceUnit,
    ) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).offsets_mm = (unit.to_mm(x_offset), unit.to_mm(y_offset));
        Ok(())
    }

    fn set_encoder_resolution(&self, pods: GoBildaOdometryPods) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).pods = Some(pods);
        Ok(())
    }

    fn set_encoder_directions(
        &self,
        x_encoder: EncoderDirection,
        y_encoder: EncoderDirection,
    ) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).directions = (x_encoder, y_encoder);
        Ok(())
    }

    fn update(&self) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        let mut state = lock(&self.state);
        state.reported = state.true_pose;
        state.update_count += 1;
        Ok(())
    }

    fn position(&self) -> Pose2D {
        lock(&self.state).reported
    }

    fn set_position(&self, pose: Pose2D) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        let mut state = lock(&self.state);
        state.true_pose = pose;
        state.reported = pose;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Limelight
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LimelightState {
    running: bool,
    poll_rate_hz: u32,
    pipeline: i32,
    pipeline_history: Vec<i32>,
    robot_yaw_deg: f64,
    result: Option<LlResult>,
}

/// A simulated Limelight.  Tests publish results with
/// [`publish`][Self::publish]; results are only visible while running.
#[derive(Debug)]
pub struct SimLimelight {
    name: String,
    state: Mutex<LimelightState>,
    fault: Mutex<Option<String>>,
}

impl SimLimelight {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(LimelightState::default()),
            fault: Mutex::new(None),
        })
    }

    /// Make every subsequent command fail with `details`, or clear the fault.
    /// Results already published stay readable.
    pub fn set_fault(&self, details: Option<&str>) {
        *lock(&self.fault) = details.map(str::to_string);
    }

    /// Replace the result the device reports, or clear it with `None`.
    pub fn publish(&self, result: Option<LlResult>) {
        lock(&self.state).result = result;
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn poll_rate_hz(&self) -> u32 {
        lock(&self.state).poll_rate_hz
    }

    pub fn pipeline(&self) -> i32 {
        lock(&self.state).pipeline
    }

    /// Every pipeline switched to, in order.
    pub fn pipeline_history(&self) -> Vec<i32> {
        lock(&self.state).pipeline_history.clone()
    }

    pub fn robot_yaw_degrees(&self) -> f64 {
        lock(&self.state).robot_yaw_deg
    }
}

impl Limelight3A for SimLimelight {
    fn set_poll_rate_hz(&self, hz: u32) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        if hz == 0 || hz > 250 {
            return Err(HardwareError::DeviceFault {
                device: self.name.clone(),
                details: format!("poll rate {hz} Hz out of range"),
            });
        }
        lock(&self.state).poll_rate_hz = hz;
        Ok(())
    }

    fn start(&self) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).running = false;
        Ok(())
    }

    fn pipeline_switch(&self, index: i32) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        if !(0..=9).contains(&index) {
            return Err(HardwareError::DeviceFault {
                device: self.name.clone(),
                details: format!("pipeline {index} does not exist"),
            });
        }
        let mut state = lock(&self.state);
        state.pipeline = index;
        state.pipeline_history.push(index);
        Ok(())
    }

    fn update_robot_orientation(&self, yaw_degrees: f64) -> Result<(), HardwareError> {
        check_fault(&self.name, &self.fault)?;
        lock(&self.state).robot_yaw_deg = yaw_degrees;
        Ok(())
    }

    fn latest_result(&self) -> Option<LlResult> {
        let state = lock(&self.state);
        if state.running {
            state.result.clone()
        } else {
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimHardware
// ────────────────────────────────────────────────────────────────────────────

/// A full simulated robot: every device the subsystems need, registered
/// under the configured names.
pub struct SimHardware {
    pub names: DeviceNames,
    pub front_left: Arc<SimMotor>,
    pub front_right: Arc<SimMotor>,
    pub back_left: Arc<SimMotor>,
    pub back_right: Arc<SimMotor>,
    pub flywheel: Arc<SimMotor>,
    pub hood_servo: Arc<SimServo>,
    pub transfer_servo: Arc<SimServo>,
    pub odometry: Arc<SimPinpoint>,
    pub limelight: Arc<SimLimelight>,
}

impl SimHardware {
    pub fn new(names: &DeviceNames) -> Self {
        Self {
            names: names.clone(),
            front_left: SimMotor::new(&names.front_left),
            front_right: SimMotor::new(&names.front_right),
            back_left: SimMotor::new(&names.back_left),
            back_right: SimMotor::new(&names.back_right),
            flywheel: SimMotor::new(&names.flywheel),
            hood_servo: SimServo::new(&names.hood_servo),
            transfer_servo: SimServo::new(&names.transfer_servo),
            odometry: SimPinpoint::new(&names.odometry),
            limelight: SimLimelight::new(&names.limelight),
        }
    }

    /// Build a [`HardwareMap`] sharing this robot's device handles.
    pub fn hardware_map(&self) -> HardwareMap {
        let n = &self.names;
        let mut map = HardwareMap::new();
        map.register_motor(n.front_left.as_str(), self.front_left.clone());
        map.register_motor(n.front_right.as_str(), self.front_right.clone());
        map.register_motor(n.back_left.as_str(), self.back_left.clone());
        map.register_motor(n.back_right.as_str(), self.back_right.clone());
        map.register_motor_ex(n.flywheel.as_str(), self.flywheel.clone());
        map.register_servo(n.hood_servo.as_str(), self.hood_servo.clone());
        map.register_servo(n.transfer_servo.as_str(), self.transfer_servo.clone());
        map.register_pinpoint(n.odometry.as_str(), self.odometry.clone());
        map.register_limelight(n.limelight.as_str(), self.limelight.clone());
        map
    }

    /// Powers currently on the four drive motors, `[fl, fr, bl, br]`.
    pub fn drive_powers(&self) -> [f64; 4] {
        [
            self.front_left.power(),
            self.front_right.power(),
            self.back_left.power(),
            self.back_right.power(),
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
