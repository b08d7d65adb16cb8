//! [`HardwareMap`] – name-keyed registry of device handles.
//!
//! Devices are registered under the names used in the robot configuration
//! (e.g. `"frontLeft"`, `"odo"`, `"limelight"`).  Subsystems look their
//! devices up by name at construction and keep the returned shared handles;
//! the map itself keeps a handle too, so several subsystems may share one
//! device.
//!
//! A lookup for a name that was never registered, or was registered as a
//! different kind of device, returns [`HardwareError::DeviceNotFound`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ftc_types::HardwareError;

use crate::limelight::Limelight3A;
use crate::motor::{DcMotor, DcMotorEx};
use crate::pinpoint::PinpointDriver;
use crate::servo::Servo;

/// Configured names of every device the robot uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceNames {
    pub front_left: String,
    pub front_right: String,
    pub back_left: String,
    pub back_right: String,
    pub flywheel: String,
    pub hood_servo: String,
    pub transfer_servo: String,
    pub odometry: String,
    pub limelight: String,
}

impl Default for DeviceNames {
    fn default() -> Self {
        Self {
            front_left: "frontLeft".to_string(),
            front_right: "frontRight".to_string(),
            back_left: "backLeft".to_string(),
            back_right: "backRight".to_string(),
            flywheel: "flywheelMotor".to_string(),
            hood_servo: "hoodServo".to_string(),
            transfer_servo: "transferServo".to_string(),
            odometry: "odo".to_string(),
            limelight: "limelight".to_string(),
        }
    }
}

/// Name-keyed device registry handed to subsystems at construction.
#[derive(Default, Clone)]
pub struct HardwareMap {
    motors: HashMap<String, Arc<dyn DcMotor>>,
    motors_ex: HashMap<String, Arc<dyn DcMotorEx>>,
    servos: HashMap<String, Arc<dyn Servo>>,
    pinpoints: HashMap<String, Arc<dyn PinpointDriver>>,
    limelights: HashMap<String, Arc<dyn Limelight3A>>,
}

impl HardwareMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain motor.  Replaces any motor already using `name`.
    pub fn register_motor<M: DcMotor + 'static>(&mut self, name: impl Into<String>, motor: Arc<M>) {
        let name = name.into();
        debug!(device = %name, "registered DcMotor");
        self.motors_ex.remove(&name);
        self.motors.insert(name, motor);
    }

    /// Register an encoder motor.  It is also reachable through
    /// [`motor`][Self::motor].
    pub fn register_motor_ex<M: DcMotorEx + 'static>(
        &mut self,
        name: impl Into<String>,
        motor: Arc<M>,
    ) {
        let name = name.into();
        debug!(device = %name, "registered DcMotorEx");
        self.motors.insert(name.clone(), motor.clone());
        self.motors_ex.insert(name, motor);
    }

    pub fn register_servo<S: Servo + 'static>(&mut self, name: impl Into<String>, servo: Arc<S>) {
        let name = name.into();
        debug!(device = %name, "registered Servo");
        self.servos.insert(name, servo);
    }

    pub fn register_pinpoint<P: PinpointDriver + 'static>(
        &mut self,
        name: impl Into<String>,
        driver: Arc<P>,
    ) {
        let name = name.into();
        debug!(device = %name, "registered PinpointDriver");
        self.pinpoints.insert(name, driver);
    }

    pub fn register_limelight<L: Limelight3A + 'static>(
        &mut self,
        name: impl Into<String>,
        limelight: Arc<L>,
    ) {
        let name = name.into();
        debug!(device = %name, "registered Limelight3A");
        self.limelights.insert(name, limelight);
    }

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no motor uses `name`.
    pub fn motor(&self, name: &str) -> Result<Arc<dyn DcMotor>, HardwareError> {
        lookup(&self.motors, name, "DcMotor")
    }

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no encoder motor uses
    /// `name`.
    pub fn motor_ex(&self, name: &str) -> Result<Arc<dyn DcMotorEx>, HardwareError> {
        lookup(&self.motors_ex, name, "DcMotorEx")
    }

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no servo uses `name`.
    pub fn servo(&self, name: &str) -> Result<Arc<dyn Servo>, HardwareError> {
        lookup(&self.servos, name, "Servo")
    }

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no Pinpoint uses `name`.
    pub fn pinpoint(&self, name: &str) -> Result<Arc<dyn PinpointDriver>, HardwareError> {
        lookup(&self.pinpoints, name, "PinpointDriver")
    }

    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if no Limelight uses `name`.
    pub fn limelight(&self, name: &str) -> Result<Arc<dyn Limelight3A>, HardwareError> {
        lookup(&self.limelights, name, "Limelight3A")
    }

    /// Number of registered devices across all kinds.  Encoder motors count
    /// once.
    pub fn len(&self) -> usize {
        self.motors.len() + self.servos.len() + self.pinpoints.len() + self.limelights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lookup<T: ?Sized>(
    map: &HashMap<String, Arc<T>>,
    name: &str,
    kind: &str,
) -> Result<Arc<T>, HardwareError> {
    map.get(name)
        .cloned()
        .ok_or_else(|| HardwareError::DeviceNotFound {
            name: name.to_string(),
            kind: kind.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use ftc_types::Direction;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockMotor {
        power: Mutex<f64>,
    }
    impl DcMotor for MockMotor {
        fn set_direction(&self, _direction: Direction) -> Result<(), HardwareError> {
            Ok(())
        }
        fn direction(&self) -> Direction {
            Direction::Forward
        }
        fn set_power(&self, power: f64) -> Result<(), HardwareError> {
            *self.power.lock().unwrap() = power;
            Ok(())
        }
        fn power(&self) -> f64 {
            *self.power.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct MockServo {
        position: Mutex<f64>,
    }
    impl Servo for MockServo {
        fn set_position(&self, position: f64) -> Result<(), HardwareError> {
            *self.position.lock().unwrap() = position;
            Ok(())
        }
        fn position(&self) -> f64 {
            *self.position.lock().unwrap()
        }
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn lookup_returns_shared_handle() {
        let mut map = HardwareMap::new();
        let motor = Arc::new(MockMotor::default());
        map.register_motor("frontLeft", motor.clone());

        map.motor("frontLeft").unwrap().set_power(0.4).unwrap();
        assert!((motor.power() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_device_returns_not_found() {
        let map = HardwareMap::new();
        let err = map.servo("hoodServo").err().unwrap();
        assert!(matches!(
            err,
            HardwareError::DeviceNotFound { ref name, ref kind } if name == "hoodServo" && kind == "Servo"
        ));
    }

    #[test]
    fn wrong_kind_is_not_found() {
        let mut map = HardwareMap::new();
        map.register_servo("hoodServo", Arc::new(MockServo::default()));
        assert!(map.motor("hoodServo").is_err());
        assert!(map.servo("hoodServo").is_ok());
    }

    #[test]
    fn plain_motor_is_not_an_encoder_motor() {
        let mut map = HardwareMap::new();
        map.register_motor("frontLeft", Arc::new(MockMotor::default()));
        assert!(map.motor_ex("frontLeft").is_err());
    }

    #[test]
    fn re_registering_replaces_old_device() {
        let mut map = HardwareMap::new();
        let first = Arc::new(MockServo::default());
        let second = Arc::new(MockServo::default());
        map.register_servo("transferServo", first.clone());
        map.register_servo("transferServo", second.clone());

        map.servo("transferServo").unwrap().set_position(0.5).unwrap();
        assert!(first.position().abs() < f64::EPSILON);
        assert!((second.position() - 0.5).abs() < f64::EPSILON);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn default_device_names_match_robot_configuration() {
        let names = DeviceNames::default();
        assert_eq!(names.front_left, "frontLeft");
        assert_eq!(names.flywheel, "flywheelMotor");
        assert_eq!(names.odometry, "odo");
        assert_eq!(names.limelight, "limelight");
    }
}
