//! Mecanum drivetrain.
//!
//! Four independently driven mecanum wheels let the robot translate in any
//! direction while rotating.  Each wheel's power is a signed sum of the
//! forward, strafe and rotation commands; when any sum leaves `[-1, 1]` all
//! four are divided by the largest magnitude so their ratios (and therefore
//! the direction of travel) are preserved.
//!
//! "Turtle mode" is a driver-selectable slow mode that scales every wheel by
//! a fixed multiplier after normalisation.

use std::sync::Arc;

use tracing::debug;

use ftc_hal::gamepad::Gamepad;
use ftc_hal::motor::DcMotor;
use ftc_hal::registry::{DeviceNames, HardwareMap};
use ftc_types::{Direction, HardwareError};

/// Default turtle-mode speed fraction.
pub const DEFAULT_TURTLE_MULTIPLIER: f64 = 0.6;

/// Per-wheel powers, front-left / front-right / back-left / back-right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelPowers {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

impl WheelPowers {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    /// Largest absolute wheel power.
    pub fn max_magnitude(&self) -> f64 {
        self.as_array().iter().fold(0.0_f64, |m, p| m.max(p.abs()))
    }

    fn scaled(self, k: f64) -> Self {
        Self {
            front_left: self.front_left * k,
            front_right: self.front_right * k,
            back_left: self.back_left * k,
            back_right: self.back_right * k,
        }
    }
}

/// Mix `x` (strafe, right positive), `y` (forward) and `rotation`
/// (clockwise positive) into normalised wheel powers.
///
/// The normaliser is floored at 1.0, so inputs that already fit are passed
/// through unscaled and the division is never by zero.
pub fn mecanum_powers(x: f64, y: f64, rotation: f64) -> WheelPowers {
    let raw = WheelPowers {
        front_left: y + x + rotation,
        front_right: y - x - rotation,
        back_left: y - x + rotation,
        back_right: y + x - rotation,
    };
    let max = raw.max_magnitude().max(1.0);
    WheelPowers {
        front_left: raw.front_left / max,
        front_right: raw.front_right / max,
        back_left: raw.back_left / max,
        back_right: raw.back_right / max,
    }
}

/// The four-motor mecanum drivetrain.
pub struct Drivetrain {
    front_left: Arc<dyn DcMotor>,
    front_right: Arc<dyn DcMotor>,
    back_left: Arc<dyn DcMotor>,
    back_right: Arc<dyn DcMotor>,
    turtle_mode: bool,
    turtle_multiplier: f64,
    powers: WheelPowers,
}

impl Drivetrain {
    /// Look up the four drive motors and reverse the left side.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeviceNotFound`] if a motor is missing from
    /// the map, or the driver's error if the direction write fails.
    pub fn new(hardware_map: &HardwareMap, names: &DeviceNames) -> Result<Self, HardwareError> {
        let drivetrain = Self {
            front_left: hardware_map.motor(&names.front_left)?,
            front_right: hardware_map.motor(&names.front_right)?,
            back_left: hardware_map.motor(&names.back_left)?,
            back_right: hardware_map.motor(&names.back_right)?,
            turtle_mode: false,
            turtle_multiplier: DEFAULT_TURTLE_MULTIPLIER,
            powers: WheelPowers::default(),
        };

        drivetrain.front_left.set_direction(Direction::Reverse)?;
        drivetrain.back_left.set_direction(Direction::Reverse)?;

        Ok(drivetrain)
    }

    /// Drive from a gamepad sample: left stick translates, right stick X
    /// rotates.  The stick's Y axis is inverted so pushing up drives forward.
    ///
    /// # Errors
    ///
    /// Propagates motor write failures.
    pub fn move_with_gamepad(&mut self, gamepad: &Gamepad) -> Result<(), HardwareError> {
        let y = -gamepad.left_stick_y;
        let x = gamepad.left_stick_x;
        let rx = gamepad.right_stick_x;
        self.drive(x, y, rx)
    }

    /// Drive with explicit strafe, forward and rotation commands.
    ///
    /// # Errors
    ///
    /// Propagates motor write failures.
    pub fn drive(&mut self, x: f64, y: f64, rotation: f64) -> Result<(), HardwareError> {
        let mut powers = mecanum_powers(x, y, rotation);
        if self.turtle_mode {
            powers = powers.scaled(self.turtle_multiplier);
        }
        self.powers = powers;

        self.front_left.set_power(powers.front_left)?;
        self.front_right.set_power(powers.front_right)?;
        self.back_left.set_power(powers.back_left)?;
        self.back_right.set_power(powers.back_right)?;
        Ok(())
    }

    /// Zero all four wheels.
    ///
    /// # Errors
    ///
    /// Propagates motor write failures.
    pub fn stop(&mut self) -> Result<(), HardwareError> {
        self.drive(0.0, 0.0, 0.0)
    }

    pub fn set_turtle_mode(&mut self, enabled: bool) {
        if enabled != self.turtle_mode {
            debug!(enabled, "turtle mode changed");
        }
        self.turtle_mode = enabled;
    }

    pub fn is_turtle_mode(&self) -> bool {
        self.turtle_mode
    }

    /// Set the slow-mode speed fraction, e.g. `0.6` for 60 %.
    pub fn set_turtle_multiplier(&mut self, multiplier: f64) {
        self.turtle_multiplier = multiplier;
    }

    pub fn turtle_multiplier(&self) -> f64 {
        self.turtle_multiplier
    }

    /// Powers sent on the last drive call.
    pub fn powers(&self) -> WheelPowers {
        self.powers
    }

    pub fn front_left_power(&self) -> f64 {
        self.powers.front_left
    }

    pub fn front_right_power(&self) -> f64 {
        self.powers.front_right
    }

    pub fn back_left_power(&self) -> f64 {
        self.powers.back_left
    }

    pub fn back_right_power(&self) -> f64 {
        self.powers.back_right
    }
}
