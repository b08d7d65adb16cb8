//! Goal alignment controller.
//!
//! Turns the horizontal angle to the alliance goal tag (degrees, from
//! [`Limelight::rotation_error_to_goal`][crate::limelight::Limelight::rotation_error_to_goal])
//! into a drivetrain rotation command.  It is a proportional–derivative
//! controller with a deadband and a symmetric output clamp; there is no
//! integral term because the heading error is re-measured every frame.
//!
//! # Example
//!
//! ```rust
//! use ftc_subsystems::aim::GoalAim;
//!
//! let mut aim = GoalAim::new(0.03, 0.0);
//! // Tag is 10° to the right: turn clockwise (positive rotation).
//! let rotation = aim.update(10.0, 0.02);
//! assert!((rotation - 0.3).abs() < 1e-9);
//! ```

/// Rotation controller for holding a goal lock.
#[derive(Debug, Clone)]
pub struct GoalAim {
    kp: f64,
    kd: f64,
    deadband_deg: f64,
    max_rotation: f64,
    last_error: Option<f64>,
}

impl GoalAim {
    /// Create a controller with the given gains, a 1° deadband and output
    /// limited to `[-0.5, 0.5]`.
    pub fn new(kp: f64, kd: f64) -> Self {
        Self {
            kp,
            kd,
            deadband_deg: 1.0,
            max_rotation: 0.5,
            last_error: None,
        }
    }

    pub fn with_deadband(mut self, degrees: f64) -> Self {
        self.deadband_deg = degrees.abs();
        self
    }

    pub fn with_max_rotation(mut self, max: f64) -> Self {
        self.max_rotation = max.abs();
        self
    }

    pub fn set_gains(&mut self, kp: f64, kd: f64) {
        self.kp = kp;
        self.kd = kd;
    }

    /// Rotation command for a heading error of `error_deg` measured `dt`
    /// seconds after the previous call.
    ///
    /// Errors inside the deadband give `0.0` and clear derivative memory.  A
    /// non-positive `dt` gives the proportional term only.
    pub fn update(&mut self, error_deg: f64, dt: f64) -> f64 {
        if error_deg.abs() <= self.deadband_deg {
            self.last_error = None;
            return 0.0;
        }

        let p = self.kp * error_deg;
        let d = match self.last_error {
            Some(prev) if dt > 0.0 => self.kd * (error_deg - prev) / dt,
            _ => 0.0,
        };
        self.last_error = Some(error_deg);

        (p + d).clamp(-self.max_rotation, self.max_rotation)
    }

    /// Forget derivative memory, e.g. when the lock is released.
    pub fn reset(&mut self) {
        self.last_error = None;
    }
}
