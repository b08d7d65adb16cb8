//! Units, poses and the two field-frame conventions used on the robot.
//!
//! The odometry computer reports poses in its own frame (X forward, Y left,
//! heading counter-clockwise) while the FTC field frame puts X along the
//! strafe axis (right positive) and Y forward.  [`pinpoint_to_ftc`] and
//! [`ftc_to_pinpoint`] convert between the two and are inverses of each
//! other.
//!
//! # Example
//!
//! ```rust
//! use ftc_types::pose::{AngleUnit, DistanceUnit, Pose2D, ftc_to_pinpoint, pinpoint_to_ftc};
//!
//! let ftc = Pose2D::new(DistanceUnit::Inch, 10.0, 24.0, AngleUnit::Degrees, 90.0);
//! let pinpoint = ftc_to_pinpoint(ftc);
//! assert!((pinpoint.x(DistanceUnit::Inch) - 24.0).abs() < 1e-9);
//! assert!((pinpoint.y(DistanceUnit::Inch) + 10.0).abs() < 1e-9);
//! assert!(pinpoint_to_ftc(pinpoint).approx_eq(&ftc, 1e-9));
//! ```

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Units
// ────────────────────────────────────────────────────────────────────────────

const MM_PER_INCH: f64 = 25.4;

/// Linear unit attached to a distance value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Mm,
    Cm,
    Meter,
    Inch,
}

impl DistanceUnit {
    /// Convert `value` expressed in this unit to millimetres.
    pub fn to_mm(self, value: f64) -> f64 {
        value * self.mm_per_unit()
    }

    /// Convert `mm` millimetres to this unit.
    pub fn from_mm(self, mm: f64) -> f64 {
        mm / self.mm_per_unit()
    }

    const fn mm_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Mm => 1.0,
            DistanceUnit::Cm => 10.0,
            DistanceUnit::Meter => 1000.0,
            DistanceUnit::Inch => MM_PER_INCH,
        }
    }
}

/// Angular unit attached to a heading value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Radians,
    Degrees,
}

impl AngleUnit {
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }

    pub fn from_radians(self, rad: f64) -> f64 {
        match self {
            AngleUnit::Radians => rad,
            AngleUnit::Degrees => rad.to_degrees(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose2D
// ────────────────────────────────────────────────────────────────────────────

/// A planar pose.  Stored in millimetres and radians; read back in any unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    x_mm: f64,
    y_mm: f64,
    heading_rad: f64,
}

impl Pose2D {
    /// Build a pose from values in the given units.
    pub fn new(
        distance_unit: DistanceUnit,
        x: f64,
        y: f64,
        angle_unit: AngleUnit,
        heading: f64,
    ) -> Self {
        Self {
            x_mm: distance_unit.to_mm(x),
            y_mm: distance_unit.to_mm(y),
            heading_rad: angle_unit.to_radians(heading),
        }
    }

    /// The origin with zero heading.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn x(&self, unit: DistanceUnit) -> f64 {
        unit.from_mm(self.x_mm)
    }

    pub fn y(&self, unit: DistanceUnit) -> f64 {
        unit.from_mm(self.y_mm)
    }

    pub fn heading(&self, unit: AngleUnit) -> f64 {
        unit.from_radians(self.heading_rad)
    }

    /// Component-wise comparison with tolerance `eps` (mm and rad).
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x_mm - other.x_mm).abs() <= eps
            && (self.y_mm - other.y_mm).abs() <= eps
            && (self.heading_rad - other.heading_rad).abs() <= eps
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose3D
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation as yaw/pitch/roll in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YawPitchRollAngles {
    yaw_rad: f64,
    pitch_rad: f64,
    roll_rad: f64,
}

impl YawPitchRollAngles {
    pub fn new(unit: AngleUnit, yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            yaw_rad: unit.to_radians(yaw),
            pitch_rad: unit.to_radians(pitch),
            roll_rad: unit.to_radians(roll),
        }
    }

    pub fn yaw(&self, unit: AngleUnit) -> f64 {
        unit.from_radians(self.yaw_rad)
    }

    pub fn pitch(&self, unit: AngleUnit) -> f64 {
        unit.from_radians(self.pitch_rad)
    }

    pub fn roll(&self, unit: AngleUnit) -> f64 {
        unit.from_radians(self.roll_rad)
    }
}

/// A 3-D pose as reported by the vision coprocessor (FTC field frame,
/// metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3D {
    pub position: Position,
    pub orientation: YawPitchRollAngles,
}

impl Pose3D {
    pub const fn new(position: Position, orientation: YawPitchRollAngles) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Drop height, pitch and roll, keeping x/y and yaw.
    pub fn to_pose2d(&self) -> Pose2D {
        Pose2D::new(
            DistanceUnit::Meter,
            self.position.x,
            self.position.y,
            AngleUnit::Radians,
            self.orientation.yaw(AngleUnit::Radians),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Frame conversion
// ────────────────────────────────────────────────────────────────────────────

/// Odometry frame (X forward, Y left) to FTC field frame (X right, Y forward).
///
/// `ftc.x = -pinpoint.y`, `ftc.y = pinpoint.x`; heading is shared.
pub fn pinpoint_to_ftc(pose: Pose2D) -> Pose2D {
    Pose2D {
        x_mm: -pose.y_mm,
        y_mm: pose.x_mm,
        heading_rad: pose.heading_rad,
    }
}

/// FTC field frame to odometry frame.
///
/// `pinpoint.x = ftc.y`, `pinpoint.y = -ftc.x`; heading is shared.
pub fn ftc_to_pinpoint(pose: Pose2D) -> Pose2D {
    Pose2D {
        x_mm: pose.y_mm,
        y_mm: -pose.x_mm,
        heading_rad: pose.heading_rad,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_units_convert_through_mm() {
        assert!((DistanceUnit::Inch.to_mm(1.0) - 25.4).abs() < 1e-12);
        assert!((DistanceUnit::Meter.from_mm(2500.0) - 2.5).abs() < 1e-12);
        assert!((DistanceUnit::Cm.to_mm(3.0) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn pose2d_reads_back_in_other_units() {
        let p = Pose2D::new(DistanceUnit::Meter, 1.0, -0.5, AngleUnit::Degrees, 180.0);
        assert!((p.x(DistanceUnit::Mm) - 1000.0).abs() < 1e-9);
        assert!((p.y(DistanceUnit::Cm) + 50.0).abs() < 1e-9);
        assert!((p.heading(AngleUnit::Radians) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn pinpoint_forward_is_ftc_forward() {
        // 100 mm forward on the sensor is +Y on the field.
        let p = Pose2D::new(DistanceUnit::Mm, 100.0, 0.0, AngleUnit::Radians, 0.3);
        let f = pinpoint_to_ftc(p);
        assert!(f.x(DistanceUnit::Mm).abs() < 1e-12);
        assert!((f.y(DistanceUnit::Mm) - 100.0).abs() < 1e-12);
        assert!((f.heading(AngleUnit::Radians) - 0.3).abs() < 1e-12);

        // Sensor +Y is left, which is -X on the field.
        let left = Pose2D::new(DistanceUnit::Mm, 0.0, 50.0, AngleUnit::Radians, 0.0);
        assert!((pinpoint_to_ftc(left).x(DistanceUnit::Mm) + 50.0).abs() < 1e-12);
    }

    #[test]
    fn frame_conversion_is_its_own_inverse() {
        let samples = [-1500.0, -12.5, 0.0, 3.25, 900.0];
        for &x in &samples {
            for &y in &samples {
                for &h in &[-3.0, 0.0, 1.2] {
                    let p = Pose2D::new(DistanceUnit::Mm, x, y, AngleUnit::Radians, h);
                    assert!(ftc_to_pinpoint(pinpoint_to_ftc(p)).approx_eq(&p, 1e-9));
                    assert!(pinpoint_to_ftc(ftc_to_pinpoint(p)).approx_eq(&p, 1e-9));
                }
            }
        }
    }

    #[test]
    fn pose3d_flattens_to_pose2d() {
        let p = Pose3D::new(
            Position::new(1.2, -0.4, 0.3),
            YawPitchRollAngles::new(AngleUnit::Degrees, 45.0, 5.0, 0.0),
        );
        let flat = p.to_pose2d();
        assert!((flat.x(DistanceUnit::Mm) - 1200.0).abs() < 1e-9);
        assert!((flat.y(DistanceUnit::Mm) + 400.0).abs() < 1e-9);
        assert!((flat.heading(AngleUnit::Degrees) - 45.0).abs() < 1e-9);
    }
}
