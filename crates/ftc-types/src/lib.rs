//! `ftc-types` – value types shared by every crate in the workspace.
//!
//! - [`pose`] – distance/angle units, [`Pose2D`][pose::Pose2D],
//!   [`Pose3D`][pose::Pose3D] and the conversion between the odometry
//!   sensor's frame and the FTC field frame.
//! - Game enums ([`Alliance`], [`Motif`], [`ArtifactColor`]), motor enums,
//!   [`PidfCoefficients`] and the workspace error type [`HardwareError`].

pub mod pose;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AprilTag ID on the blue alliance goal.
pub const BLUE_GOAL_TAG_ID: i32 = 20;
/// AprilTag ID on the red alliance goal.
pub const RED_GOAL_TAG_ID: i32 = 24;
/// Obelisk tag showing the green-purple-purple motif.
pub const OBELISK_TAG_GPP: i32 = 21;
/// Obelisk tag showing the purple-green-purple motif.
pub const OBELISK_TAG_PGP: i32 = 22;
/// Obelisk tag showing the purple-purple-green motif.
pub const OBELISK_TAG_PPG: i32 = 23;

/// Alliance colour for the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    #[default]
    Blue,
}

impl Alliance {
    /// Parse an alliance name, case-insensitively.
    ///
    /// `"red"` maps to [`Alliance::Red`]; every other input, including an
    /// empty string, maps to [`Alliance::Blue`].
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("red") {
            Alliance::Red
        } else {
            Alliance::Blue
        }
    }

    /// AprilTag ID of this alliance's goal.
    pub const fn goal_tag_id(self) -> i32 {
        match self {
            Alliance::Red => RED_GOAL_TAG_ID,
            Alliance::Blue => BLUE_GOAL_TAG_ID,
        }
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alliance::Red => write!(f, "RED"),
            Alliance::Blue => write!(f, "BLUE"),
        }
    }
}

/// Colour of a game artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactColor {
    Purple,
    Green,
}

impl ArtifactColor {
    /// Single-letter code used on the field drawings (`'P'` / `'G'`).
    pub const fn code(self) -> char {
        match self {
            ArtifactColor::Purple => 'P',
            ArtifactColor::Green => 'G',
        }
    }
}

/// Artifact order displayed on the obelisk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Motif {
    Gpp,
    Pgp,
    Ppg,
    /// No obelisk tag visible.
    #[default]
    Unknown,
}

impl Motif {
    /// Map an obelisk AprilTag ID to its motif. Non-obelisk IDs give `None`.
    pub const fn from_tag_id(id: i32) -> Option<Self> {
        match id {
            OBELISK_TAG_GPP => Some(Motif::Gpp),
            OBELISK_TAG_PGP => Some(Motif::Pgp),
            OBELISK_TAG_PPG => Some(Motif::Ppg),
            _ => None,
        }
    }

    /// The colour order this motif asks for, or `None` for `Unknown`.
    pub const fn sequence(self) -> Option<[ArtifactColor; 3]> {
        use ArtifactColor::{Green as G, Purple as P};
        match self {
            Motif::Gpp => Some([G, P, P]),
            Motif::Pgp => Some([P, G, P]),
            Motif::Ppg => Some([P, P, G]),
            Motif::Unknown => None,
        }
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Motif::Gpp => "GPP",
            Motif::Pgp => "PGP",
            Motif::Ppg => "PPG",
            Motif::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Rotation direction of a motor relative to its commanded power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Motor controller run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Open-loop power control.
    #[default]
    RunWithoutEncoder,
    /// Closed-loop velocity control on the controller's PIDF loop.
    RunUsingEncoder,
    RunToPosition,
    /// Zero the encoder count; the motor does not move in this mode.
    StopAndResetEncoder,
}

/// Gains for a motor controller's velocity loop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidfCoefficients {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
}

impl PidfCoefficients {
    pub const fn new(p: f64, i: f64, d: f64, f: f64) -> Self {
        Self { p, i, d, f }
    }
}

/// Error type for hardware lookups, device writes and configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HardwareError {
    #[error("Device Not Found: no {kind} named '{name}' in the hardware map")]
    DeviceNotFound { name: String, kind: String },

    #[error("Device Fault on {device}: {details}")]
    DeviceFault { device: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}
