//! `ftc-subsystems` – the robot's mechanisms.
//!
//! Each subsystem owns the device handles it needs (looked up once from the
//! [`HardwareMap`][ftc_hal::HardwareMap]) and exposes a small, synchronous
//! API that op modes call from their loop.  Nothing here blocks: time-based
//! behaviour is driven by the caller passing `now` into `update`.
//!
//! - [`drivetrain`] – four-motor mecanum drive with turtle mode.
//! - [`output`] – flywheel velocity loop, hood and the timed feeder.
//! - [`odometry`] – goBILDA Pinpoint wrapper and frame conversion.
//! - [`limelight`] – cached vision results and goal/obelisk queries.
//! - [`transfer`] – spike-mark colour layout.
//! - [`aim`] – goal alignment rotation controller.

pub mod aim;
pub mod drivetrain;
pub mod limelight;
pub mod odometry;
pub mod output;
pub mod transfer;

pub use aim::GoalAim;
pub use drivetrain::{Drivetrain, WheelPowers, mecanum_powers};
pub use limelight::{Limelight, VisionSettings};
pub use odometry::{Odometry, PodSettings};
pub use output::{FeederState, Output, OutputSettings};
pub use transfer::Transfer;
