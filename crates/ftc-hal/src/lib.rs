//! `ftc-hal` – hardware abstraction for the robot's devices.
//!
//! Subsystems never see a concrete driver: they look devices up by name in a
//! [`HardwareMap`][registry::HardwareMap] and talk to the traits below.  A
//! binding to the real controller firmware implements the same traits; the
//! [`sim`] module provides in-process drivers for tests and the simulation
//! CLI.
//!
//! # Modules
//!
//! - [`motor`] – [`DcMotor`][motor::DcMotor] (power/direction) and
//!   [`DcMotorEx`][motor::DcMotorEx] (encoder velocity loop, PIDF).
//! - [`servo`] – positional [`Servo`][servo::Servo].
//! - [`pinpoint`] – goBILDA Pinpoint odometry computer.
//! - [`limelight`] – Limelight 3A vision coprocessor and its result types.
//! - [`gamepad`] – driver-station [`Gamepad`][gamepad::Gamepad] samples.
//! - [`registry`] – the name-keyed [`HardwareMap`][registry::HardwareMap].
//! - [`sim`] – simulated drivers and the [`SimHardware`][sim::SimHardware]
//!   robot.

pub mod gamepad;
pub mod limelight;
pub mod motor;
pub mod pinpoint;
pub mod registry;
pub mod servo;
pub mod sim;

pub use gamepad::{Button, Gamepad};
pub use limelight::{FiducialResult, Limelight3A, LlResult};
pub use motor::{DcMotor, DcMotorEx};
pub use pinpoint::{EncoderDirection, GoBildaOdometryPods, PinpointDriver};
pub use registry::{DeviceNames, HardwareMap};
pub use servo::Servo;
