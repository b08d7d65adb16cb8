//! `ftc-opmode` – op mode lifecycle, configuration and telemetry.
//!
//! An [`OpMode`] is a driver-selectable program.  The [`OpModeRunner`]
//! drives it at the configured loop rate, feeding it gamepad input and
//! collecting its [`Telemetry`].
//!
//! # Modules
//!
//! - [`config`] – `robot.toml` loading with `FTC_*` environment overrides.
//! - [`logging`] – `tracing` subscriber and optional OTLP export.
//! - [`opmode`] – the [`OpMode`] trait and [`LoopContext`].
//! - [`runner`] – the fixed-rate [`OpModeRunner`].
//! - [`telemetry`] – per-tick caption/value frames.
//! - [`opmodes`] – `InitOpMode`, `TeleOp` and `ObeliskScan`.

pub mod config;
pub mod logging;
pub mod opmode;
pub mod opmodes;
pub mod runner;
pub mod telemetry;

pub use config::RobotConfig;
pub use opmode::{LoopContext, OpMode};
pub use runner::{Clock, DriverInput, IdleInput, OpModeRunner, RunSummary, StopReason};
pub use telemetry::{Telemetry, TelemetryFrame};
