//! Op modes selectable from the driver station (or `ftc-sim`).

pub mod init;
pub mod obelisk_scan;
pub mod teleop;

pub use init::InitOpMode;
pub use obelisk_scan::{ObeliskScan, ScanState};
pub use teleop::TeleOp;
