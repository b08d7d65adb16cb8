//! Base op mode: builds the drivetrain and idles.

use ftc_hal::registry::HardwareMap;
use ftc_subsystems::drivetrain::Drivetrain;
use ftc_types::HardwareError;

use crate::config::RobotConfig;
use crate::opmode::{LoopContext, OpMode};

#[derive(Default)]
pub struct InitOpMode {
    drivetrain: Option<Drivetrain>,
}

impl InitOpMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drivetrain(&self) -> Option<&Drivetrain> {
        self.drivetrain.as_ref()
    }
}

impl OpMode for InitOpMode {
    fn name(&self) -> &str {
        "InitOpMode"
    }

    fn init(
        &mut self,
        hardware_map: &HardwareMap,
        config: &RobotConfig,
    ) -> Result<(), HardwareError> {
        let mut drivetrain = Drivetrain::new(hardware_map, &config.devices)?;
        drivetrain.set_turtle_multiplier(config.drivetrain.turtle_multiplier);
        self.drivetrain = Some(drivetrain);
        Ok(())
    }

    fn loop_tick(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        ctx.telemetry.add_data("Status", "Initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftc_hal::registry::DeviceNames;
    use ftc_hal::sim::SimHardware;

    #[test]
    fn init_builds_drivetrain() {
        let sim = SimHardware::new(&DeviceNames::default());
        let mut op = InitOpMode::new();
        op.init(&sim.hardware_map(), &RobotConfig::default()).unwrap();
        assert!(op.drivetrain().is_some());
    }

    #[test]
    fn init_fails_on_empty_map() {
        let mut op = InitOpMode::new();
        let err = op
            .init(&HardwareMap::new(), &RobotConfig::default())
            .unwrap_err();
        assert!(matches!(err, HardwareError::DeviceNotFound { .. }));
        assert!(op.drivetrain().is_none());
    }
}
