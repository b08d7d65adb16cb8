//! Pre-match obelisk read.
//!
//! On start the limelight switches to the obelisk pipeline; each tick the
//! newest result is checked for an obelisk tag.  The first motif seen (or the
//! end of the scan window) finishes the scan and puts the targeting pipeline
//! back.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use ftc_hal::registry::HardwareMap;
use ftc_subsystems::limelight::Limelight;
use ftc_subsystems::transfer::Transfer;
use ftc_types::{HardwareError, Motif};

use crate::config::RobotConfig;
use crate::opmode::{LoopContext, OpMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Initialised, not started.
    Waiting,
    Scanning { since: Instant },
    Found { motif: Motif, spike_mark: Option<u8> },
    TimedOut,
}

pub struct ObeliskScan {
    limelight: Option<Limelight>,
    transfer: Transfer,
    timeout: Duration,
    state: ScanState,
}

impl Default for ObeliskScan {
    fn default() -> Self {
        Self::new()
    }
}

impl ObeliskScan {
    pub fn new() -> Self {
        Self {
            limelight: None,
            transfer: Transfer::new(),
            timeout: RobotConfig::default().scan_timeout(),
            state: ScanState::Waiting,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// The motif read, or [`Motif::Unknown`] until one is found.
    pub fn motif(&self) -> Motif {
        match self.state {
            ScanState::Found { motif, .. } => motif,
            _ => Motif::Unknown,
        }
    }

    fn finish(&mut self, state: ScanState) -> Result<(), HardwareError> {
        self.state = state;
        match state {
            ScanState::Found { motif, spike_mark } => {
                info!(%motif, ?spike_mark, "obelisk motif found");
            }
            _ => warn!(timeout_ms = self.timeout.as_millis() as u64, "obelisk scan timed out"),
        }
        match self.limelight.as_mut() {
            Some(ll) => ll.set_targeting_pipeline(),
            None => Ok(()),
        }
    }
}

fn not_initialised() -> HardwareError {
    HardwareError::Config("ObeliskScan used before init".to_string())
}

impl OpMode for ObeliskScan {
    fn name(&self) -> &str {
        "ObeliskScan"
    }

    fn init(
        &mut self,
        hardware_map: &HardwareMap,
        config: &RobotConfig,
    ) -> Result<(), HardwareError> {
        let mut limelight = Limelight::new(hardware_map, &config.devices, config.vision_settings())?;
        limelight.set_alliance(config.alliance);
        self.limelight = Some(limelight);
        self.timeout = config.scan_timeout();
        self.state = ScanState::Waiting;
        Ok(())
    }

    fn init_loop(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        ctx.telemetry.add_data("Status", "Waiting for start");
        Ok(())
    }

    fn start(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        let ll = self.limelight.as_mut().ok_or_else(not_initialised)?;
        ll.set_obelisk_pipeline()?;
        self.state = ScanState::Scanning { since: ctx.now };
        Ok(())
    }

    fn loop_tick(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
        let ll = self.limelight.as_mut().ok_or_else(not_initialised)?;

        if let ScanState::Scanning { since } = self.state {
            ll.update();
            let motif = ll.detected_motif();
            if motif != Motif::Unknown {
                let spike_mark = self.transfer.spike_mark_for_motif(motif);
                self.finish(ScanState::Found { motif, spike_mark })?;
            } else if ctx.now.saturating_duration_since(since) >= self.timeout {
                self.finish(ScanState::TimedOut)?;
            }
        }

        let t = &mut *ctx.telemetry;
        match self.state {
            ScanState::Waiting => t.add_data("Scan", "Waiting"),
            ScanState::Scanning { since } => {
                t.add_data("Scan", "Scanning");
                t.add_data(
                    "Elapsed (ms)",
                    ctx.now.saturating_duration_since(since).as_millis(),
                );
            }
            ScanState::Found { motif, spike_mark } => {
                t.add_data("Scan", "Found");
                t.add_data("Motif", motif);
                t.add_data(
                    "Spike Mark",
                    spike_mark.map_or_else(|| "-".to_string(), |m| m.to_string()),
                );
            }
            ScanState::TimedOut => {
                t.add_data("Scan", "Timed out");
                t.add_data("Motif", Motif::Unknown);
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HardwareError> {
        match self.limelight.as_mut() {
            Some(ll) => ll.stop(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftc_hal::gamepad::Gamepad;
    use ftc_hal::limelight::{FiducialResult, LlResult};
    use ftc_hal::registry::DeviceNames;
    use ftc_hal::sim::SimHardware;
    use ftc_subsystems::limelight::{OBELISK_PIPELINE_INDEX, TARGETING_PIPELINE_INDEX};
    use ftc_types::OBELISK_TAG_PGP;

    use crate::telemetry::Telemetry;

    fn ctx_at(now: Instant, telemetry: &mut Telemetry) -> LoopContext<'_> {
        LoopContext {
            now,
            dt: Duration::from_millis(20),
            tick: 0,
            gamepad1: Gamepad::default(),
            gamepad2: Gamepad::default(),
            telemetry,
        }
    }

    fn obelisk(id: i32) -> LlResult {
        LlResult {
            valid: true,
            pipeline_index: OBELISK_PIPELINE_INDEX,
            fiducials: vec![FiducialResult {
                fiducial_id: id,
                ..FiducialResult::default()
            }],
            ..LlResult::default()
        }
    }

    fn started() -> (SimHardware, ObeliskScan, Telemetry, Instant) {
        let sim = SimHardware::new(&DeviceNames::default());
        let mut op = ObeliskScan::new();
        op.init(&sim.hardware_map(), &RobotConfig::default()).unwrap();
        let mut telemetry = Telemetry::new();
        let t0 = Instant::now();
        op.start(&mut ctx_at(t0, &mut telemetry)).unwrap();
        (sim, op, telemetry, t0)
    }

    #[test]
    fn start_selects_obelisk_pipeline() {
        let (sim, op, _, _) = started();
        assert_eq!(sim.limelight.pipeline(), OBELISK_PIPELINE_INDEX);
        assert!(matches!(op.state(), ScanState::Scanning { .. }));
    }

    #[test]
    fn finds_motif_and_restores_pipeline() {
        let (sim, mut op, mut telemetry, t0) = started();
        op.loop_tick(&mut ctx_at(t0, &mut telemetry)).unwrap();
        assert_eq!(op.motif(), Motif::Unknown);

        sim.limelight.publish(Some(obelisk(OBELISK_TAG_PGP)));
        op.loop_tick(&mut ctx_at(t0 + Duration::from_millis(40), &mut telemetry))
            .unwrap();

        assert_eq!(
            op.state(),
            ScanState::Found {
                motif: Motif::Pgp,
                spike_mark: Some(2)
            }
        );
        assert_eq!(sim.limelight.pipeline(), TARGETING_PIPELINE_INDEX);
        let frame = telemetry.update();
        assert_eq!(frame.get("Motif"), Some("PGP"));
        assert_eq!(frame.get("Spike Mark"), Some("2"));
    }

    #[test]
    fn times_out_without_obelisk() {
        let (sim, mut op, mut telemetry, t0) = started();
        op.loop_tick(&mut ctx_at(t0 + Duration::from_millis(2999), &mut telemetry))
            .unwrap();
        assert!(matches!(op.state(), ScanState::Scanning { .. }));

        op.loop_tick(&mut ctx_at(t0 + Duration::from_secs(3), &mut telemetry))
            .unwrap();
        assert_eq!(op.state(), ScanState::TimedOut);
        assert_eq!(sim.limelight.pipeline(), TARGETING_PIPELINE_INDEX);
    }

    #[test]
    fn result_after_finish_is_ignored() {
        let (sim, mut op, mut telemetry, t0) = started();
        sim.limelight.publish(Some(obelisk(21)));
        op.loop_tick(&mut ctx_at(t0, &mut telemetry)).unwrap();
        sim.limelight.publish(Some(obelisk(23)));
        op.loop_tick(&mut ctx_at(t0, &mut telemetry)).unwrap();
        assert_eq!(op.motif(), Motif::Gpp);
    }
}
