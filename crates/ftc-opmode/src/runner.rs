//! [`OpModeRunner`] – drives an [`OpMode`] through its lifecycle at a fixed
//! rate.
//!
//! The runner owns the clock and the telemetry buffer.  Each step it polls a
//! [`DriverInput`] for both gamepads, hands the op mode a [`LoopContext`],
//! and publishes the resulting [`TelemetryFrame`] to the caller.
//!
//! A run ends when the tick budget is spent or the stop flag is raised (for
//! example from a Ctrl-C handler holding [`OpModeRunner::stop_handle`]).
//! Errors from `init` abort the run; errors from any later phase are logged
//! and counted, and the loop keeps going.
//!
//! # Example
//!
//! ```rust
//! use ftc_hal::registry::DeviceNames;
//! use ftc_hal::sim::SimHardware;
//! use ftc_opmode::config::RobotConfig;
//! use ftc_opmode::opmodes::InitOpMode;
//! use ftc_opmode::runner::{Clock, IdleInput, OpModeRunner};
//!
//! let config = RobotConfig::default();
//! let sim = SimHardware::new(&DeviceNames::default());
//! let mut runner = OpModeRunner::from_config(&config)
//!     .with_clock(Clock::Simulated)
//!     .with_max_ticks(5);
//!
//! let summary = runner
//!     .run(&mut InitOpMode::new(), &sim.hardware_map(), &config, &mut IdleInput, |_| {})
//!     .unwrap();
//! assert_eq!(summary.ticks, 5);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use ftc_hal::gamepad::Gamepad;
use ftc_hal::registry::HardwareMap;
use ftc_types::HardwareError;

use crate::config::RobotConfig;
use crate::opmode::{LoopContext, OpMode};
use crate::telemetry::{Telemetry, TelemetryFrame};

/// Source of driver input, polled once per step.
pub trait DriverInput {
    /// Both gamepads for step `step` (counted from the first init-loop call).
    fn poll(&mut self, step: u64) -> [Gamepad; 2];
}

impl<F> DriverInput for F
where
    F: FnMut(u64) -> [Gamepad; 2],
{
    fn poll(&mut self, step: u64) -> [Gamepad; 2] {
        self(step)
    }
}

/// Hands off the controls.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleInput;

impl DriverInput for IdleInput {
    fn poll(&mut self, _step: u64) -> [Gamepad; 2] {
        [Gamepad::default(); 2]
    }
}

/// Where tick timestamps come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall clock; the runner sleeps out the remainder of each period.
    #[default]
    Realtime,
    /// Step `n` is stamped `origin + n * period` and nothing sleeps.
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickBudget,
    StopRequested,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of `loop_tick` calls.
    pub ticks: u64,
    /// Errors logged after init.
    pub faults: u64,
    pub stop_reason: StopReason,
    pub last_frame: Option<TelemetryFrame>,
}

struct Ticker {
    clock: Clock,
    period: Duration,
    origin: Instant,
    step: u64,
    last: Option<Instant>,
}

impl Ticker {
    fn new(clock: Clock, period: Duration) -> Self {
        Self {
            clock,
            period,
            origin: Instant::now(),
            step: 0,
            last: None,
        }
    }

    /// Wait for (or synthesise) the next step; returns `(step, now, dt)`.
    fn next(&mut self) -> (u64, Instant, Duration) {
        let scheduled = self.origin + self.period * self.step_u32();
        let now = match self.clock {
            Clock::Simulated => scheduled,
            Clock::Realtime => {
                let wall = Instant::now();
                if scheduled > wall {
                    std::thread::sleep(scheduled - wall);
                }
                Instant::now()
            }
        };
        let dt = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        let step = self.step;
        self.step += 1;
        self.last = Some(now);
        (step, now, dt)
    }

    fn step_u32(&self) -> u32 {
        u32::try_from(self.step).unwrap_or(u32::MAX)
    }
}

/// Fixed-rate op mode driver.
pub struct OpModeRunner {
    period: Duration,
    clock: Clock,
    max_ticks: Option<u64>,
    init_loop_ticks: u64,
    stop: Arc<AtomicBool>,
    telemetry: Telemetry,
}

impl OpModeRunner {
    /// Real-time runner with no tick budget and one init-loop step.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            clock: Clock::Realtime,
            max_ticks: None,
            init_loop_ticks: 1,
            stop: Arc::new(AtomicBool::new(false)),
            telemetry: Telemetry::new(),
        }
    }

    pub fn from_config(config: &RobotConfig) -> Self {
        Self::new(config.loop_period())
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Stop after `ticks` loop ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn with_init_loop_ticks(mut self, ticks: u64) -> Self {
        self.init_loop_ticks = ticks;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Shared flag; storing `true` ends the run before the next step.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run `op_mode` to completion.
    ///
    /// `on_frame` receives the telemetry published after every init-loop
    /// step, after `start`, and after every loop step.
    ///
    /// # Errors
    ///
    /// Returns the op mode's `init` error; nothing else is fatal.
    pub fn run(
        &mut self,
        op_mode: &mut dyn OpMode,
        hardware_map: &HardwareMap,
        config: &RobotConfig,
        input: &mut dyn DriverInput,
        mut on_frame: impl FnMut(&TelemetryFrame),
    ) -> Result<RunSummary, HardwareError> {
        let name = op_mode.name().to_string();
        info!(op_mode = %name, period_ms = self.period.as_millis() as u64, "op mode init");
        if let Err(e) = op_mode.init(hardware_map, config) {
            warn!(op_mode = %name, error = %e, "op mode init failed");
            return Err(e);
        }

        self.telemetry.clear();
        let mut ticker = Ticker::new(self.clock, self.period);
        let mut faults = 0u64;
        let mut last_frame = None;

        for _ in 0..self.init_loop_ticks {
            if self.stop_requested() {
                break;
            }
            let (step, now, dt) = ticker.next();
            let [gamepad1, gamepad2] = input.poll(step);
            let mut ctx = LoopContext {
                now,
                dt,
                tick: step,
                gamepad1,
                gamepad2,
                telemetry: &mut self.telemetry,
            };
            if let Err(e) = op_mode.init_loop(&mut ctx) {
                faults += 1;
                warn!(op_mode = %name, step, error = %e, "init_loop failed");
            }
            let frame = self.telemetry.update();
            on_frame(&frame);
            last_frame = Some(frame);
        }

        let mut ticks = 0u64;
        let stop_reason = if self.stop_requested() {
            StopReason::StopRequested
        } else {
            info!(op_mode = %name, "op mode start");
            let (step, now, dt) = ticker.next();
            let [gamepad1, gamepad2] = input.poll(step);
            let mut ctx = LoopContext {
                now,
                dt,
                tick: step,
                gamepad1,
                gamepad2,
                telemetry: &mut self.telemetry,
            };
            if let Err(e) = op_mode.start(&mut ctx) {
                faults += 1;
                warn!(op_mode = %name, error = %e, "start failed");
            }
            let frame = self.telemetry.update();
            on_frame(&frame);
            last_frame = Some(frame);

            loop {
                if self.stop_requested() {
                    break StopReason::StopRequested;
                }
                if self.max_ticks.is_some_and(|max| ticks >= max) {
                    break StopReason::TickBudget;
                }
                let (step, now, dt) = ticker.next();
                let [gamepad1, gamepad2] = input.poll(step);
                let mut ctx = LoopContext {
                    now,
                    dt,
                    tick: step,
                    gamepad1,
                    gamepad2,
                    telemetry: &mut self.telemetry,
                };
                if let Err(e) = op_mode.loop_tick(&mut ctx) {
                    faults += 1;
                    warn!(op_mode = %name, step, error = %e, "loop tick failed");
                }
                ticks += 1;
                let frame = self.telemetry.update();
                on_frame(&frame);
                last_frame = Some(frame);
            }
        };

        if let Err(e) = op_mode.stop() {
            faults += 1;
            warn!(op_mode = %name, error = %e, "stop failed");
        }
        info!(op_mode = %name, ticks, faults, reason = ?stop_reason, "op mode stopped");

        Ok(RunSummary {
            ticks,
            faults,
            stop_reason,
            last_frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every lifecycle call.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        dts: Vec<Duration>,
        fail_init: bool,
        fail_every_tick: bool,
        stop_after: Option<(u64, Arc<AtomicBool>)>,
    }

    impl OpMode for Recorder {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn init(&mut self, _: &HardwareMap, _: &RobotConfig) -> Result<(), HardwareError> {
            self.calls.push("init".into());
            if self.fail_init {
                return Err(HardwareError::Config("no robot".into()));
            }
            Ok(())
        }

        fn init_loop(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
            self.calls.push("init_loop".into());
            ctx.telemetry.add_line("Waiting for start");
            Ok(())
        }

        fn start(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
            self.calls.push("start".into());
            ctx.telemetry.add_data("Started", ctx.tick);
            Ok(())
        }

        fn loop_tick(&mut self, ctx: &mut LoopContext<'_>) -> Result<(), HardwareError> {
            self.calls.push(format!("loop {}", ctx.tick));
            self.dts.push(ctx.dt);
            ctx.telemetry.add_data("Tick", ctx.tick);
            if let Some((at, flag)) = &self.stop_after
                && ctx.tick >= *at
            {
                flag.store(true, Ordering::SeqCst);
            }
            if self.fail_every_tick {
                return Err(HardwareError::DeviceFault {
                    device: "frontLeft".into(),
                    details: "brownout".into(),
                });
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), HardwareError> {
            self.calls.push("stop".into());
            Ok(())
        }
    }

    fn runner(ticks: u64) -> OpModeRunner {
        OpModeRunner::new(Duration::from_millis(20))
            .with_clock(Clock::Simulated)
            .with_max_ticks(ticks)
    }

    #[test]
    fn lifecycle_order() {
        let mut op = Recorder::default();
        let summary = runner(2)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap();

        assert_eq!(
            op.calls,
            vec!["init", "init_loop", "start", "loop 2", "loop 3", "stop"]
        );
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.faults, 0);
        assert_eq!(summary.stop_reason, StopReason::TickBudget);
        assert_eq!(summary.last_frame.unwrap().get("Tick"), Some("3"));
    }

    #[test]
    fn simulated_clock_advances_by_period() {
        let mut op = Recorder::default();
        runner(3)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap();
        assert!(op.dts.iter().all(|dt| *dt == Duration::from_millis(20)));
    }

    #[test]
    fn init_failure_aborts_without_stop() {
        let mut op = Recorder {
            fail_init: true,
            ..Recorder::default()
        };
        let err = runner(5)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap_err();
        assert!(matches!(err, HardwareError::Config(_)));
        assert_eq!(op.calls, vec!["init"]);
    }

    #[test]
    fn loop_errors_are_counted_not_fatal() {
        let mut op = Recorder {
            fail_every_tick: true,
            ..Recorder::default()
        };
        let summary = runner(4)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap();
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.faults, 4);
        assert_eq!(op.calls.last().map(String::as_str), Some("stop"));
    }

    #[test]
    fn stop_flag_ends_run() {
        let mut r = OpModeRunner::new(Duration::from_millis(1)).with_clock(Clock::Simulated);
        let mut op = Recorder {
            stop_after: Some((4, r.stop_handle())),
            ..Recorder::default()
        };
        let summary = r
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap();
        assert_eq!(summary.stop_reason, StopReason::StopRequested);
        assert_eq!(summary.ticks, 3);
    }

    #[test]
    fn stop_before_start_skips_loop() {
        let mut r = runner(10);
        r.request_stop();
        let mut op = Recorder::default();
        let summary = r
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |_| {})
            .unwrap();
        assert_eq!(op.calls, vec!["init", "stop"]);
        assert_eq!(summary.ticks, 0);
        assert!(summary.last_frame.is_none());
    }

    #[test]
    fn input_and_frames_are_per_step() {
        let mut op = Recorder::default();
        let mut polled = Vec::new();
        let mut input = |step: u64| {
            polled.push(step);
            let mut g = Gamepad::default();
            g.a = step % 2 == 0;
            [g, Gamepad::default()]
        };
        let mut frames = 0;
        runner(3)
            .with_init_loop_ticks(2)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut input, |_| {
                frames += 1
            })
            .unwrap();
        // 2 init-loop steps, 1 start step, 3 loop steps.
        assert_eq!(polled, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(frames, 6);
    }

    #[test]
    fn start_telemetry_gets_its_own_frame() {
        let mut op = Recorder::default();
        let mut frames = Vec::new();
        runner(1)
            .run(&mut op, &HardwareMap::new(), &RobotConfig::default(), &mut IdleInput, |f| {
                frames.push(f.clone())
            })
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].get("Started"), Some("1"));
        assert_eq!(frames[1].get("Tick"), None);
        assert_eq!(frames[2].get("Started"), None);
        assert_eq!(frames[2].get("Tick"), Some("2"));
        assert_eq!(frames[1].sequence + 1, frames[2].sequence);
    }
}
