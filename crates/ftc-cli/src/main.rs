//! `ftc-sim` – run an op mode against the simulated robot.
//!
//! ```text
//! ftc-sim teleop --alliance red --ticks 300
//! ftc-sim obelisk --fast --json
//! ```
//!
//! The scripted driver in [`script`] plays a short match: drive, strafe in
//! turtle mode, lock onto the goal, shoot and relocalise.  Ctrl-C stops the
//! op mode cleanly (actuators are zeroed by its `stop`).

mod args;
mod script;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use colored::Colorize;
use tracing::warn;

use ftc_hal::sim::SimHardware;
use ftc_opmode::config::{self, RobotConfig};
use ftc_opmode::opmodes::{InitOpMode, ObeliskScan, TeleOp};
use ftc_opmode::runner::{Clock, OpModeRunner, RunSummary, StopReason};
use ftc_opmode::telemetry::TelemetryFrame;
use ftc_opmode::{OpMode, logging};

use crate::args::{ArgsError, OpModeKind};
use crate::script::Scenario;

/// Human-readable output prints one frame in this many.
const PRINT_EVERY: u64 = 25;

fn main() -> ExitCode {
    let _guard = logging::init_tracing("ftc-sim");

    let args = match args::parse(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(ArgsError::Help) => {
            println!("{}", args::USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let mut cfg = match config::load_from(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            let mut c = RobotConfig::default();
            config::apply_env_overrides(&mut c);
            c
        }
    };
    if let Some(alliance) = args.alliance {
        cfg.alliance = alliance;
    }

    let sim = Arc::new(SimHardware::new(&cfg.devices));
    let mut scenario = Scenario::new(args.op_mode, Arc::clone(&sim), &cfg);

    let mut runner = OpModeRunner::from_config(&cfg)
        .with_clock(if args.fast { Clock::Simulated } else { Clock::Realtime })
        .with_max_ticks(args.ticks);

    let stop = runner.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – stopping op mode …".yellow().bold());
        stop.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let mut op_mode: Box<dyn OpMode> = match args.op_mode {
        OpModeKind::TeleOp => Box::new(TeleOp::new()),
        OpModeKind::Obelisk => Box::new(ObeliskScan::new()),
        OpModeKind::Init => Box::new(InitOpMode::new()),
    };

    if !args.json {
        println!(
            "{} {} on the {} alliance at {} Hz for {} ticks",
            "▶".green().bold(),
            op_mode.name().bold(),
            cfg.alliance.to_string().bold(),
            cfg.loop_hz,
            args.ticks
        );
    }

    let json = args.json;
    let result = runner.run(
        op_mode.as_mut(),
        &sim.hardware_map(),
        &cfg,
        &mut scenario,
        |frame| {
            if json {
                match frame.to_json() {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to serialise telemetry frame"),
                }
            } else if frame.sequence % PRINT_EVERY == 1 {
                print_frame(frame);
            }
        },
    );

    match result {
        Ok(summary) => {
            if !json {
                print_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Init failed".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_frame(frame: &TelemetryFrame) {
    println!(
        "{} {}",
        format!("#{}", frame.sequence).dimmed(),
        frame.timestamp.format("%H:%M:%S%.3f").to_string().dimmed()
    );
    for entry in &frame.entries {
        println!("    {:<16} {}", entry.caption.cyan(), entry.value);
    }
}

fn print_summary(summary: &RunSummary) {
    if let Some(frame) = &summary.last_frame {
        print_frame(frame);
    }
    let reason = match summary.stop_reason {
        StopReason::TickBudget => "tick budget reached".green(),
        StopReason::StopRequested => "stop requested".yellow(),
    };
    let faults = if summary.faults == 0 {
        "0".green()
    } else {
        summary.faults.to_string().red()
    };
    println!(
        "{} {} ticks, {} faults ({})",
        "■".bold(),
        summary.ticks,
        faults,
        reason
    );
}
