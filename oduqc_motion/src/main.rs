//! # ODUQC Motion
//!
//! Bench binary for the fixture motion core. Assembles the fixture from a
//! TOML config (production defaults when none is given) on the selected
//! driver, re-homes every axis as the fixture does at power-up, runs one
//! operation and prints the resulting head position.
//!
//! Ctrl-C raises the emergency stop; the running move halts within one step.

use clap::{Parser, Subcommand};
use oduqc_common::config::{ConfigLoader, LogLevel};
use oduqc_common::motion::config::FixtureConfig;
use oduqc_common::motion::types::AxisLabel;
use oduqc_common::signals::CancellationSource;
use oduqc_hal::DriverRegistry;
use oduqc_motion::{Interlock, MotionCoordinator, SequenceOutcome, assemble};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// ODUQC Motion - fixture motion bench tool
#[derive(Parser, Debug)]
#[command(name = "oduqc_motion")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Homing, positioning and engagement of the ODUQC fixture head")]
struct Args {
    /// Fixture configuration TOML. Production defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fixture driver.
    #[arg(long, default_value = "simulation")]
    driver: String,

    /// Fixture type (odd values select the odd connector table).
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    fixture_type: i64,

    /// Home everything and release all axes before exiting.
    #[arg(long)]
    park: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs and the report in JSON format.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand, Debug, Clone)]
enum Operation {
    /// Re-home every axis (done at start-up anyway).
    ResetHome,
    /// Move to a connector position; 0 is home, 19 the calibration guide.
    MoveTo { index: u32 },
    /// Home one axis, or every axis not already home.
    Home { axis: Option<AxisLabel> },
    /// Plug the head in.
    Engage {
        /// Use the calibration depth.
        #[arg(long)]
        calibration: bool,
    },
    /// Withdraw the head to travel depth.
    Disengage,
    /// Rotate the head by a signed angle.
    Rotate {
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Relative move of a single axis.
    Step {
        axis: AxisLabel,
        #[arg(allow_negative_numbers = true)]
        steps: f64,
    },
    /// De-energise one axis, or all of them.
    Release { axis: Option<AxisLabel> },
    /// Report the tracked position.
    Position,
    /// Move, engage, dwell, withdraw and go home.
    CheckPlacement {
        index: u32,
        /// Dwell while engaged [ms].
        #[arg(long, default_value_t = 2500)]
        dwell_ms: u64,
    },
}

#[derive(Serialize)]
struct RunSummary<'a> {
    operation: String,
    outcome: Option<SequenceOutcome>,
    position: &'a oduqc_motion::PositionReport,
}

fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_ref());
    let log_level = config.as_ref().map(|c| c.shared.log_level).unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("ODUQC Motion v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("ODUQC Motion shutdown complete");
}

fn load_config(
    path: Option<&PathBuf>,
) -> Result<FixtureConfig, oduqc_common::config::ConfigError> {
    let config = match path {
        Some(path) => FixtureConfig::load(path)?,
        None => FixtureConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &FixtureConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &args.config {
        Some(path) => info!("Config loaded from {}", path.display()),
        None => info!("No config given, using production fixture defaults"),
    }
    info!("{}", service_banner(config));

    let registry = DriverRegistry::with_builtin();
    info!("Available drivers: {:?}", registry.list_drivers());
    let mut driver = registry.create_driver(&args.driver, config)?;

    // Host stand-in for the panic-button interrupt.
    let signals = Arc::new(CancellationSource::new());
    let s = Arc::clone(&signals);
    ctrlc::set_handler(move || {
        s.trigger_emergency_stop();
    })?;

    let (mut coordinator, report) = assemble(config, driver.as_mut(), Interlock::unattended(signals));
    if !report.is_complete() {
        for absent in &report.absent {
            warn!("Axis {} absent: {}", absent.label, absent.reason);
        }
    }
    coordinator.set_fixture_type(args.fixture_type);

    let outcome = coordinator.reset_home();
    if !outcome.is_completed() {
        return Err(format!("start-up homing {outcome}").into());
    }

    let outcome = execute(&mut coordinator, &args.operation)?;
    if let Some(outcome) = outcome {
        if outcome.is_completed() {
            info!("{:?} {outcome}", args.operation);
        } else {
            warn!("{:?} {outcome}", args.operation);
        }
    }

    let position = coordinator.report_position();
    if args.json {
        let summary = RunSummary {
            operation: format!("{:?}", args.operation),
            outcome,
            position: &position,
        };
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{position}");
    }

    if args.park {
        let outcome = coordinator.park();
        info!("Parked: {outcome}");
    }
    Ok(())
}

fn service_banner(config: &FixtureConfig) -> String {
    format!(
        "Service: {} ({} boards, {} axes)",
        config.shared.service_name,
        config.boards.len(),
        config.axes.len()
    )
}

fn execute(
    coordinator: &mut MotionCoordinator,
    operation: &Operation,
) -> Result<Option<SequenceOutcome>, Box<dyn std::error::Error>> {
    let outcome = match operation {
        Operation::ResetHome => coordinator.reset_home(),
        Operation::MoveTo { index } => coordinator.move_to_position(*index)?,
        Operation::Home { axis } => coordinator.go_home(*axis),
        Operation::Engage { calibration } => coordinator.engage(*calibration),
        Operation::Disengage => coordinator.disengage(),
        Operation::Rotate { degrees } => coordinator.rotate_by(*degrees),
        Operation::Step { axis, steps } => coordinator.step_axis(*axis, *steps),
        Operation::Release { axis } => {
            match axis {
                Some(axis) => coordinator.release(*axis),
                None => coordinator.release_all(),
            }
            return Ok(None);
        }
        Operation::Position => return Ok(None),
        Operation::CheckPlacement { index, dwell_ms } => {
            coordinator.check_placement(*index, Duration::from_millis(*dwell_ms))?
        }
    };
    Ok(Some(outcome))
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if !args.verbose {
        if let Ok(directive) = configured.as_directive().parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
