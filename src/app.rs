//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and initialises logging
//! - loads the config file
//! - runs the planning pipeline
//! - prints reports and writes optional exports
//! - optionally hands the DAG to the scheduler

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, PlanArgs, WindowArgs};
use crate::config::{PlanConfig, RunRequest};
use crate::domain::{Band, Instrument, ParameterRegion};
use crate::error::AppError;
use crate::io::RunLayout;

pub mod pipeline;
pub mod submit;

/// Entry point for the `followup` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Plan(args) => handle_plan(args),
        Command::Window(args) => handle_window(args),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .try_init();
}

fn handle_plan(args: PlanArgs) -> Result<(), AppError> {
    let config = PlanConfig::load(&args.run.config)?;
    let request = request_from_args(&args)?;
    let layout = RunLayout::new(&request)?;
    record_invocation(&layout, "plan", &std::env::args().collect::<Vec<_>>())?;

    let run = pipeline::plan(&config, &request, &layout)?;

    println!("{}", crate::report::format_plan_summary(&run.summary));
    if !run.segments.row_errors.is_empty() {
        println!("{}", crate::report::format_row_errors(&run.segments.row_errors));
    }

    if let Some(path) = &args.summary_json {
        crate::io::write_summary_json(path, &run.summary)?;
    }

    if args.submit {
        let argv = submit::submit_command(&run.layout, &request.log_dir);
        crate::io::append_run_log(&run.layout.commands_log_path, "submit", &argv)?;
        submit::submit_dag(&run.layout, &request.log_dir)?;
    }

    Ok(())
}

/// Create the run directories and log `argv` before any planning step runs,
/// so failed runs are logged too.
pub fn record_invocation(layout: &RunLayout, what: &str, argv: &[String]) -> Result<(), AppError> {
    layout.create_dirs()?;
    crate::io::append_run_log(&layout.commands_log_path, what, argv)
}

fn handle_window(args: WindowArgs) -> Result<(), AppError> {
    let config = PlanConfig::load(&args.run.config)?;
    let instruments = match &args.run.ifos {
        Some(codes) => Instrument::parse_list(codes)?,
        None => config.instruments.clone(),
    };
    let (segments, selection) = pipeline::select_only(&config, &instruments, args.run.coherence_time)?;

    println!("{}", crate::report::format_window_summary(&segments, &selection));
    if !segments.row_errors.is_empty() {
        println!("{}", crate::report::format_row_errors(&segments.row_errors));
    }
    Ok(())
}

pub fn request_from_args(args: &PlanArgs) -> Result<RunRequest, AppError> {
    if args.output_label.trim().is_empty() {
        return Err(AppError::config("Output label must not be empty."));
    }
    let bands = [
        ("alpha-band", args.alpha_band),
        ("delta-band", args.delta_band),
        ("f0-band", args.f0_band),
        ("f1-band", args.f1_band),
        ("f2-band", args.f2_band),
        ("f3-band", args.f3_band),
    ];
    for (name, width) in bands {
        if !(width.is_finite() && width >= 0.0) {
            return Err(AppError::config(format!("--{name} must be finite and >= 0, got {width}.")));
        }
    }

    let instruments = args
        .run
        .ifos
        .as_deref()
        .map(Instrument::parse_list)
        .transpose()?;

    Ok(RunRequest {
        output_label: args.output_label.clone(),
        iteration: args.iteration,
        output_dir: args.output_dir.clone(),
        region: ParameterRegion {
            alpha: Band::from_width(args.alpha, args.alpha_band),
            delta: Band::from_width(args.delta, args.delta_band),
            f0: Band::from_width(args.f0, args.f0_band),
            f1: Band::from_width(args.f1, args.f1_band),
            f2: Band::from_width(args.f2, args.f2_band),
            f3: Band::from_width(args.f3, args.f3_band),
        },
        parameter_time: args.parameter_time,
        coherence_time: args.run.coherence_time,
        log_dir: args.log_dir.clone(),
        instruments,
    })
}
