//! Command-line parsing for the follow-up planner.
//!
//! Argument parsing and command dispatch stay separate from the planning code.
//! Short flags follow the historical follow-up script so existing campaign
//! scripts keep working.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "followup", version, about = "Plan distributed F-statistic follow-up searches")]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan one follow-up iteration: select data, size the grid, write the DAG.
    Plan(PlanArgs),
    /// Only load noise files and print the window that would be searched.
    Window(WindowArgs),
}

/// Run identity shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// JSON configuration file.
    #[arg(short = 'C', long = "config", value_name = "JSON")]
    pub config: PathBuf,

    /// Instruments to use, e.g. H1L1 (defaults to the config file's list).
    #[arg(short = 'I', long = "ifos")]
    pub ifos: Option<String>,

    /// Coherence time requested for this iteration (seconds).
    #[arg(short = 't', long = "coherence-time")]
    pub coherence_time: u64,
}

/// Options for a planning run. Bands are full widths centred on the value.
#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Label naming the output directory and every artifact.
    #[arg(short = 'o', long = "output-label")]
    pub output_label: String,

    /// Follow-up iteration number.
    #[arg(short = 'i', long, default_value_t = 0)]
    pub iteration: u32,

    /// Right ascension (rad).
    #[arg(short = 'a', long, allow_negative_numbers = true)]
    pub alpha: f64,

    /// Declination (rad).
    #[arg(short = 'd', long, allow_negative_numbers = true)]
    pub delta: f64,

    #[arg(short = 'z', long = "alpha-band", default_value_t = 0.0)]
    pub alpha_band: f64,

    #[arg(short = 'c', long = "delta-band", default_value_t = 0.0)]
    pub delta_band: f64,

    /// Frequency (Hz).
    #[arg(short = 'f', long)]
    pub f0: f64,

    #[arg(short = 'b', long = "f0-band", default_value_t = 0.0)]
    pub f0_band: f64,

    /// First spin-down (Hz/s).
    #[arg(short = 's', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub f1: f64,

    #[arg(short = 'm', long = "f1-band", default_value_t = 0.0)]
    pub f1_band: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub f2: f64,

    #[arg(long = "f2-band", default_value_t = 0.0)]
    pub f2_band: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub f3: f64,

    #[arg(long = "f3-band", default_value_t = 0.0)]
    pub f3_band: f64,

    /// GPS time the parameters refer to.
    #[arg(short = 'T', long = "parameter-time")]
    pub parameter_time: u64,

    /// Directory for scheduler log files.
    #[arg(short = 'L', long = "log-dir")]
    pub log_dir: PathBuf,

    /// Directory the `<label>/` tree is created in.
    #[arg(long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write the plan summary as JSON.
    #[arg(long = "summary-json", value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Hand the DAG to condor_submit_dag after writing it.
    #[arg(long)]
    pub submit: bool,
}

/// Options for window inspection.
#[derive(Debug, Args, Clone)]
pub struct WindowArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_accepts_script_style_short_flags() {
        let cli = Cli::try_parse_from([
            "followup", "plan", "-o", "J0534", "-i", "1", "-C", "cfg.json", "-I", "H1L1", "-a", "1.46",
            "-d", "-0.38", "-z", "0.1", "-c", "0.1", "-f", "59.5", "-b", "0.02", "--f1=-7.4e-10", "-m",
            "1e-9", "-T", "800000000", "-t", "86400", "-L", "/logs",
        ])
        .unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.output_label, "J0534");
        assert_eq!(args.iteration, 1);
        assert_eq!(args.delta, -0.38);
        assert_eq!(args.f1, -7.4e-10);
        assert_eq!(args.run.ifos.as_deref(), Some("H1L1"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.submit);
        assert!(!cli.verbose);
    }

    #[test]
    fn window_needs_only_config_and_coherence_time() {
        let cli = Cli::try_parse_from(["followup", "window", "-C", "cfg.json", "-t", "3600", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Window(ref a) if a.run.coherence_time == 3600));
    }

    #[test]
    fn missing_required_flag_is_rejected() {
        assert!(Cli::try_parse_from(["followup", "plan", "-C", "cfg.json"]).is_err());
    }
}
