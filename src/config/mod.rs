//! Run configuration.
//!
//! Two layers feed a planning run:
//!
//! - `PlanConfig`: site/cluster settings loaded from a JSON file (plus `.env`
//!   overrides for the executables); shared by every follow-up iteration
//! - `RunRequest`: the per-invocation target (region, coherence time, labels)
//!   taken from the command line
//!
//! Both are immutable once built and are passed explicitly to every step.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Instrument, ObservationSpan, ParameterRegion};
use crate::error::AppError;

/// Environment variable overriding `search_executable`.
pub const ENV_SEARCH_EXECUTABLE: &str = "FOLLOWUP_SEARCH_EXECUTABLE";
/// Environment variable overriding `examine_executable`.
pub const ENV_EXAMINE_EXECUTABLE: &str = "FOLLOWUP_EXAMINE_EXECUTABLE";
/// Environment variable overriding `convert_executable`.
pub const ENV_CONVERT_EXECUTABLE: &str = "FOLLOWUP_CONVERT_EXECUTABLE";

const DEFAULT_INSTRUMENTS: &str = "H1L1";

/// Raw config file contents. Every key is optional here so that a missing key
/// can be reported by name instead of as a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// First GPS time considered for data selection.
    pub start_time: Option<u64>,
    /// Last GPS time considered for data selection.
    pub end_time: Option<u64>,
    /// Maximum 1-D mismatch between template and signal.
    pub mismatch: Option<f64>,
    pub ephem_dir: Option<PathBuf>,
    pub ephem_year: Option<String>,
    /// Candidates kept per search job.
    pub num_candidates_to_keep: Option<u64>,
    pub grid_type: Option<u32>,
    pub metric_type: Option<u32>,
    /// Job budget per follow-up step.
    pub max_number_of_jobs: Option<usize>,
    /// Per-instrument noise files; the instrument code must appear in the
    /// file name.
    pub noise_files: Option<Vec<PathBuf>>,
    /// Per-instrument listings of raw data files, one path per line; matched
    /// to instruments like the noise files.
    pub data_location_files: Option<Vec<PathBuf>>,
    /// Band-pass conversion tool run once per raw data file.
    pub convert_executable: Option<PathBuf>,
    /// F-statistic search executable (also used as the template counter).
    pub search_executable: Option<PathBuf>,
    /// Post-processing executable run by the aggregation job.
    pub examine_executable: Option<PathBuf>,
    pub instruments: Option<String>,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Absolute path of the config file (forwarded to the aggregation job).
    pub path: PathBuf,
    pub observation: ObservationSpan,
    pub mismatch: f64,
    pub ephem_dir: PathBuf,
    pub ephem_year: String,
    pub num_candidates_to_keep: u64,
    pub grid_type: u32,
    pub metric_type: u32,
    pub max_jobs: usize,
    pub noise_files: Vec<PathBuf>,
    pub data_location_files: Vec<PathBuf>,
    pub convert_executable: PathBuf,
    pub search_executable: PathBuf,
    pub examine_executable: PathBuf,
    pub instruments: Vec<Instrument>,
}

/// Per-invocation planning target.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Base name for the generated directories and files.
    pub output_label: String,
    /// Follow-up iteration number (usually starts at 0).
    pub iteration: u32,
    /// Directory under which `<output_label>/` is created.
    pub output_dir: PathBuf,
    pub region: ParameterRegion,
    /// GPS time the frequency/spin-down values refer to.
    pub parameter_time: u64,
    /// Requested coherence time (s).
    pub coherence_time: u64,
    /// Directory for the batch scheduler's log files.
    pub log_dir: PathBuf,
    /// Overrides the instruments from the config file.
    pub instruments: Option<Vec<Instrument>>,
}

/// Arguments shared by every invocation of the search executable (template
/// counting and the search jobs themselves).
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub executable: PathBuf,
    /// Glob over the materialized data for the chosen window.
    pub data_files: String,
    pub ephem_dir: PathBuf,
    pub ephem_year: String,
    pub reference_time: u64,
    pub grid_type: u32,
    pub metric_type: u32,
    pub mismatch: f64,
    pub num_candidates_to_keep: u64,
}

impl RunRequest {
    /// `<label>_<iteration>`, the prefix of every per-iteration artifact.
    pub fn base_label(&self) -> String {
        format!("{}_{}", self.output_label, self.iteration)
    }
}

impl PlanConfig {
    /// Load and validate a JSON config file.
    ///
    /// A `.env` file (if any) is loaded first so its executable overrides
    /// apply.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let text = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        let mut file: ConfigFile = serde_json::from_str(&text).map_err(|e| {
            AppError::config(format!("Invalid config file '{}': {e}", path.display()))
        })?;
        file.apply_overrides(|key| std::env::var(key).ok());

        let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        file.validate(abs)
    }

    /// Instruments for a run: the request's override, else the config's.
    pub fn instruments_for<'a>(&'a self, request: &'a RunRequest) -> &'a [Instrument] {
        request.instruments.as_deref().unwrap_or(&self.instruments)
    }

    pub fn search_settings(&self, request: &RunRequest, data_files: String) -> SearchSettings {
        SearchSettings {
            executable: self.search_executable.clone(),
            data_files,
            ephem_dir: self.ephem_dir.clone(),
            ephem_year: self.ephem_year.clone(),
            reference_time: request.parameter_time,
            grid_type: self.grid_type,
            metric_type: self.metric_type,
            mismatch: self.mismatch,
            num_candidates_to_keep: self.num_candidates_to_keep,
        }
    }
}

impl ConfigFile {
    /// Replace executables with values from `lookup` (environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let slots = [
            (ENV_SEARCH_EXECUTABLE, &mut self.search_executable),
            (ENV_EXAMINE_EXECUTABLE, &mut self.examine_executable),
            (ENV_CONVERT_EXECUTABLE, &mut self.convert_executable),
        ];
        for (key, slot) in slots {
            if let Some(v) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = Some(PathBuf::from(v));
            }
        }
    }

    /// Check required keys and value ranges.
    pub fn validate(self, path: PathBuf) -> Result<PlanConfig, AppError> {
        let start = require(self.start_time, "start_time")?;
        let end = require(self.end_time, "end_time")?;
        let mismatch = require(self.mismatch, "mismatch")?;
        let ephem_dir = require(self.ephem_dir, "ephem_dir")?;
        let ephem_year = require(self.ephem_year, "ephem_year")?;
        let num_candidates_to_keep = require(self.num_candidates_to_keep, "num_candidates_to_keep")?;
        let grid_type = require(self.grid_type, "grid_type")?;
        let metric_type = require(self.metric_type, "metric_type")?;
        let max_jobs = require(self.max_number_of_jobs, "max_number_of_jobs")?;
        let noise_files = require(self.noise_files, "noise_files")?;
        let data_location_files = require(self.data_location_files, "data_location_files")?;
        let convert_executable = require(self.convert_executable, "convert_executable")?;
        let search_executable = require(self.search_executable, "search_executable")?;
        let examine_executable = require(self.examine_executable, "examine_executable")?;

        if end < start {
            return Err(AppError::config(format!(
                "No valid times: end_time {end} precedes start_time {start}."
            )));
        }
        if !(mismatch.is_finite() && mismatch > 0.0 && mismatch < 1.0) {
            return Err(AppError::config(format!(
                "Invalid mismatch {mismatch} (must satisfy 0 < mismatch < 1)."
            )));
        }
        if max_jobs == 0 {
            return Err(AppError::config("max_number_of_jobs must be >= 1."));
        }
        if noise_files.is_empty() {
            return Err(AppError::config("noise_files must list at least one file."));
        }
        if data_location_files.is_empty() {
            return Err(AppError::config("data_location_files must list at least one file."));
        }

        let instruments =
            Instrument::parse_list(self.instruments.as_deref().unwrap_or(DEFAULT_INSTRUMENTS))?;

        Ok(PlanConfig {
            path,
            observation: ObservationSpan { start, end },
            mismatch,
            ephem_dir,
            ephem_year,
            num_candidates_to_keep,
            grid_type,
            metric_type,
            max_jobs,
            noise_files,
            data_location_files,
            convert_executable,
            search_executable,
            examine_executable,
            instruments,
        })
    }
}

fn require<T>(value: Option<T>, key: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::config(format!("`{key}` cannot be read from the config file.")))
}
