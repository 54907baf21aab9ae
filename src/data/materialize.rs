//! Data materialization for the selected window.
//!
//! Each instrument has a location file listing its raw data files, one path
//! per line. The GPS start time is the second-to-last `-` field of a path,
//! e.g. `H-1_H1_1800SFT-800001800-1800.sft`. Every file starting inside the
//! window is band-passed by the conversion executable into a scratch
//! directory; the results are concatenated into one file per instrument:
//!
//! ```text
//! <data_dir>/<IFO>-<label>_<i>.sft
//! ```
//!
//! The search executable and the template counter read that directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::PlanConfig;
use crate::data::{FrequencyRange, file_for_instrument};
use crate::domain::{Instrument, SearchWindow};
use crate::error::AppError;
use crate::io::RunLayout;

/// Capability: produce the band-passed data one instrument contributes to
/// `window`. Returns the path of the materialized file.
pub trait DataMaterializer {
    fn materialize(
        &self,
        instrument: Instrument,
        window: &SearchWindow,
        range: &FrequencyRange,
    ) -> Result<PathBuf, AppError>;
}

/// Runs the conversion executable once per raw data file.
#[derive(Debug, Clone)]
pub struct ExternalMaterializer {
    pub executable: PathBuf,
    pub location_files: Vec<PathBuf>,
    pub data_dir: PathBuf,
    /// Parent of the per-instrument scratch directories.
    pub scratch_root: PathBuf,
    pub base_label: String,
}

impl ExternalMaterializer {
    pub fn new(config: &PlanConfig, layout: &RunLayout) -> Self {
        Self {
            executable: config.convert_executable.clone(),
            location_files: config.data_location_files.clone(),
            data_dir: layout.data_dir.clone(),
            scratch_root: layout.run_dir.clone(),
            base_label: layout.base_label.clone(),
        }
    }

    pub fn output_path(&self, instrument: Instrument) -> PathBuf {
        self.data_dir
            .join(format!("{}-{}.sft", instrument.code(), self.base_label))
    }

    pub fn scratch_dir(&self, instrument: Instrument) -> PathBuf {
        self.scratch_root
            .join(format!("band_passed_{}_{}", self.base_label, instrument.code()))
    }

    /// Arguments band-passing one raw file into `scratch`.
    pub fn convert_args(
        &self,
        source: &str,
        instrument: Instrument,
        scratch: &Path,
        range: &FrequencyRange,
    ) -> Vec<String> {
        vec![
            "-i".to_string(),
            source.to_string(),
            "-I".to_string(),
            instrument.code().to_string(),
            "-o".to_string(),
            scratch.display().to_string(),
            "-f".to_string(),
            range.low.to_string(),
            "-F".to_string(),
            range.high.to_string(),
        ]
    }

    fn convert(
        &self,
        sources: &[&str],
        instrument: Instrument,
        scratch: &Path,
        range: &FrequencyRange,
    ) -> Result<(), AppError> {
        let exe = &self.executable;
        for source in sources {
            let args = self.convert_args(source, instrument, scratch, range);
            debug!(executable = %exe.display(), ?args, "band-passing data file");

            let output = Command::new(exe).args(&args).output().map_err(|e| {
                AppError::data(format!("Failed to run conversion tool '{}': {e}", exe.display()))
            })?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(AppError::data(format!(
                    "Conversion of '{source}' exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
        }
        Ok(())
    }
}

impl DataMaterializer for ExternalMaterializer {
    fn materialize(
        &self,
        instrument: Instrument,
        window: &SearchWindow,
        range: &FrequencyRange,
    ) -> Result<PathBuf, AppError> {
        let location = file_for_instrument(instrument, &self.location_files).ok_or_else(|| {
            AppError::data(format!(
                "No data location file for {instrument}; add {instrument} somewhere to the file name."
            ))
        })?;
        let listing = fs::read_to_string(location).map_err(|e| {
            AppError::data(format!("Unable to read '{}': {e}", location.display()))
        })?;

        let sources = files_in_window(&listing, window);
        if sources.is_empty() {
            return Err(AppError::insufficient(format!(
                "No {instrument} data files start inside [{}, {}) in '{}'.",
                window.start_time,
                window.end_time(),
                location.display()
            )));
        }

        let scratch = self.scratch_dir(instrument);
        fs::create_dir_all(&scratch).map_err(|e| {
            AppError::output(format!("Failed to create directory '{}': {e}", scratch.display()))
        })?;

        let out = self.output_path(instrument);
        let result = self
            .convert(&sources, instrument, &scratch, range)
            .and_then(|()| concatenate(&scratch, &out));
        if let Err(e) = fs::remove_dir_all(&scratch) {
            warn!(dir = %scratch.display(), "could not remove scratch directory: {e}");
        }
        result?;

        info!(%instrument, files = sources.len(), out = %out.display(), "materialized window data");
        Ok(out)
    }
}

/// GPS start time encoded in a data file path.
pub fn data_file_start_time(path: &str) -> Option<u64> {
    let name = Path::new(path).file_name()?.to_str()?;
    name.rsplit('-').nth(1)?.parse().ok()
}

/// Listed paths whose start time falls inside `window`, in listing order.
pub fn files_in_window<'a>(listing: &'a str, window: &SearchWindow) -> Vec<&'a str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%') && !line.starts_with('#'))
        .filter(|line| match data_file_start_time(line) {
            Some(start) => window.contains(start),
            None => {
                warn!(path = line, "data file name carries no start time; skipping");
                false
            }
        })
        .collect()
}

/// Concatenate every file in `scratch` (sorted by name) into `out`.
fn concatenate(scratch: &Path, out: &Path) -> Result<(), AppError> {
    let read_err =
        |e: io::Error| AppError::data(format!("Failed to read '{}': {e}", scratch.display()));
    let mut parts: Vec<PathBuf> = fs::read_dir(scratch)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(read_err)?;
    parts.retain(|p| p.is_file());
    parts.sort();
    if parts.is_empty() {
        return Err(AppError::data(format!(
            "Conversion left no data in '{}'.",
            scratch.display()
        )));
    }

    let write_err = |e: io::Error| AppError::output(format!("Failed to write '{}': {e}", out.display()));
    let mut sink = File::create(out).map_err(write_err)?;
    for part in &parts {
        let copied = File::open(part).and_then(|mut src| io::copy(&mut src, &mut sink));
        if let Err(e) = copied {
            let _ = fs::remove_file(out);
            return Err(write_err(e));
        }
    }
    Ok(())
}

/// Test double recording every request; optionally failing.
#[cfg(test)]
pub struct RecordingMaterializer {
    pub data_dir: PathBuf,
    pub failure: Option<String>,
    pub calls: std::cell::RefCell<Vec<(Instrument, SearchWindow, FrequencyRange)>>,
}

#[cfg(test)]
impl RecordingMaterializer {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            failure: None,
            calls: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn failing(data_dir: &Path, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(data_dir)
        }
    }
}

#[cfg(test)]
impl DataMaterializer for RecordingMaterializer {
    fn materialize(
        &self,
        instrument: Instrument,
        window: &SearchWindow,
        range: &FrequencyRange,
    ) -> Result<PathBuf, AppError> {
        self.calls.borrow_mut().push((instrument, *window, *range));
        match &self.failure {
            Some(message) => Err(AppError::data(message.clone())),
            None => Ok(self.data_dir.join(format!("{}.sft", instrument.code()))),
        }
    }
}
