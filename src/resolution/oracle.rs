//! Template-count oracle.
//!
//! The sky grid is owned by the search executable, so the only reliable way to
//! learn how many sky templates a patch needs is to ask it. The executable is
//! run in `--countTemplates` mode with zero frequency and spin-down band and
//! prints a report containing:
//!
//! ```text
//! %% Number of templates: 1234
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::config::SearchSettings;
use crate::domain::ParameterRegion;
use crate::error::AppError;

/// Key of the report line carrying the count.
pub const TEMPLATE_COUNT_KEY: &str = "%% Number of templates";

/// Capability: count sky templates over a region's full sky patch.
pub trait TemplateCounter {
    fn count_sky_templates(&self, region: &ParameterRegion) -> Result<u64, AppError>;
}

/// Runs the search executable as a subprocess.
#[derive(Debug, Clone)]
pub struct ExternalTemplateCounter {
    pub settings: SearchSettings,
    /// Where the raw report is kept for later inspection.
    pub report_path: Option<PathBuf>,
}

impl ExternalTemplateCounter {
    pub fn new(settings: SearchSettings, report_path: Option<PathBuf>) -> Self {
        Self {
            settings,
            report_path,
        }
    }

    /// Command-line arguments for a count over the full sky patch.
    pub fn args(&self, region: &ParameterRegion) -> Vec<String> {
        let s = &self.settings;
        vec![
            "--Alpha".to_string(),
            region.alpha.lower().to_string(),
            "--Delta".to_string(),
            region.delta.lower().to_string(),
            "--AlphaBand".to_string(),
            region.alpha.width().to_string(),
            "--DeltaBand".to_string(),
            region.delta.width().to_string(),
            "--Freq".to_string(),
            region.f0.center.to_string(),
            "--FreqBand".to_string(),
            "0".to_string(),
            "--f1dot".to_string(),
            region.f1.center.to_string(),
            "--f1dotBand".to_string(),
            "0".to_string(),
            "--DataFiles".to_string(),
            s.data_files.clone(),
            "--ephemDir".to_string(),
            s.ephem_dir.display().to_string(),
            "--ephemYear".to_string(),
            s.ephem_year.clone(),
            "--refTime".to_string(),
            s.reference_time.to_string(),
            "--gridType".to_string(),
            s.grid_type.to_string(),
            "--metricType".to_string(),
            s.metric_type.to_string(),
            "--metricMismatch".to_string(),
            s.mismatch.to_string(),
            "--countTemplates".to_string(),
        ]
    }
}

impl TemplateCounter for ExternalTemplateCounter {
    fn count_sky_templates(&self, region: &ParameterRegion) -> Result<u64, AppError> {
        let exe = &self.settings.executable;
        let args = self.args(region);
        debug!(executable = %exe.display(), ?args, "counting sky templates");

        let output = Command::new(exe).args(&args).output().map_err(|e| {
            AppError::oracle(format!("Failed to run template counter '{}': {e}", exe.display()))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(path) = &self.report_path {
            fs::write(path, stdout.as_bytes()).map_err(|e| {
                AppError::oracle(format!(
                    "Failed to save template count report '{}': {e}",
                    path.display()
                ))
            })?;
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::oracle(format!(
                "Template counter exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let count = parse_template_count(&stdout)?;
        info!(count, "sky template count");
        Ok(count)
    }
}

/// Extract the template count from an oracle report.
///
/// The last matching line wins. Counts printed as floats are rounded.
pub fn parse_template_count(report: &str) -> Result<u64, AppError> {
    let raw = report
        .lines()
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim() == TEMPLATE_COUNT_KEY)
        .map(|(_, value)| value.trim())
        .last()
        .ok_or_else(|| AppError::oracle(format!("Template count report has no '{TEMPLATE_COUNT_KEY}' line.")))?;

    let value: f64 = raw
        .parse()
        .map_err(|_| AppError::oracle(format!("Unparsable template count '{raw}'.")))?;
    if !(value.is_finite() && value >= 1.0) {
        return Err(AppError::oracle(format!("Template count must be >= 1, got '{raw}'.")));
    }
    Ok(value.round() as u64)
}

/// Test double returning a fixed count (or a fixed failure).
#[cfg(test)]
pub struct FixedTemplateCount(pub Result<u64, String>);

#[cfg(test)]
impl FixedTemplateCount {
    pub fn new(count: u64) -> Self {
        Self(Ok(count))
    }

    pub fn failing(message: &str) -> Self {
        Self(Err(message.to_string()))
    }
}

#[cfg(test)]
impl TemplateCounter for FixedTemplateCount {
    fn count_sky_templates(&self, _region: &ParameterRegion) -> Result<u64, AppError> {
        self.0.clone().map_err(AppError::oracle)
    }
}
