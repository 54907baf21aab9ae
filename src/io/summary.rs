//! JSON plan summary.
//!
//! The summary is the machine-readable record of one planning run:
//! - the chosen window and the band-pass range it is materialized with
//! - the materialized data file of every instrument
//! - resolutions and the partition
//! - job count and template estimate
//! - paths of every written artifact

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::FrequencyRange;
use crate::domain::{Instrument, Partition, Resolution, WindowSelection};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanArtifacts {
    pub dag: PathBuf,
    pub search_submit: PathBuf,
    pub examine_submit: PathBuf,
    pub template_report: PathBuf,
    pub results_dir: PathBuf,
    pub data_dir: PathBuf,
    /// One band-passed data file per instrument.
    pub materialized: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub tool: String,
    pub label: String,
    pub instruments: Vec<Instrument>,
    pub segments_loaded: usize,
    pub rows_skipped: usize,
    pub selection: WindowSelection,
    pub band_pass: FrequencyRange,
    pub resolution: Resolution,
    pub partition: Partition,
    pub job_count: usize,
    pub total_templates: f64,
    pub artifacts: PlanArtifacts,
}

/// Write a plan summary JSON file.
pub fn write_summary_json(path: &Path, summary: &PlanSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{PartitionPolicy, SearchWindow};

    pub(crate) fn sample_summary() -> PlanSummary {
        PlanSummary {
            tool: "followup".to_string(),
            label: "J0534_2".to_string(),
            instruments: vec![Instrument::H1, Instrument::L1],
            segments_loaded: 96,
            rows_skipped: 1,
            selection: WindowSelection {
                window: SearchWindow {
                    start_time: 800_003_600,
                    duration: 86_400,
                },
                score: Some(0.25),
                segments_used: 48,
                terminal: false,
            },
            band_pass: FrequencyRange { low: 58.49, high: 60.51 },
            resolution: Resolution {
                angular: 0.01,
                frequency: 4.0e-6,
                spindown: 3.6e-10,
                sky_templates: 100,
            },
            partition: Partition {
                policy: PartitionPolicy::SpinDownSplit,
                alpha_steps: 10,
                delta_steps: 10,
                spindown_steps: 5,
                alpha_step: 0.01,
                delta_step: 0.01,
                spindown_step: 2.0e-10,
            },
            job_count: 500,
            total_templates: 1.4e9,
            artifacts: PlanArtifacts {
                dag: PathBuf::from("/out/J0534/J0534_2.dag"),
                search_submit: PathBuf::from("/out/J0534/J0534_2.sub"),
                examine_submit: PathBuf::from("/out/J0534/J0534_2_examine.sub"),
                template_report: PathBuf::from("/out/J0534/SkyTemplateCount_J0534_2.txt"),
                results_dir: PathBuf::from("/out/J0534/J0534_2_run/output_results_J0534_2"),
                data_dir: PathBuf::from("/out/J0534/J0534_2_run/final_sft_J0534_2"),
                materialized: vec![
                    PathBuf::from("/out/J0534/J0534_2_run/final_sft_J0534_2/H1-J0534_2.sft"),
                    PathBuf::from("/out/J0534/J0534_2_run/final_sft_J0534_2/L1-J0534_2.sft"),
                ],
            },
        }
    }

    #[test]
    fn summary_json_names_policy_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = sample_summary();
        write_summary_json(&path, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"policy\": \"spin_down_split\""));
        assert!(text.contains("\"job_count\": 500"));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["label"], "J0534_2");
        assert_eq!(value["partition"]["policy"], "spin_down_split");
        assert_eq!(value["selection"]["window"]["start_time"], 800_003_600);
        assert_eq!(value["artifacts"]["dag"], "/out/J0534/J0534_2.dag");
        assert_eq!(value["artifacts"]["materialized"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unwritable_summary_is_output_error() {
        let err = write_summary_json(Path::new("/nonexistent/dir/summary.json"), &sample_summary()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Output);
    }
}
