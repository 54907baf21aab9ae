//! Cell enumeration and job descriptors.
//!
//! Cells are enumerated sky-α outer, sky-δ middle, spin-down inner, and
//! numbered from zero in that order. Every cell keeps the full frequency band
//! and the unsplit higher spin-down bands.

use std::path::Path;

use tracing::debug;

use crate::config::{RunRequest, SearchSettings};
use crate::domain::{
    AggregationJob, Edge, JobCell, JobGraph, ParameterRegion, Partition, Resolution, SearchJob, WindowSelection,
};

/// Id of the single aggregation job.
pub const AGGREGATION_JOB_ID: &str = "B0";

/// Everything the assembler needs from earlier planning steps.
#[derive(Debug, Clone, Copy)]
pub struct GraphInputs<'a> {
    pub request: &'a RunRequest,
    /// Config file forwarded to the aggregation job.
    pub config_path: &'a Path,
    pub settings: &'a SearchSettings,
    pub results_dir: &'a Path,
    pub selection: &'a WindowSelection,
    pub resolution: &'a Resolution,
    pub partition: &'a Partition,
    pub total_templates: f64,
}

pub fn search_job_id(index: usize) -> String {
    format!("A{index}")
}

/// Enumerate every partition cell.
pub fn enumerate_cells(region: &ParameterRegion, partition: &Partition, base_label: &str) -> Vec<JobCell> {
    let mut cells = Vec::with_capacity(partition.job_count());
    for alpha_index in 0..partition.alpha_steps {
        for delta_index in 0..partition.delta_steps {
            for spindown_index in 0..partition.spindown_steps {
                let index = cells.len();
                let sub = ParameterRegion {
                    alpha: region.alpha.slice(alpha_index, partition.alpha_step),
                    delta: region.delta.slice(delta_index, partition.delta_step),
                    f1: region.f1.slice(spindown_index, partition.spindown_step),
                    ..*region
                };
                cells.push(JobCell {
                    index,
                    alpha_index,
                    delta_index,
                    spindown_index,
                    region: sub,
                    result_basename: format!("{base_label}_result_{index}"),
                    loudest_basename: format!("{base_label}_loudest_{index}"),
                });
            }
        }
    }
    cells
}

/// Build the two-tier job graph.
pub fn assemble(inputs: &GraphInputs<'_>) -> JobGraph {
    let request = inputs.request;
    let base_label = request.base_label();

    let cells = enumerate_cells(&request.region, inputs.partition, &base_label);
    let search_jobs: Vec<SearchJob> = cells
        .into_iter()
        .map(|cell| {
            let args = search_job_args(&cell, inputs.settings, inputs.resolution, inputs.results_dir);
            debug!(job = cell.index, %args, "search job");
            SearchJob {
                id: search_job_id(cell.index),
                cell,
                args,
            }
        })
        .collect();

    let outputs: Vec<String> = search_jobs
        .iter()
        .flat_map(|job| [job.cell.result_basename.clone(), job.cell.loudest_basename.clone()])
        .collect();
    let aggregation = AggregationJob {
        id: AGGREGATION_JOB_ID.to_string(),
        inputs: outputs,
        args: aggregation_args(inputs, search_jobs.len()),
    };

    let edges = search_jobs
        .iter()
        .map(|job| Edge {
            parent: job.id.clone(),
            child: aggregation.id.clone(),
        })
        .collect();

    JobGraph {
        label: base_label,
        search_jobs,
        aggregation,
        edges,
    }
}

/// Argument string for one search job.
pub fn search_job_args(
    cell: &JobCell,
    settings: &SearchSettings,
    resolution: &Resolution,
    results_dir: &Path,
) -> String {
    let r = &cell.region;
    let pairs: Vec<(&str, String)> = vec![
        ("--Alpha", r.alpha.lower().to_string()),
        ("--Delta", r.delta.lower().to_string()),
        ("--AlphaBand", r.alpha.width().to_string()),
        ("--DeltaBand", r.delta.width().to_string()),
        ("--Freq", r.f0.lower().to_string()),
        ("--FreqBand", r.f0.width().to_string()),
        ("--dFreq", resolution.frequency.to_string()),
        ("--f1dot", r.f1.lower().to_string()),
        ("--f1dotBand", r.f1.width().to_string()),
        ("--df1dot", resolution.spindown.to_string()),
        ("--f2dot", r.f2.lower().to_string()),
        ("--f2dotBand", r.f2.width().to_string()),
        ("--f3dot", r.f3.lower().to_string()),
        ("--f3dotBand", r.f3.width().to_string()),
        ("--DataFiles", settings.data_files.clone()),
        ("--ephemDir", settings.ephem_dir.display().to_string()),
        ("--ephemYear", settings.ephem_year.clone()),
        ("--NumCandidatesToKeep", settings.num_candidates_to_keep.to_string()),
        ("--refTime", settings.reference_time.to_string()),
        ("--gridType", settings.grid_type.to_string()),
        ("--metricType", settings.metric_type.to_string()),
        ("--metricMismatch", settings.mismatch.to_string()),
        (
            "--outputFstat",
            results_dir.join(&cell.result_basename).display().to_string(),
        ),
        (
            "--outputLoudest",
            results_dir.join(&cell.loudest_basename).display().to_string(),
        ),
    ];
    join_pairs(&pairs)
}

fn aggregation_args(inputs: &GraphInputs<'_>, jobs: usize) -> String {
    let request = inputs.request;
    let results = inputs.results_dir.display().to_string();
    let pairs: Vec<(&str, String)> = vec![
        ("-o", results.clone()),
        ("-C", inputs.config_path.display().to_string()),
        ("-j", jobs.to_string()),
        ("-b", request.output_label.clone()),
        ("-d", results),
        ("-i", request.iteration.to_string()),
        ("-t", inputs.selection.window.duration.to_string()),
        ("-T", inputs.selection.window.start_time.to_string()),
        ("-L", request.log_dir.display().to_string()),
        ("-A", inputs.resolution.angular.to_string()),
        ("-N", inputs.total_templates.to_string()),
    ];
    join_pairs(&pairs)
}

fn join_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(flag, value)| format!("{flag} {value}"))
        .collect::<Vec<_>>()
        .join(" ")
}
