//! Shared planning pipeline.
//!
//! noise files -> window selection -> band-pass range -> materialized data
//! -> resolution (oracle) -> partition -> job graph -> rendered artifacts
//!
//! The front-end only decides what to print and whether to submit.

use tracing::info;

use crate::config::{PlanConfig, RunRequest, SearchSettings};
use crate::data::{
    DataMaterializer, ExternalMaterializer, FrequencyRange, SegmentSet, band_pass_range, load_segments,
};
use crate::domain::{Instrument, JobGraph, Partition, Resolution, WindowSelection};
use crate::error::AppError;
use crate::graph::{GraphInputs, assemble, render_dag, render_examine_submit, render_search_submit};
use crate::io::{Artifact, PlanArtifacts, PlanSummary, RunLayout, write_all_or_nothing};
use crate::partition::partition;
use crate::resolution::{ExternalTemplateCounter, TemplateCounter, compute_resolution, total_templates};
use crate::select::select_window;

/// All computed outputs of a single `followup plan` run.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub layout: RunLayout,
    pub segments: SegmentSet,
    pub selection: WindowSelection,
    pub band_pass: FrequencyRange,
    pub resolution: Resolution,
    pub partition: Partition,
    pub total_templates: f64,
    pub graph: JobGraph,
    pub summary: PlanSummary,
}

/// Execute the full planning pipeline with the external conversion tool and
/// template counter.
pub fn plan(config: &PlanConfig, request: &RunRequest, layout: &RunLayout) -> Result<PlanOutput, AppError> {
    let settings = config.search_settings(request, layout.data_files());
    let materializer = ExternalMaterializer::new(config, layout);
    let oracle = ExternalTemplateCounter::new(settings.clone(), Some(layout.template_report_path.clone()));
    plan_with(config, request, layout, &settings, &materializer, &oracle)
}

/// Execute the planning pipeline against any materializer and template counter.
pub fn plan_with(
    config: &PlanConfig,
    request: &RunRequest,
    layout: &RunLayout,
    settings: &SearchSettings,
    materializer: &dyn DataMaterializer,
    oracle: &dyn TemplateCounter,
) -> Result<PlanOutput, AppError> {
    let instruments = config.instruments_for(request);
    let span = config.observation;

    // 1) Segments for every instrument, merged in time order.
    let segments = load_segments(&config.noise_files, instruments, span)?;

    // 2) Window of the requested coherence time.
    let selection = select_window(&segments.segments, request.coherence_time, span)?;
    let band_pass = band_pass_range(&request.region, request.parameter_time, &selection.window);
    info!(
        start = selection.window.start_time,
        duration = selection.window.duration,
        terminal = selection.terminal,
        band_low = band_pass.low,
        band_high = band_pass.high,
        "selected search window"
    );

    // The data and the oracle report live under the output directory.
    layout.create_dirs()?;

    // 3) Band-passed data for the window; the oracle reads it.
    let materialized = instruments
        .iter()
        .map(|&instrument| materializer.materialize(instrument, &selection.window, &band_pass))
        .collect::<Result<Vec<_>, _>>()?;

    // 4) Resolution over the window actually used.
    let resolution = compute_resolution(config.mismatch, selection.window.duration, &request.region, oracle)?;

    // 5) Job split and template estimate.
    let partition = partition(&request.region, &resolution, config.max_jobs);
    let total_templates = total_templates(&resolution, &request.region);

    // 6) Graph and artifacts.
    let graph = assemble(&GraphInputs {
        request,
        config_path: &config.path,
        settings,
        results_dir: &layout.results_dir,
        selection: &selection,
        resolution: &resolution,
        partition: &partition,
        total_templates,
    });

    let search_submit = RunLayout::file_name(&layout.search_submit_path);
    let examine_submit = RunLayout::file_name(&layout.examine_submit_path);
    write_all_or_nothing(&[
        Artifact::new(&layout.dag_path, render_dag(&graph, &search_submit, &examine_submit)),
        Artifact::new(
            &layout.search_submit_path,
            render_search_submit(&config.search_executable, &layout.base_label, &request.log_dir),
        ),
        Artifact::new(
            &layout.examine_submit_path,
            render_examine_submit(&config.examine_executable, &layout.base_label, &request.log_dir),
        ),
    ])?;
    info!(dag = %layout.dag_path.display(), jobs = graph.search_jobs.len(), "wrote job graph");

    let summary = PlanSummary {
        tool: "followup".to_string(),
        label: layout.base_label.clone(),
        instruments: instruments.to_vec(),
        segments_loaded: segments.segments.len(),
        rows_skipped: segments.row_errors.len(),
        selection,
        band_pass,
        resolution,
        partition,
        job_count: graph.search_jobs.len(),
        total_templates,
        artifacts: PlanArtifacts {
            dag: layout.dag_path.clone(),
            search_submit: layout.search_submit_path.clone(),
            examine_submit: layout.examine_submit_path.clone(),
            template_report: layout.template_report_path.clone(),
            results_dir: layout.results_dir.clone(),
            data_dir: layout.data_dir.clone(),
            materialized,
        },
    };

    Ok(PlanOutput {
        layout: layout.clone(),
        segments,
        selection,
        band_pass,
        resolution,
        partition,
        total_templates,
        graph,
        summary,
    })
}

/// Load segments and select a window without planning any jobs.
pub fn select_only(
    config: &PlanConfig,
    instruments: &[Instrument],
    coherence_time: u64,
) -> Result<(SegmentSet, WindowSelection), AppError> {
    let segments = load_segments(&config.noise_files, instruments, config.observation)?;
    let selection = select_window(&segments.segments, coherence_time, config.observation)?;
    Ok((segments, selection))
}
