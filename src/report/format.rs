//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the planning code stays free of presentation concerns
//! - output changes are localized

use crate::data::{RowError, SegmentSet};
use crate::domain::WindowSelection;
use crate::io::PlanSummary;

/// Row errors listed before the table is cut short.
const MAX_ROW_ERRORS: usize = 20;

/// Format the plan summary (window, resolution, partition, artifacts).
pub fn format_plan_summary(summary: &PlanSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== followup - F-statistic follow-up plan ({}) ===\n", summary.label));
    let ifos: Vec<String> = summary.instruments.iter().map(|i| i.to_string()).collect();
    out.push_str(&format!(
        "Data: {} | segments={} | skipped rows={}\n",
        ifos.join(","),
        summary.segments_loaded,
        summary.rows_skipped
    ));
    out.push_str(&format_selection(&summary.selection));
    out.push_str(&format!(
        "Band-pass: [{:.6}, {:.6}] Hz\n",
        summary.band_pass.low, summary.band_pass.high
    ));

    let r = &summary.resolution;
    out.push_str("\nResolution:\n");
    out.push_str(&format!("- sky templates : {}\n", r.sky_templates));
    out.push_str(&format!("- angular       : {:.6e} rad\n", r.angular));
    out.push_str(&format!("- frequency     : {:.6e} Hz\n", r.frequency));
    out.push_str(&format!("- spin-down     : {:.6e} Hz/s\n", r.spindown));

    let p = &summary.partition;
    out.push_str("\nPartition:\n");
    out.push_str(&format!("- policy: {}\n", p.policy.display_name()));
    out.push_str(&format!(
        "- steps : alpha={} delta={} spin-down={}\n",
        p.alpha_steps, p.delta_steps, p.spindown_steps
    ));
    out.push_str(&format!(
        "- sizes : alpha={:.6e} delta={:.6e} spin-down={:.6e}\n",
        p.alpha_step, p.delta_step, p.spindown_step
    ));
    out.push_str(&format!(
        "- jobs  : {} | templates ~ {:.3e}\n",
        summary.job_count, summary.total_templates
    ));

    let a = &summary.artifacts;
    out.push_str("\nArtifacts:\n");
    out.push_str(&format!("- DAG            : {}\n", a.dag.display()));
    out.push_str(&format!("- search submit  : {}\n", a.search_submit.display()));
    out.push_str(&format!("- examine submit : {}\n", a.examine_submit.display()));
    out.push_str(&format!("- template report: {}\n", a.template_report.display()));
    out.push_str(&format!("- data dir       : {}\n", a.data_dir.display()));
    for path in &a.materialized {
        out.push_str(&format!("  - {}\n", path.display()));
    }
    out.push_str(&format!("- results dir    : {}\n", a.results_dir.display()));

    out
}

/// Format the outcome of a window-only run.
pub fn format_window_summary(segments: &SegmentSet, selection: &WindowSelection) -> String {
    let mut out = String::new();
    out.push_str("=== followup - data window ===\n");
    for (instrument, n) in &segments.per_instrument {
        out.push_str(&format!("{instrument}: {n} segments\n"));
    }
    out.push_str(&format_selection(selection));
    out
}

/// Format skipped noise-file rows.
pub fn format_row_errors(errors: &[RowError]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Skipped rows ({}):\n", errors.len()));
    out.push_str(format!("{:<4} {:>8} {:<}\n", "ifo", "line", "reason").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<8} {:-<30}\n", "", "", "").trim_end());
    out.push('\n');
    for e in errors.iter().take(MAX_ROW_ERRORS) {
        out.push_str(format!("{:<4} {:>8} {}\n", e.instrument.code(), e.line, truncate(&e.message, 60)).trim_end());
        out.push('\n');
    }
    if errors.len() > MAX_ROW_ERRORS {
        out.push_str(&format!("... {} more\n", errors.len() - MAX_ROW_ERRORS));
    }
    out
}

fn format_selection(selection: &WindowSelection) -> String {
    let w = &selection.window;
    let score = selection
        .score
        .map(|s| format!("{s:.6e}"))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "Window: start={} duration={}s end={} | segments={} | score={score}",
        w.start_time,
        w.duration,
        w.end_time(),
        selection.segments_used
    );
    if selection.terminal {
        line.push_str(" | full span (final iteration)");
    }
    line.push('\n');
    line
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
