//! Noise-weighted window search.
//!
//! For each candidate start time `t` (every segment start), the window
//! `[t, t + D)` is scored by inverse-variance weighting of the segments that
//! start inside it:
//!
//! `score = (Σ 1/w_i)^(-1/2)`
//!
//! Lower is better. A candidate only qualifies if at least one other segment
//! starts strictly after `t` inside the window.
//!
//! The scan is a plain O(n²) pass in input order. At the expected cardinality
//! (thousands of segments) this is fast, and it keeps tie-breaking trivially
//! stable: the first candidate in input order wins.

use tracing::{info, warn};

use crate::domain::{DataSegment, ObservationSpan, SearchWindow, WindowSelection};
use crate::error::AppError;

/// Select the best window of `requested` seconds.
///
/// If `requested` covers the whole observation span, or no candidate
/// qualifies because the data is sparser than `requested`, the whole span is
/// used and the selection is flagged `terminal`.
pub fn select_window(
    segments: &[DataSegment],
    requested: u64,
    span: ObservationSpan,
) -> Result<WindowSelection, AppError> {
    if segments.is_empty() {
        return Err(AppError::insufficient("No data segments available for window selection."));
    }
    if span.duration() == 0 {
        return Err(AppError::insufficient(format!(
            "Observation span [{}, {}] is empty.",
            span.start, span.end
        )));
    }
    if requested == 0 {
        return Err(AppError::config("Coherence time must be > 0."));
    }

    if requested >= span.duration() {
        warn!(
            requested,
            available = span.duration(),
            "coherence time exceeds observation span; using the full span (final iteration)"
        );
        return Ok(full_span(segments, span));
    }

    let mut best: Option<WindowSelection> = None;
    for segment in segments {
        let t = segment.start_time;
        let Some((score, used)) = score_window(segments, t, requested) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(b) => b.score.is_some_and(|s| score < s),
        };
        if better {
            best = Some(WindowSelection {
                window: SearchWindow {
                    start_time: t,
                    duration: requested,
                },
                score: Some(score),
                segments_used: used,
                terminal: false,
            });
        }
    }

    match best {
        Some(selection) => {
            info!(
                start = selection.window.start_time,
                duration = selection.window.duration,
                segments = selection.segments_used,
                score = selection.score.unwrap_or(f64::NAN),
                "best data window"
            );
            Ok(selection)
        }
        None => {
            warn!(
                requested,
                "no window of the requested length contains two segments; using the full span (final iteration)"
            );
            Ok(full_span(segments, span))
        }
    }
}

/// Score the window `[t, t + duration)`.
///
/// Returns `None` when no segment other than those at `t` starts inside it.
pub fn score_window(segments: &[DataSegment], t: u64, duration: u64) -> Option<(f64, usize)> {
    let window = SearchWindow {
        start_time: t,
        duration,
    };
    let mut inverse_sum = 0.0;
    let mut used = 0usize;
    let mut has_later = false;

    for s in segments {
        if window.contains(s.start_time) {
            inverse_sum += 1.0 / s.noise_weight;
            used += 1;
            has_later |= s.start_time > t;
        }
    }

    if !has_later {
        return None;
    }
    Some((inverse_sum.powf(-0.5), used))
}

fn full_span(segments: &[DataSegment], span: ObservationSpan) -> WindowSelection {
    let inverse_sum: f64 = segments.iter().map(|s| 1.0 / s.noise_weight).sum();
    WindowSelection {
        window: SearchWindow {
            start_time: span.start,
            duration: span.duration(),
        },
        score: Some(inverse_sum.powf(-0.5)),
        segments_used: segments.len(),
        terminal: true,
    }
}
