//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - threaded through the planning steps by value or reference
//! - exported to the JSON plan summary
//! - compared in tests (determinism checks)

use serde::{Deserialize, Serialize};

use crate::domain::region::ParameterRegion;
use crate::error::AppError;

/// Length of every data segment (seconds).
pub const SEGMENT_DURATION: u64 = 1800;

/// Interferometer the data was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    H1,
    H2,
    L1,
    V1,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [Instrument::H1, Instrument::H2, Instrument::L1, Instrument::V1];

    pub fn code(self) -> &'static str {
        match self {
            Instrument::H1 => "H1",
            Instrument::H2 => "H2",
            Instrument::L1 => "L1",
            Instrument::V1 => "V1",
        }
    }

    pub fn from_code(code: &str) -> Option<Instrument> {
        Instrument::ALL.into_iter().find(|i| i.code() == code)
    }

    /// Parse a detector list such as `H1L1`, `H1,L1` or `H1 H2 L1`.
    ///
    /// Duplicates are dropped; the first occurrence keeps its position.
    pub fn parse_list(value: &str) -> Result<Vec<Instrument>, AppError> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        if compact.is_empty() {
            return Err(AppError::config("No instruments requested."));
        }
        if compact.len() % 2 != 0 || !compact.is_ascii() {
            return Err(AppError::config(format!("Invalid instrument list '{value}'.")));
        }

        let mut out = Vec::new();
        for chunk in compact.as_bytes().chunks(2) {
            let code = std::str::from_utf8(chunk).unwrap_or_default();
            let instrument = Instrument::from_code(code).ok_or_else(|| {
                AppError::config(format!("Unknown instrument '{code}' in '{value}'."))
            })?;
            if !out.contains(&instrument) {
                out.push(instrument);
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One noise-characterized stretch of data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataSegment {
    pub instrument: Instrument,
    /// GPS start time (s).
    pub start_time: u64,
    /// Noise power in the search band; its inverse is the segment's weight.
    pub noise_weight: f64,
}

/// Global observation window from the run configuration (GPS seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSpan {
    pub start: u64,
    pub end: u64,
}

impl ObservationSpan {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether a segment lies strictly inside the span. A segment whose end
    /// does not fit in a `u64` is never inside.
    pub fn admits(&self, segment_start: u64) -> bool {
        segment_start > self.start
            && segment_start
                .checked_add(SEGMENT_DURATION)
                .is_some_and(|end| end < self.end)
    }
}

/// The contiguous stretch of data analysed as one coherent unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub start_time: u64,
    pub duration: u64,
}

impl SearchWindow {
    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Whether `t` falls in `[start_time, end_time)`.
    pub fn contains(&self, t: u64) -> bool {
        t >= self.start_time && t < self.end_time()
    }
}

/// Output of the segment selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSelection {
    pub window: SearchWindow,
    /// Noise-weighted score `(Σ 1/w)^-1/2`; `None` when the full span was used
    /// without scoring.
    pub score: Option<f64>,
    /// Number of segments starting inside the window.
    pub segments_used: usize,
    /// The coherence time was clamped to the whole observation span, so no
    /// further (longer) follow-up iteration is possible.
    pub terminal: bool,
}

/// Per-dimension step sizes derived from the mismatch tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Sky angle step (rad).
    pub angular: f64,
    /// Frequency step (Hz).
    pub frequency: f64,
    /// First spin-down step (Hz/s).
    pub spindown: f64,
    /// Sky template count reported by the oracle.
    pub sky_templates: u64,
}

/// Which branch of the job-budget decision table was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionPolicy {
    /// Sky fully resolved using under half the budget; the rest goes to
    /// spin-down splits.
    SpinDownSplit,
    /// Resolution-limited sky exceeds the budget; sky capped at `⌊√J⌋` per axis.
    SkyCapped,
    /// Sky fully resolved; spin-down kept whole.
    SkyResolved,
}

impl PartitionPolicy {
    pub fn display_name(self) -> &'static str {
        match self {
            PartitionPolicy::SpinDownSplit => "sky resolved + spin-down split",
            PartitionPolicy::SkyCapped => "sky capped to job budget",
            PartitionPolicy::SkyResolved => "sky resolved",
        }
    }
}

/// Step counts and sizes per split dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub policy: PartitionPolicy,
    pub alpha_steps: usize,
    pub delta_steps: usize,
    pub spindown_steps: usize,
    pub alpha_step: f64,
    pub delta_step: f64,
    pub spindown_step: f64,
}

impl Partition {
    pub fn job_count(&self) -> usize {
        self.alpha_steps * self.delta_steps * self.spindown_steps
    }
}

/// One leaf of the partition grid.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCell {
    pub index: usize,
    pub alpha_index: usize,
    pub delta_index: usize,
    pub spindown_index: usize,
    pub region: ParameterRegion,
    pub result_basename: String,
    pub loudest_basename: String,
}

/// A search job descriptor: one per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchJob {
    pub id: String,
    pub cell: JobCell,
    pub args: String,
}

/// The single fan-in job combining every search job's output.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationJob {
    pub id: String,
    /// Output basenames of every search job, in job order.
    pub inputs: Vec<String>,
    pub args: String,
}

/// Parent → child dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub parent: String,
    pub child: String,
}

/// Two-tier dependency graph: search jobs fan out, one aggregation job fans in.
#[derive(Debug, Clone, PartialEq)]
pub struct JobGraph {
    pub label: String,
    pub search_jobs: Vec<SearchJob>,
    pub aggregation: AggregationJob,
    pub edges: Vec<Edge>,
}

impl JobGraph {
    /// Ids of every job the aggregation step waits on.
    pub fn predecessors(&self) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.child == self.aggregation.id)
            .map(|e| e.parent.as_str())
            .collect()
    }
}
