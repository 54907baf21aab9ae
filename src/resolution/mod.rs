//! Search resolution.
//!
//! Responsibilities:
//!
//! - closed-form frequency / spin-down steps from the mismatch metric
//! - sky step from an external template-count oracle (called once per run)
//! - total template estimate for reporting

pub mod metric;
pub mod oracle;

pub use metric::*;
pub use oracle::*;
