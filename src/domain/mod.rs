//! Domain types used throughout the planner.
//!
//! This module defines:
//!
//! - data inputs (`Instrument`, `DataSegment`, `ObservationSpan`)
//! - the searched volume (`Band`, `SkyPatch`, `ParameterRegion`)
//! - derived plan values (`SearchWindow`, `Resolution`, `Partition`)
//! - the emitted job graph (`JobCell`, `SearchJob`, `AggregationJob`, `JobGraph`)

pub mod region;
pub mod types;

pub use region::*;
pub use types::*;
