//! Input/output helpers.
//!
//! - per-run directory and file naming (`layout`)
//! - all-or-nothing artifact writes (`artifacts`)
//! - JSON plan summary export (`summary`)
//! - invocation log (`runlog`)

pub mod artifacts;
pub mod layout;
pub mod runlog;
pub mod summary;

pub use artifacts::*;
pub use layout::*;
pub use runlog::*;
pub use summary::*;
