//! Reporting utilities: formatted terminal output for plans and windows.

pub mod format;

pub use format::*;
