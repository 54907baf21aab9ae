//! `fstat-followup` library crate.
//!
//! The binary (`followup`) is a thin wrapper around this library so that:
//!
//! - planning logic is testable without spawning processes
//! - the external template counter can be swapped for a stub
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod graph;
pub mod io;
pub mod partition;
pub mod report;
pub mod resolution;
pub mod select;
