//! Data window selection.
//!
//! Picks the contiguous stretch of data with the best noise-weighted
//! sensitivity for the requested coherence time.

pub mod window;

pub use window::*;
