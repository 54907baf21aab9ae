//! Data inputs for a planning run.
//!
//! - noise-weighted segment lists per instrument (`segments`)
//! - the frequency range to band-pass the chosen window to (`bandpass`)
//! - band-passed data for the chosen window (`materialize`)

pub mod bandpass;
pub mod materialize;
pub mod segments;

pub use bandpass::*;
pub use materialize::*;
pub use segments::*;
