//! Job graph assembly and rendering.
//!
//! - enumerate partition cells and attach per-job arguments (`assemble`)
//! - render the DAG and the two submit descriptors as text (`render`)

pub mod assemble;
pub mod render;

pub use assemble::*;
pub use render::*;
