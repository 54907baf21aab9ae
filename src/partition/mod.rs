//! Job partitioning.
//!
//! Splits the parameter volume into at most `J_max` independent jobs. Sky
//! resolution is the costliest dimension to under-resolve, so the sky is
//! resolved first; spin-down gets whatever budget is left. Frequency is never
//! split: each job covers the whole frequency band.
//!
//! The policy is a decision table evaluated in order:
//!
//! | guard                         | policy          | sky steps          | spin-down steps      |
//! |-------------------------------|-----------------|--------------------|----------------------|
//! | `sky < J_max / 2`             | `SpinDownSplit` | resolution-limited | `⌊J_max / sky⌋`      |
//! | `sky > J_max`                 | `SkyCapped`     | `⌊√J_max⌋` per axis | 1                   |
//! | otherwise                     | `SkyResolved`   | resolution-limited | 1                    |
//!
//! Step sizes are `width / n` for `n` steps. The cells then tile each band
//! exactly, and a resolution-limited step is never coarser than the
//! resolution.

pub mod policy;

pub use policy::*;
