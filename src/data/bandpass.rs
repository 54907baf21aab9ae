//! Frequency range the selected window is band-passed to.
//!
//! The range is handed to the materializer together with the window.

use serde::{Deserialize, Serialize};

use crate::domain::{ParameterRegion, SearchWindow};

/// Padding added on each side of the search band (Hz).
pub const BANDPASS_PADDING_HZ: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub low: f64,
    pub high: f64,
}

/// Band-pass range for `window`.
///
/// The signal frequency is propagated from `parameter_time` to the window start
/// before padding the requested frequency band.
pub fn band_pass_range(region: &ParameterRegion, parameter_time: u64, window: &SearchWindow) -> FrequencyRange {
    let dt = window.start_time as f64 - parameter_time as f64;
    let f = region.frequency_at(dt);
    FrequencyRange {
        low: f - region.f0.half_width - BANDPASS_PADDING_HZ,
        high: f + region.f0.half_width + BANDPASS_PADDING_HZ,
    }
}
