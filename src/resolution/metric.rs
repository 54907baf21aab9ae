//! Metric-derived step sizes.
//!
//! For a coherence time `T` and 1-D mismatch `μ`:
//!
//! - `δf = 2·sqrt(3μ / (π²T²))`
//! - `δḟ = 2·sqrt(180μ / (π²T⁴))`
//!
//! The sky step is not closed-form: the search code's own grid is asked how
//! many templates cover the patch, and the step is `sqrt(Δα·Δδ / N_sky)`.
//! Higher spin-down orders get no step; they are carried through unsplit.

use std::f64::consts::PI;

use tracing::info;

use crate::domain::{ParameterRegion, Resolution, SkyPatch};
use crate::error::AppError;
use crate::resolution::oracle::TemplateCounter;

/// Frequency step (Hz).
pub fn frequency_resolution(mismatch: f64, coherence_time: f64) -> Result<f64, AppError> {
    check_inputs(mismatch, coherence_time)?;
    Ok(2.0 * (3.0 * mismatch / (PI.powi(2) * coherence_time.powi(2))).sqrt())
}

/// First spin-down step (Hz/s).
pub fn spindown_resolution(mismatch: f64, coherence_time: f64) -> Result<f64, AppError> {
    check_inputs(mismatch, coherence_time)?;
    Ok(2.0 * (180.0 * mismatch / (PI.powi(2) * coherence_time.powi(4))).sqrt())
}

/// Sky step (rad) for `sky_templates` templates covering `sky`.
pub fn angular_resolution(sky: &SkyPatch, sky_templates: u64) -> Result<f64, AppError> {
    let area = sky.area();
    if !(area.is_finite() && area > 0.0) {
        return Err(AppError::config(format!(
            "Sky patch {} x {} rad has no area; angular resolution is undefined.",
            sky.alpha.width(),
            sky.delta.width()
        )));
    }
    if sky_templates == 0 {
        return Err(AppError::oracle("Template count is zero; angular resolution is undefined."));
    }
    Ok((area / sky_templates as f64).sqrt())
}

/// Derive every step size for one run.
///
/// `oracle` is invoked exactly once, over the full sky patch.
pub fn compute_resolution(
    mismatch: f64,
    coherence_time: u64,
    region: &ParameterRegion,
    oracle: &dyn TemplateCounter,
) -> Result<Resolution, AppError> {
    let t = coherence_time as f64;
    let frequency = frequency_resolution(mismatch, t)?;
    let spindown = spindown_resolution(mismatch, t)?;

    let sky_templates = oracle.count_sky_templates(region)?;
    let angular = angular_resolution(&region.sky(), sky_templates)?;

    let resolution = Resolution {
        angular,
        frequency,
        spindown,
        sky_templates,
    };
    ensure_positive(&resolution)?;

    info!(
        angular,
        frequency,
        spindown,
        sky_templates,
        "search resolution"
    );
    Ok(resolution)
}

/// Estimated template count over the whole region, independent of the job split.
pub fn total_templates(resolution: &Resolution, region: &ParameterRegion) -> f64 {
    resolution.sky_templates as f64 * (region.f0.width() / resolution.frequency)
        * (region.f1.width() / resolution.spindown)
}

fn check_inputs(mismatch: f64, coherence_time: f64) -> Result<(), AppError> {
    if !(mismatch.is_finite() && mismatch > 0.0 && mismatch < 1.0) {
        return Err(AppError::config(format!(
            "Invalid mismatch {mismatch} (must satisfy 0 < mismatch < 1)."
        )));
    }
    if !(coherence_time.is_finite() && coherence_time > 0.0) {
        return Err(AppError::config(format!(
            "Invalid coherence time {coherence_time} (must be > 0)."
        )));
    }
    Ok(())
}

fn ensure_positive(resolution: &Resolution) -> Result<(), AppError> {
    for (name, value) in [
        ("angular", resolution.angular),
        ("frequency", resolution.frequency),
        ("spin-down", resolution.spindown),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(AppError::config(format!("Derived {name} resolution {value} is not positive.")));
        }
    }
    Ok(())
}
