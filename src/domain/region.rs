//! Parameter-space extents.
//!
//! Every dimension is described by a `Band`: a center and a half-width. The
//! search executables take a lower corner plus a full band, so both views are
//! exposed.

use serde::{Deserialize, Serialize};

/// A closed interval `[center - half_width, center + half_width]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub center: f64,
    pub half_width: f64,
}

impl Band {
    pub fn new(center: f64, half_width: f64) -> Self {
        Self { center, half_width }
    }

    /// Build a band from a full width centred on `center`.
    pub fn from_width(center: f64, width: f64) -> Self {
        Self {
            center,
            half_width: width / 2.0,
        }
    }

    /// A band of zero width.
    pub fn point(center: f64) -> Self {
        Self::new(center, 0.0)
    }

    pub fn width(&self) -> f64 {
        2.0 * self.half_width
    }

    pub fn lower(&self) -> f64 {
        self.center - self.half_width
    }

    pub fn upper(&self) -> f64 {
        self.center + self.half_width
    }

    /// The `index`-th of equally sized sub-bands of width `step`, counted from
    /// the lower bound.
    pub fn slice(&self, index: usize, step: f64) -> Band {
        Band {
            center: self.lower() + index as f64 * step + step / 2.0,
            half_width: step / 2.0,
        }
    }
}

/// Sky patch in equatorial coordinates (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPatch {
    pub alpha: Band,
    pub delta: Band,
}

impl SkyPatch {
    /// Solid-angle proxy `Δα·Δδ` used to turn a template count into a step.
    pub fn area(&self) -> f64 {
        self.alpha.width() * self.delta.width()
    }
}

/// The full volume to be searched.
///
/// Supplied once by the caller and never mutated; partition cells carry their
/// own copies with narrowed bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRegion {
    pub alpha: Band,
    pub delta: Band,
    /// Frequency (Hz).
    pub f0: Band,
    /// First spin-down (Hz/s).
    pub f1: Band,
    /// Second spin-down (Hz/s^2). Carried through, never split.
    pub f2: Band,
    /// Third spin-down (Hz/s^3). Carried through, never split.
    pub f3: Band,
}

impl ParameterRegion {
    pub fn sky(&self) -> SkyPatch {
        SkyPatch {
            alpha: self.alpha,
            delta: self.delta,
        }
    }

    /// Signal frequency propagated from the parameter reference time by `dt`
    /// seconds using the spin-down centres.
    pub fn frequency_at(&self, dt: f64) -> f64 {
        self.f0.center + self.f1.center * dt + self.f2.center * dt.powi(2) + self.f3.center * dt.powi(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_bounds_follow_center_and_half_width() {
        let b = Band::from_width(1.0, 0.5);
        assert!((b.lower() - 0.75).abs() < 1e-15);
        assert!((b.upper() - 1.25).abs() < 1e-15);
        assert!((b.width() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn slices_tile_the_band() {
        let b = Band::from_width(0.0, 1.0);
        let step = b.width() / 4.0;
        let slices: Vec<Band> = (0..4).map(|i| b.slice(i, step)).collect();
        assert!((slices[0].lower() - b.lower()).abs() < 1e-12);
        assert!((slices[3].upper() - b.upper()).abs() < 1e-12);
        for pair in slices.windows(2) {
            assert!((pair[0].upper() - pair[1].lower()).abs() < 1e-12);
        }
    }

    #[test]
    fn frequency_at_applies_spindown_polynomial() {
        let region = ParameterRegion {
            alpha: Band::point(0.0),
            delta: Band::point(0.0),
            f0: Band::point(100.0),
            f1: Band::point(-1e-9),
            f2: Band::point(1e-18),
            f3: Band::point(0.0),
        };
        let dt = 1.0e6;
        let expected = 100.0 - 1e-3 + 1e-6;
        assert!((region.frequency_at(dt) - expected).abs() < 1e-12);
    }
}
