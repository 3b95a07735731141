//! 1-D sampled function with smooth and mosaic interpolation.
//!
//! Both the longitude resampling stage and the radial-grid stage of the
//! cross-section resampler go through [`Trace::value_at`], so the two stages
//! share one margin and mode policy.

use serde::{Deserialize, Serialize};

use crate::error::TomoError;
use crate::position::eq_eps;

/// Interpolation mode for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpMode {
    /// Piecewise-linear between bracketing samples.
    Smooth,
    /// Nearest-neighbour: each query snaps to the closest sample.
    Mosaic,
}

/// A 1-D function sampled at strictly ascending x-coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Trace {
    /// Build a trace. Fails if the arrays differ in length or `xs` is empty
    /// or not strictly ascending.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, TomoError> {
        if xs.len() != ys.len() {
            return Err(TomoError::TraceLengthMismatch { xs: xs.len(), ys: ys.len() });
        }
        if xs.is_empty() || xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TomoError::UnsortedTrace);
        }
        Ok(Self { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn min_x(&self) -> f64 {
        self.xs[0]
    }

    pub fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Value at `x`, or `None` when `x` is further than `margin` outside the
    /// sampled extent.
    ///
    /// A query that coincides with a sample (within the shared coordinate
    /// tolerance) returns that sample's value exactly in both modes. Outside
    /// the extent but within `margin`, both modes return the edge value; no
    /// sloped extrapolation. Interior gaps are not re-checked here; callers
    /// that care about holes split the coordinate array first.
    pub fn value_at(&self, x: f64, margin: f64, mode: InterpMode) -> Option<f64> {
        let n = self.xs.len();
        let first = self.xs[0];
        let last = self.xs[n - 1];
        if x < first {
            return (eq_eps(x, first) || first - x <= margin).then_some(self.ys[0]);
        }
        if x > last {
            return (eq_eps(x, last) || x - last <= margin).then_some(self.ys[n - 1]);
        }
        // Bracketing index: xs[i] <= x <= xs[i+1].
        let hi = self.xs.partition_point(|&xi| xi < x).min(self.xs.len() - 1);
        let lo = hi.saturating_sub(1);
        if eq_eps(self.xs[hi], x) {
            return Some(self.ys[hi]);
        }
        if eq_eps(self.xs[lo], x) {
            return Some(self.ys[lo]);
        }
        match mode {
            InterpMode::Smooth => {
                let t = (x - self.xs[lo]) / (self.xs[hi] - self.xs[lo]);
                Some(self.ys[lo] + t * (self.ys[hi] - self.ys[lo]))
            }
            InterpMode::Mosaic => {
                if x - self.xs[lo] <= self.xs[hi] - x {
                    Some(self.ys[lo])
                } else {
                    Some(self.ys[hi])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> Trace {
        Trace::new(vec![0.0, 1.0, 3.0], vec![10.0, 20.0, 40.0]).unwrap()
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            Trace::new(vec![0.0, 1.0], vec![1.0]),
            Err(TomoError::TraceLengthMismatch { .. })
        ));
        assert!(matches!(Trace::new(vec![], vec![]), Err(TomoError::UnsortedTrace)));
        assert!(matches!(
            Trace::new(vec![0.0, 0.0], vec![1.0, 2.0]),
            Err(TomoError::UnsortedTrace)
        ));
        assert!(matches!(
            Trace::new(vec![1.0, 0.5], vec![1.0, 2.0]),
            Err(TomoError::UnsortedTrace)
        ));
    }

    #[test]
    fn exact_sample_returns_stored_value_in_both_modes() {
        let t = trace();
        for mode in [InterpMode::Smooth, InterpMode::Mosaic] {
            assert_eq!(t.value_at(1.0, 0.0, mode), Some(20.0));
            assert_eq!(t.value_at(0.0, 0.0, mode), Some(10.0));
            assert_eq!(t.value_at(3.0, 0.0, mode), Some(40.0));
        }
    }

    #[test]
    fn smooth_is_linear_between_samples() {
        let t = trace();
        let v = t.value_at(2.0, 0.0, InterpMode::Smooth).unwrap();
        assert!((v - 30.0).abs() < 1e-12, "midpoint of 20..40 should be 30, got {v}");
    }

    #[test]
    fn mosaic_snaps_to_nearest_sample() {
        let t = trace();
        assert_eq!(t.value_at(1.4, 0.0, InterpMode::Mosaic), Some(20.0));
        assert_eq!(t.value_at(2.6, 0.0, InterpMode::Mosaic), Some(40.0));
        // Equidistant ties go to the lower sample.
        assert_eq!(t.value_at(2.0, 0.0, InterpMode::Mosaic), Some(20.0));
    }

    #[test]
    fn edge_extrapolation_limited_to_margin() {
        let t = trace();
        assert_eq!(t.value_at(-0.5, 1.0, InterpMode::Smooth), Some(10.0));
        assert_eq!(t.value_at(-1.5, 1.0, InterpMode::Smooth), None);
        assert_eq!(t.value_at(3.5, 1.0, InterpMode::Mosaic), Some(40.0));
        assert_eq!(t.value_at(4.5, 1.0, InterpMode::Mosaic), None);
    }

    #[test]
    fn single_sample_trace() {
        let t = Trace::new(vec![5.0], vec![7.0]).unwrap();
        assert_eq!(t.value_at(5.0, 0.0, InterpMode::Smooth), Some(7.0));
        assert_eq!(t.value_at(5.4, 0.5, InterpMode::Smooth), Some(7.0));
        assert_eq!(t.value_at(6.0, 0.5, InterpMode::Smooth), None);
    }
}
