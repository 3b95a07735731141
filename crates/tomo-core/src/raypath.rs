//! Discretized seismic ray paths: shell clipping and turning-point detection.
//!
//! A raypath is an ordered sequence of 3-D points with cumulative arc
//! distances, as returned by an external travel-time tool. Clipping against a
//! radial shell works purely on the recorded samples; nothing is
//! interpolated at the crossing, so a coarse discretization can yield segments shorter than
//! the geometric intersection, or none at all when the path dives through a
//! thin shell between samples.

use serde::{Deserialize, Serialize};

use crate::error::TomoError;
use crate::position::{eq_eps, geq_eps, leq_eps, FullPosition};

/// An immutable discretized ray path from source to receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raypath {
    positions: Vec<FullPosition>,
    /// Cumulative great-circle distance from the first point, degrees.
    distances: Vec<f64>,
    /// Seismic phase label, e.g. "ScS".
    phase: String,
}

impl Raypath {
    /// Build a raypath from travel-time-tool output.
    ///
    /// Fails when the arrays differ in length, fewer than two points are
    /// given, or the distances do not start at 0 and increase monotonically.
    pub fn new(
        positions: Vec<FullPosition>,
        distances: Vec<f64>,
        phase: impl Into<String>,
    ) -> Result<Self, TomoError> {
        if positions.len() != distances.len() {
            return Err(TomoError::LengthMismatch {
                positions: positions.len(),
                distances: distances.len(),
            });
        }
        if positions.len() < 2 {
            return Err(TomoError::TooFewPoints(positions.len()));
        }
        if !eq_eps(distances[0], 0.0) || distances.windows(2).any(|w| !geq_eps(w[1], w[0])) {
            return Err(TomoError::BadDistances);
        }
        Ok(Self { positions, distances, phase: phase.into() })
    }

    /// Two-point path straight from a source/receiver pair.
    pub fn from_endpoints(
        source: FullPosition,
        receiver: FullPosition,
        phase: impl Into<String>,
    ) -> Self {
        let span = source.horizontal.distance_deg(&receiver.horizontal);
        Self {
            positions: vec![source, receiver],
            distances: vec![0.0, span],
            phase: phase.into(),
        }
    }

    pub fn positions(&self) -> &[FullPosition] {
        &self.positions
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn source(&self) -> FullPosition {
        self.positions[0]
    }

    pub fn receiver(&self) -> FullPosition {
        self.positions[self.positions.len() - 1]
    }

    /// Sub-path over `start..=end` with distances re-based to start at 0.
    /// Fails when the range spans fewer than two points.
    pub fn clip(&self, start: usize, end: usize) -> Result<Raypath, TomoError> {
        if end >= self.positions.len() || start >= end {
            return Err(TomoError::DegenerateClip { start, end });
        }
        Ok(self.subpath(start, end))
    }

    /// `clip` without the range check; callers guarantee `start < end < len`.
    fn subpath(&self, start: usize, end: usize) -> Raypath {
        let base = self.distances[start];
        Raypath {
            positions: self.positions[start..=end].to_vec(),
            distances: self.distances[start..=end].iter().map(|d| d - base).collect(),
            phase: self.phase.clone(),
        }
    }

    /// Maximal sub-paths whose radii lie within `[lower, upper]`.
    ///
    /// A radius equal to a shell boundary (within tolerance) belongs to the
    /// run, except at index 0 where only a strictly-inside radius opens one.
    /// Runs of a single point are discarded.
    pub fn clip_inside_layer(&self, lower: f64, upper: f64) -> Vec<Raypath> {
        let mut segments = Vec::new();
        let mut open: Option<usize> = None;
        for (i, p) in self.positions.iter().enumerate() {
            let r = p.radius;
            let on_boundary = eq_eps(r, lower) || eq_eps(r, upper);
            if on_boundary {
                if open.is_none() && i > 0 {
                    open = Some(i);
                }
            } else if lower < r && r < upper {
                if open.is_none() {
                    open = Some(i);
                }
            } else if let Some(start) = open.take() {
                // Close at the preceding index; single-point runs vanish.
                if i - start >= 2 {
                    segments.push(self.subpath(start, i - 1));
                }
            }
        }
        if let Some(start) = open {
            let end = self.positions.len() - 1;
            if end > start {
                segments.push(self.subpath(start, end));
            }
        }
        segments
    }

    /// Maximal sub-paths whose radii lie outside `[lower, upper]`, i.e. at or
    /// below the lower boundary, or at or above the upper one.
    ///
    /// The two outside regions carry independent run state: a point on the
    /// lower boundary continues (or opens) the below run, a point on the
    /// upper boundary the above run, and a point strictly between the
    /// boundaries closes whichever run is open.
    pub fn clip_outside_layer(&self, lower: f64, upper: f64) -> Vec<Raypath> {
        let mut segments = Vec::new();
        let mut below: Option<usize> = None;
        let mut above: Option<usize> = None;
        let n = self.positions.len();
        for i in 0..n {
            let r = self.positions[i].radius;
            let on_lower = eq_eps(r, lower);
            let on_upper = eq_eps(r, upper);
            let strictly_below = !on_lower && r < lower;
            let strictly_above = !on_upper && r > upper;

            if strictly_below || on_lower {
                if below.is_none() && (i > 0 || strictly_below) {
                    below = Some(i);
                }
            } else if let Some(start) = below.take() {
                if i - start >= 2 {
                    segments.push(self.subpath(start, i - 1));
                }
            }

            if strictly_above || on_upper {
                if above.is_none() && (i > 0 || strictly_above) {
                    above = Some(i);
                }
            } else if let Some(start) = above.take() {
                if i - start >= 2 {
                    segments.push(self.subpath(start, i - 1));
                }
            }
        }
        for open in [below, above].into_iter().flatten() {
            if n - 1 > open {
                segments.push(self.subpath(open, n - 1));
            }
        }
        segments
    }

    /// Interior indices that are local (possibly non-strict) radius minima.
    /// Every index on a flat plateau qualifies; no deduplication.
    fn extrema_indices(&self, minima: bool) -> Vec<usize> {
        let n = self.positions.len();
        let mut found = Vec::new();
        for i in 1..n.saturating_sub(1) {
            let prev = self.positions[i - 1].radius;
            let here = self.positions[i].radius;
            let next = self.positions[i + 1].radius;
            let hit = if minima {
                leq_eps(here, prev) && leq_eps(here, next)
            } else {
                geq_eps(here, prev) && geq_eps(here, next)
            };
            if hit {
                found.push(i);
            }
        }
        found
    }

    /// Turning points: local radius minima (the deepest points of dips).
    pub fn turning_points(&self) -> Vec<FullPosition> {
        self.extrema_indices(true).into_iter().map(|i| self.positions[i]).collect()
    }

    /// The `index`-th turning point, or a range error.
    pub fn turning_point(&self, index: usize) -> Result<FullPosition, TomoError> {
        let points = self.turning_points();
        points
            .get(index)
            .copied()
            .ok_or(TomoError::TurningPointIndex { index, count: points.len() })
    }

    /// Bouncing points: local radius maxima (underside reflections).
    pub fn bouncing_points(&self) -> Vec<FullPosition> {
        self.extrema_indices(false).into_iter().map(|i| self.positions[i]).collect()
    }

    /// The `index`-th bouncing point, or a range error.
    pub fn bouncing_point(&self, index: usize) -> Result<FullPosition, TomoError> {
        let points = self.bouncing_points();
        points
            .get(index)
            .copied()
            .ok_or(TomoError::BouncingPointIndex { index, count: points.len() })
    }

    /// Azimuth from the `index`-th turning point to the receiver, degrees.
    pub fn turning_azimuth_deg(&self, index: usize) -> Result<f64, TomoError> {
        let tp = self.turning_point(index)?;
        Ok(tp.horizontal.azimuth_deg(&self.receiver().horizontal))
    }
}
