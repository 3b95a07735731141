//! Sparse voxel fields: the discrete position sets tomographic models live on.
//!
//! A [`VoxelGrid`] declares the positions a model is defined at, organized
//! into radius layers. Scalar values (perturbations, masks) arrive as plain
//! position→value entries and are validated against the grid by [`VoxelGrid::bind`],
//! which also groups them into the per-latitude west–east lines the
//! cross-section resampler interpolates along.

use serde::{Deserialize, Serialize};

use crate::error::TomoError;
use crate::position::{eq_eps, FullPosition, COORD_EPS};

/// Spacing fallbacks for degenerate fields with a single latitude or radius.
const FALLBACK_LAT_SPACING_DEG: f64 = 1.0;
const FALLBACK_RADIUS_SPACING_KM: f64 = 50.0;

/// The declared discrete position set of a voxel field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoxelGrid {
    positions: Vec<FullPosition>,
    /// Distinct radii, ascending; positions sharing a radius form one layer.
    radii: Vec<f64>,
    /// (radius, lat, lon) triples sorted lexicographically for membership tests.
    sorted: Vec<(f64, f64, f64)>,
}

impl VoxelGrid {
    pub fn new(positions: Vec<FullPosition>) -> Result<Self, TomoError> {
        if positions.is_empty() {
            return Err(TomoError::EmptyGrid);
        }
        let radii = distinct_sorted(positions.iter().map(|p| p.radius));
        let mut sorted: Vec<(f64, f64, f64)> =
            positions.iter().map(|p| (p.radius, p.lat(), p.lon())).collect();
        sorted.sort_by(|a, b| {
            a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.total_cmp(&b.2))
        });
        Ok(Self { positions, radii, sorted })
    }

    pub fn positions(&self) -> &[FullPosition] {
        &self.positions
    }

    /// Distinct radii, ascending.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Mean of the distinct radii; used to convert km margins to degrees.
    pub fn mean_radius(&self) -> f64 {
        self.radii.iter().sum::<f64>() / self.radii.len() as f64
    }

    /// Median gap between neighbouring distinct latitudes across the field.
    pub fn typical_latitude_spacing(&self) -> f64 {
        let lats = distinct_sorted(self.positions.iter().map(|p| p.lat()));
        median_gap(&lats).unwrap_or(FALLBACK_LAT_SPACING_DEG)
    }

    /// Median gap between neighbouring distinct radii.
    pub fn typical_radius_spacing(&self) -> f64 {
        median_gap(&self.radii).unwrap_or(FALLBACK_RADIUS_SPACING_KM)
    }

    /// Membership within the shared coordinate tolerance.
    pub fn contains(&self, p: &FullPosition) -> bool {
        let start = self.sorted.partition_point(|q| q.0 < p.radius - COORD_EPS);
        self.sorted[start..]
            .iter()
            .take_while(|q| q.0 <= p.radius + COORD_EPS)
            .any(|q| eq_eps(q.1, p.lat()) && eq_eps(q.2, p.lon()))
    }

    /// Validate a position→value map against this grid and organize it into
    /// per-layer, per-latitude west–east lines.
    ///
    /// Fails fast on the first entry whose position is not a grid member;
    /// that is a caller-contract violation, not sparse coverage (entries may
    /// cover any subset of the grid).
    pub fn bind(&self, entries: &[(FullPosition, f64)]) -> Result<VoxelValues, TomoError> {
        for (p, _) in entries {
            if !self.contains(p) {
                return Err(TomoError::ForeignPosition(*p));
            }
        }
        let mut buckets: Vec<Vec<(f64, f64, f64)>> = vec![Vec::new(); self.radii.len()];
        for (p, v) in entries {
            // contains() passed, so the radius matches one of the layers.
            if let Some(l) = self.radii.iter().position(|r| eq_eps(*r, p.radius)) {
                buckets[l].push((p.lat(), p.lon(), *v));
            }
        }
        let layers = buckets.into_iter().map(build_layer).collect();
        Ok(VoxelValues { radii: self.radii.clone(), layers })
    }
}

/// Scalar values bound to a [`VoxelGrid`], grouped for resampling.
#[derive(Debug, Clone)]
pub struct VoxelValues {
    radii: Vec<f64>,
    layers: Vec<ValueLayer>,
}

impl VoxelValues {
    /// Distinct radii of the owning grid (layers are parallel to this).
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub(crate) fn layers(&self) -> &[ValueLayer] {
        &self.layers
    }

    /// Number of bound values across all layers.
    pub fn len(&self) -> usize {
        self.layers.iter().flat_map(|l| l.lines.iter()).map(|l| l.lons.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One radius layer: parallel `latitudes` / `lines`, latitudes ascending.
#[derive(Debug, Clone)]
pub(crate) struct ValueLayer {
    pub latitudes: Vec<f64>,
    pub lines: Vec<LonLine>,
}

/// One west–east line of values at a fixed (radius, latitude).
#[derive(Debug, Clone)]
pub(crate) struct LonLine {
    /// Longitudes re-framed to [0, 360) when the line crosses the antimeridian.
    pub positive_frame: bool,
    pub lons: Vec<f64>,
    pub values: Vec<f64>,
}

impl LonLine {
    /// Express a query longitude in this line's frame.
    pub fn frame(&self, lon: f64) -> f64 {
        if self.positive_frame {
            lon.rem_euclid(360.0)
        } else {
            lon
        }
    }
}

fn build_layer(entries: Vec<(f64, f64, f64)>) -> ValueLayer {
    let latitudes = distinct_sorted(entries.iter().map(|e| e.0));
    let mut lines = Vec::with_capacity(latitudes.len());
    for &lat in &latitudes {
        let mut pairs: Vec<(f64, f64)> = entries
            .iter()
            .filter(|e| eq_eps(e.0, lat))
            .map(|e| (e.1, e.2))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        // A spread beyond 180 degrees in the signed frame means the line
        // crosses the antimeridian; re-frame to [0, 360) and re-sort.
        let positive_frame = pairs.len() > 1
            && pairs[pairs.len() - 1].0 - pairs[0].0 > 180.0;
        if positive_frame {
            for p in &mut pairs {
                p.0 = p.0.rem_euclid(360.0);
            }
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        let mut lons: Vec<f64> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (lon, v) in pairs {
            if let (Some(&prev), Some(slot)) = (lons.last(), values.last_mut()) {
                // Duplicate position: keep the most recent value.
                if eq_eps(prev, lon) {
                    *slot = v;
                    continue;
                }
            }
            lons.push(lon);
            values.push(v);
        }
        lines.push(LonLine { positive_frame, lons, values });
    }
    ValueLayer { latitudes, lines }
}

/// Sorted values with eps-duplicates merged (first representative kept).
fn distinct_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| eq_eps(*a, *b));
    v
}

/// Median of consecutive gaps, or `None` for fewer than two values.
fn median_gap(sorted: &[f64]) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }
    let mut gaps: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    gaps.sort_by(f64::total_cmp);
    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 1 {
        Some(gaps[mid])
    } else {
        Some((gaps[mid - 1] + gaps[mid]) / 2.0)
    }
}
