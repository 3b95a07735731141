//! Vertical great-circle cross-sections through a sparse voxel field.
//!
//! The resampler turns an irregularly-populated position→value map into a
//! dense (arc-distance, radius) grid along an arbitrary great-circle arc.
//! Interpolation is staged: west–east lines are resampled onto the section's
//! longitudes, then each sample point interpolates along latitude inside a
//! gap-checked run, then down the vertical trace onto a uniform radial grid.
//! Sample points with no coverage are omitted, never zero-filled.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::TomoError;
use crate::position::{eq_eps, HorizontalPosition, COORD_EPS};
use crate::runs::covering_run_range;
use crate::trace::{InterpMode, Trace};
use crate::voxel::{VoxelGrid, VoxelValues};

// ── Refinement constants ─────────────────────────────────────────────────────

/// The sampling arc is this much finer than the source field's typical
/// horizontal spacing.
pub const DEFAULT_HORIZONTAL_REFINE: f64 = 2.0;
/// Radial grid refinement relative to the field's typical layer spacing.
pub const DEFAULT_VERTICAL_REFINE: f64 = 2.0;

// ── Parameters ───────────────────────────────────────────────────────────────

/// Horizontal interpolation margin, in degrees or km. Kilometres convert via
/// the field's mean radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Margin {
    Degrees(f64),
    Kilometers(f64),
}

impl Margin {
    pub fn to_degrees(self, mean_radius_km: f64) -> f64 {
        match self {
            Margin::Degrees(d) => d,
            Margin::Kilometers(km) => (km / mean_radius_km).to_degrees(),
        }
    }
}

/// Cross-section definition: a reference great-circle segment, optional
/// extensions beyond it, and the interpolation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionParams {
    pub pos0: HorizontalPosition,
    pub pos1: HorizontalPosition,
    /// Signed extension of the drawn arc before `pos0`, degrees.
    pub before_deg: f64,
    /// Signed extension after `pos1`, degrees.
    pub after_deg: f64,
    pub horizontal_margin: Margin,
    /// How far (km) the vertical trace may extrapolate past its end radii.
    pub vertical_margin_km: f64,
    /// Nearest-neighbour output instead of smooth interpolation.
    pub mosaic: bool,
    /// Arc sampling refinement; must be positive.
    pub horizontal_refine: f64,
    /// Radial grid refinement; must be positive.
    pub vertical_refine: f64,
}

impl SectionParams {
    pub fn new(pos0: HorizontalPosition, pos1: HorizontalPosition) -> Self {
        Self {
            pos0,
            pos1,
            before_deg: 0.0,
            after_deg: 0.0,
            horizontal_margin: Margin::Degrees(1.0),
            vertical_margin_km: 50.0,
            mosaic: false,
            horizontal_refine: DEFAULT_HORIZONTAL_REFINE,
            vertical_refine: DEFAULT_VERTICAL_REFINE,
        }
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

/// A prepared sampling grid: arc sample points, radial grid, and resolved
/// interpolation policy for one cross-section through one field geometry.
#[derive(Debug, Clone)]
pub struct SectionProfile {
    /// (arc distance from the drawn start, position), ascending by distance.
    samples: Vec<(f64, HorizontalPosition)>,
    /// Uniform radial grid spanning the field's radius range.
    sample_radii: Vec<f64>,
    /// Distinct sample longitudes, with `lon_index[j]` mapping sample `j` in.
    distinct_lons: Vec<f64>,
    lon_index: Vec<usize>,
    margin_deg: f64,
    vertical_margin_km: f64,
    mode: InterpMode,
}

impl SectionProfile {
    pub fn new(params: &SectionParams, grid: &VoxelGrid) -> Result<Self, TomoError> {
        if params.pos0.distance_deg(&params.pos1) <= COORD_EPS {
            return Err(TomoError::DegenerateSection);
        }

        // ── Drawn arc: extend the reference segment at both ends ────────────
        let az01 = params.pos0.azimuth_deg(&params.pos1);
        let start = params.pos0.point_at((az01 + 180.0).rem_euclid(360.0), params.before_deg);
        let az_on = (params.pos1.azimuth_deg(&params.pos0) + 180.0).rem_euclid(360.0);
        let end = params.pos1.point_at(az_on, params.after_deg);
        let arc_len = start.distance_deg(&end);
        if arc_len <= COORD_EPS {
            return Err(TomoError::DegenerateSection);
        }

        // ── Sample points, finer than the source grid ───────────────────────
        let interval = grid.typical_latitude_spacing() / params.horizontal_refine;
        let n = ((arc_len / interval).round() as usize + 1).max(2);
        let azimuth = start.azimuth_deg(&end);
        let step = arc_len / (n - 1) as f64;
        let samples: Vec<(f64, HorizontalPosition)> = (0..n)
            .map(|i| {
                let d = i as f64 * step;
                (d, start.point_at(azimuth, d))
            })
            .collect();

        // ── Uniform radial grid over the field's radius range ───────────────
        let radii = grid.radii();
        let rmin = radii[0];
        let rmax = radii[radii.len() - 1];
        let sample_radii = if rmax - rmin <= COORD_EPS {
            vec![rmin]
        } else {
            let dr = grid.typical_radius_spacing() / params.vertical_refine;
            let nr = (((rmax - rmin) / dr).round() as usize + 1).max(2);
            let rstep = (rmax - rmin) / (nr - 1) as f64;
            (0..nr).map(|i| rmin + i as f64 * rstep).collect()
        };

        // ── Distinct sample longitudes for the line-resampling stage ────────
        let mut distinct_lons: Vec<f64> = Vec::new();
        let mut lon_index = Vec::with_capacity(samples.len());
        for (_, pos) in &samples {
            let idx = match distinct_lons.iter().position(|&l| eq_eps(l, pos.lon)) {
                Some(i) => i,
                None => {
                    distinct_lons.push(pos.lon);
                    distinct_lons.len() - 1
                }
            };
            lon_index.push(idx);
        }

        Ok(Self {
            samples,
            sample_radii,
            distinct_lons,
            lon_index,
            margin_deg: params.horizontal_margin.to_degrees(grid.mean_radius()),
            vertical_margin_km: params.vertical_margin_km,
            mode: if params.mosaic { InterpMode::Mosaic } else { InterpMode::Smooth },
        })
    }

    pub fn sample_points(&self) -> &[(f64, HorizontalPosition)] {
        &self.samples
    }

    pub fn sample_radii(&self) -> &[f64] {
        &self.sample_radii
    }

    /// Resolved horizontal margin in degrees.
    pub fn margin_deg(&self) -> f64 {
        self.margin_deg
    }

    /// Resample the bound field onto this profile's grid.
    ///
    /// Each arc sample point is independent; they run on the rayon pool and
    /// the indexed collect reassembles the traces already ordered by arc
    /// distance, so no shared map is touched.
    pub fn compute(&self, values: &VoxelValues) -> SectionGrid {
        // ── Stage 1: west–east lines onto the section longitudes ────────────
        // resampled[layer][line][distinct-lon], read-only for stage 2.
        let resampled: Vec<Vec<Vec<Option<f64>>>> = values
            .layers()
            .iter()
            .map(|layer| {
                layer
                    .lines
                    .iter()
                    .map(|line| {
                        let trace = Trace::new(line.lons.clone(), line.values.clone()).ok();
                        self.distinct_lons
                            .iter()
                            .map(|&lon| {
                                trace.as_ref().and_then(|t| {
                                    t.value_at(line.frame(lon), self.margin_deg, self.mode)
                                })
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        // ── Stages 2–3, parallel per sample point ───────────────────────────
        let traces: Vec<SectionTrace> = self
            .samples
            .par_iter()
            .enumerate()
            .filter_map(|(j, &(dist, pos))| {
                self.sample_trace(values, &resampled, self.lon_index[j], dist, pos)
            })
            .collect();

        debug!(
            "cross-section: {}/{} sample points covered, {} grid radii",
            traces.len(),
            self.samples.len(),
            self.sample_radii.len()
        );
        SectionGrid { traces }
    }

    /// Stages 2–3 for one sample point: latitude interpolation inside the
    /// covering run per layer, then the vertical trace onto the radial grid.
    fn sample_trace(
        &self,
        values: &VoxelValues,
        resampled: &[Vec<Vec<Option<f64>>>],
        lon_idx: usize,
        dist: f64,
        pos: HorizontalPosition,
    ) -> Option<SectionTrace> {
        let mut layer_radii = Vec::new();
        let mut layer_values = Vec::new();
        for (l, layer) in values.layers().iter().enumerate() {
            let mut lats = Vec::new();
            let mut vals = Vec::new();
            for (k, &lat) in layer.latitudes.iter().enumerate() {
                if let Some(v) = resampled[l][k][lon_idx] {
                    lats.push(lat);
                    vals.push(v);
                }
            }
            if lats.is_empty() {
                continue;
            }
            let run = match covering_run_range(&lats, pos.lat, self.margin_deg) {
                Some(r) => r,
                None => continue, // the sample latitude sits in a data gap
            };
            let lat_trace = match Trace::new(lats[run.clone()].to_vec(), vals[run].to_vec()) {
                Ok(t) => t,
                Err(_) => continue,
            };
            if let Some(v) = lat_trace.value_at(pos.lat, self.margin_deg, self.mode) {
                layer_radii.push(values.radii()[l]);
                layer_values.push(v);
            }
        }
        if layer_radii.is_empty() {
            return None;
        }

        let vertical = match Trace::new(layer_radii, layer_values) {
            Ok(t) => t,
            Err(_) => return None,
        };
        let mut radii = Vec::new();
        let mut vals = Vec::new();
        for &r in &self.sample_radii {
            if let Some(v) = vertical.value_at(r, self.vertical_margin_km, self.mode) {
                radii.push(r);
                vals.push(v);
            }
        }
        if radii.is_empty() {
            return None;
        }
        Some(SectionTrace { distance_deg: dist, position: pos, radii, values: vals })
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

/// One vertical trace of the resampled section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTrace {
    /// Arc distance from the drawn start point, degrees.
    pub distance_deg: f64,
    pub position: HorizontalPosition,
    /// Radii with defined values, ascending; parallel to `values`.
    pub radii: Vec<f64>,
    pub values: Vec<f64>,
}

/// The dense resampled grid: vertical traces ordered by arc distance.
/// Uncovered sample points are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionGrid {
    traces: Vec<SectionTrace>,
}

impl SectionGrid {
    pub fn traces(&self) -> &[SectionTrace] {
        &self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Flatten to one record per (arc-distance, radius) pair. The five fields
    /// and their order are the contract with the plotting collaborator.
    pub fn records(&self) -> Vec<SectionRecord> {
        self.traces
            .iter()
            .flat_map(|t| {
                t.radii.iter().zip(&t.values).map(|(&radius, &value)| SectionRecord {
                    distance_deg: t.distance_deg,
                    latitude: t.position.lat,
                    longitude: t.position.lon,
                    radius,
                    value,
                })
            })
            .collect()
    }
}

/// One grid node of the resampled cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub distance_deg: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::FullPosition;

    /// Regular grid: lats -10..10 step 5, lons -10..10 step 5, given radii.
    fn grid(radii: &[f64]) -> VoxelGrid {
        let mut positions = Vec::new();
        for &r in radii {
            for i in 0..5 {
                for j in 0..5 {
                    positions.push(FullPosition::new(
                        -10.0 + i as f64 * 5.0,
                        -10.0 + j as f64 * 5.0,
                        r,
                    ));
                }
            }
        }
        VoxelGrid::new(positions).unwrap()
    }

    fn constant_values(grid: &VoxelGrid, f: impl Fn(&FullPosition) -> f64) -> Vec<(FullPosition, f64)> {
        grid.positions().iter().map(|p| (*p, f(p))).collect()
    }

    #[test]
    fn degenerate_reference_points_are_rejected() {
        let g = grid(&[3480.0]);
        let p = HorizontalPosition::new(0.0, 0.0);
        let params = SectionParams::new(p, p);
        assert!(matches!(SectionProfile::new(&params, &g), Err(TomoError::DegenerateSection)));
    }

    #[test]
    fn extensions_stretch_the_drawn_arc() {
        let g = grid(&[3480.0]);
        let mut params = SectionParams::new(
            HorizontalPosition::new(0.0, 0.0),
            HorizontalPosition::new(0.0, 10.0),
        );
        params.before_deg = 5.0;
        params.after_deg = 5.0;
        let profile = SectionProfile::new(&params, &g).unwrap();
        let pts = profile.sample_points();
        assert!((pts[0].1.lon - (-5.0)).abs() < 1e-9, "start extends west of pos0");
        assert!((pts[pts.len() - 1].1.lon - 15.0).abs() < 1e-9, "end extends east of pos1");
        // 20 deg arc at 2.5 deg interval: 9 points.
        assert_eq!(pts.len(), 9);
        assert!((pts[1].0 - 2.5).abs() < 1e-9);
    }

    #[test]
    fn km_margin_converts_via_mean_radius() {
        let mean: f64 = 3480.0;
        let km = Margin::Kilometers(2.0 * mean.to_radians());
        assert!((km.to_degrees(mean) - 2.0).abs() < 1e-12);
        assert!((Margin::Degrees(2.0).to_degrees(mean) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_sample_recovers_original_value_in_both_modes() {
        let g = grid(&[3480.0]);
        let values = constant_values(&g, |p| p.lat() * 10.0 + p.lon());
        for mosaic in [false, true] {
            let mut params = SectionParams::new(
                HorizontalPosition::new(0.0, -10.0),
                HorizontalPosition::new(0.0, 10.0),
            );
            params.mosaic = mosaic;
            let profile = SectionProfile::new(&params, &g).unwrap();
            let bound = g.bind(&values).unwrap();
            let section = profile.compute(&bound);
            let records = section.records();
            // The first sample point coincides with grid node (0, -10, 3480).
            let first = records
                .iter()
                .find(|r| r.distance_deg.abs() < 1e-9)
                .expect("coincident sample must be covered");
            assert!(
                (first.value - (-10.0)).abs() < 1e-12,
                "mosaic={mosaic}: expected the stored value, got {}",
                first.value
            );
            assert!((first.radius - 3480.0).abs() < 1e-12);
        }
    }

    #[test]
    fn smooth_and_mosaic_differ_between_grid_nodes() {
        let g = grid(&[3480.0]);
        // Value equals latitude, so smooth interpolation is exact.
        let values = constant_values(&g, |p| p.lat());
        let bound = g.bind(&values).unwrap();
        let p0 = HorizontalPosition::new(-10.0, 0.0);
        let p1 = HorizontalPosition::new(10.0, 0.0);

        let mut params = SectionParams::new(p0, p1);
        params.horizontal_refine = 4.0; // 1.25 deg sampling
        let smooth = SectionProfile::new(&params, &g).unwrap().compute(&bound);
        params.mosaic = true;
        let mosaic = SectionProfile::new(&params, &g).unwrap().compute(&bound);

        // Sample at lat 1.25 (distance 11.25): between the 0 and 5 deg lines.
        let pick = |grid: &SectionGrid| {
            grid.records()
                .into_iter()
                .find(|r| (r.latitude - 1.25).abs() < 1e-6)
                .expect("sample at lat 1.25")
        };
        let s = pick(&smooth);
        let m = pick(&mosaic);
        assert!((s.value - 1.25).abs() < 1e-9, "smooth follows the gradient, got {}", s.value);
        assert!((m.value - 0.0).abs() < 1e-12, "mosaic snaps to the nearer line, got {}", m.value);
    }

    #[test]
    fn gap_wider_than_threshold_leaves_samples_uncovered() {
        // Latitude lines at -10..0 and 15..20; the 15-deg hole exceeds the
        // margin * 2.5 threshold, so mid-gap samples get no value.
        let mut positions = Vec::new();
        for lat in [-10.0, -5.0, 0.0, 15.0, 20.0] {
            for j in 0..5 {
                positions.push(FullPosition::new(lat, -10.0 + j as f64 * 5.0, 3480.0));
            }
        }
        let g = VoxelGrid::new(positions).unwrap();
        let values = constant_values(&g, |p| p.lat());
        let bound = g.bind(&values).unwrap();

        let mut params = SectionParams::new(
            HorizontalPosition::new(-10.0, 0.0),
            HorizontalPosition::new(20.0, 0.0),
        );
        params.horizontal_margin = Margin::Degrees(2.0);
        params.horizontal_refine = 4.0; // 1.25 deg sampling
        let profile = SectionProfile::new(&params, &g).unwrap();
        let section = profile.compute(&bound);
        let records = section.records();

        // Deep in the gap: absent, not zero-filled.
        assert!(
            !records.iter().any(|r| (r.latitude - 7.5).abs() < 1e-6),
            "mid-gap sample must be omitted"
        );
        // Just past the run edge but within the margin: edge value.
        let edge = records
            .iter()
            .find(|r| (r.latitude - 1.25).abs() < 1e-6)
            .expect("within-margin sample past the run edge");
        assert!((edge.value - 0.0).abs() < 1e-12, "edge extension is flat, got {}", edge.value);
        // Both run interiors are covered.
        assert!(records.iter().any(|r| (r.latitude + 10.0).abs() < 1e-6));
        assert!(records.iter().any(|r| (r.latitude - 20.0).abs() < 1e-6));
    }

    #[test]
    fn vertical_extrapolation_respects_the_radius_margin() {
        // Two layers 100 km apart, but values only on the lower one. The
        // radial grid is 3480/3530/3580; with a 60 km vertical margin the
        // 3530 node takes the edge value and the 3580 node stays empty.
        let g = grid(&[3480.0, 3580.0]);
        let values: Vec<(FullPosition, f64)> = g
            .positions()
            .iter()
            .filter(|p| (p.radius - 3480.0).abs() < 1e-9)
            .map(|p| (*p, 7.0))
            .collect();
        let bound = g.bind(&values).unwrap();
        let mut params = SectionParams::new(
            HorizontalPosition::new(0.0, -10.0),
            HorizontalPosition::new(0.0, 10.0),
        );
        params.vertical_margin_km = 60.0;
        let profile = SectionProfile::new(&params, &g).unwrap();
        assert_eq!(profile.sample_radii(), &[3480.0, 3530.0, 3580.0]);
        let section = profile.compute(&bound);
        for trace in section.traces() {
            assert_eq!(trace.radii, vec![3480.0, 3530.0]);
            assert!(trace.values.iter().all(|v| (v - 7.0).abs() < 1e-12));
        }
        assert!(!section.is_empty());
    }

    #[test]
    fn records_preserve_the_five_field_contract() {
        let g = grid(&[3480.0]);
        let values = constant_values(&g, |_| 1.5);
        let bound = g.bind(&values).unwrap();
        let params = SectionParams::new(
            HorizontalPosition::new(0.0, -10.0),
            HorizontalPosition::new(0.0, 10.0),
        );
        let section = SectionProfile::new(&params, &g).unwrap().compute(&bound);
        let records = section.records();
        assert!(!records.is_empty());
        for r in &records {
            assert!(r.distance_deg >= 0.0);
            assert!(r.latitude.abs() <= 90.0);
            assert!((-180.0..180.0).contains(&r.longitude));
            assert!((r.radius - 3480.0).abs() < 1e-12);
            assert!((r.value - 1.5).abs() < 1e-12);
        }
        // Ordered by arc distance.
        for w in records.windows(2) {
            assert!(w[0].distance_deg <= w[1].distance_deg);
        }
    }
}
