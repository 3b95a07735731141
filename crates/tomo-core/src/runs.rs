//! Gap-aware partitioning of sorted coordinate sequences.
//!
//! A voxel layer rarely covers a meridian without holes; interpolating across
//! a hole would invent structure. These routines split a sorted coordinate
//! array into maximal contiguous runs and locate the run (if any) that covers
//! a target coordinate, so the resampler can leave uncovered samples empty.

use std::ops::Range;

/// Gap threshold multiplier: consecutive coordinates further apart than
/// `margin * GAP_FACTOR` belong to different runs. Empirically chosen in the
/// original tool; downstream masking depends on this exact value.
pub const GAP_FACTOR: f64 = 2.5;

/// Partition a strictly ascending coordinate array into maximal runs, cutting
/// wherever the gap between neighbours strictly exceeds `margin * GAP_FACTOR`.
pub fn split_at_gaps(coords: &[f64], margin: f64) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    if coords.is_empty() {
        return runs;
    }
    let threshold = margin * GAP_FACTOR;
    let mut start = 0;
    for i in 1..coords.len() {
        if coords[i] - coords[i - 1] > threshold {
            runs.push(start..i);
            start = i;
        }
    }
    runs.push(start..coords.len());
    runs
}

/// Index range of the first run whose extended span `[first - margin,
/// last + margin)` contains `target`, or `None` if no run qualifies.
pub fn covering_run_range(coords: &[f64], target: f64, margin: f64) -> Option<Range<usize>> {
    split_at_gaps(coords, margin).into_iter().find(|run| {
        let first = coords[run.start];
        let last = coords[run.end - 1];
        target >= first - margin && target < last + margin
    })
}

/// Raw (unextended) coordinate values of the run covering `target`.
pub fn covering_run<'a>(coords: &'a [f64], target: f64, margin: f64) -> Option<&'a [f64]> {
    covering_run_range(coords, target, margin).map(|run| &coords[run])
}
