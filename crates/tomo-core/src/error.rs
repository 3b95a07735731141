//! Error type shared by the whole engine.

use thiserror::Error;

use crate::position::FullPosition;

#[derive(Debug, Clone, Error)]
pub enum TomoError {
    /// Raypath construction with positions/distances arrays of different length.
    #[error("raypath has {positions} positions but {distances} distances")]
    LengthMismatch { positions: usize, distances: usize },

    /// A raypath needs a source and a receiver at minimum.
    #[error("raypath needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Cumulative distances must start at 0 and never decrease.
    #[error("raypath distances must start at 0 and be non-decreasing")]
    BadDistances,

    /// A clipped sub-path would contain fewer than two points.
    #[error("clip range {start}..={end} spans fewer than 2 points")]
    DegenerateClip { start: usize, end: usize },

    /// Turning point requested by an index past the end of the list.
    #[error("turning point index {index} out of range ({count} found)")]
    TurningPointIndex { index: usize, count: usize },

    /// Bouncing point requested by an index past the end of the list.
    #[error("bouncing point index {index} out of range ({count} found)")]
    BouncingPointIndex { index: usize, count: usize },

    /// Trace arrays of different length.
    #[error("trace has {xs} x-coordinates but {ys} values")]
    TraceLengthMismatch { xs: usize, ys: usize },

    /// Trace x-coordinates must be strictly ascending and non-empty.
    #[error("trace x-coordinates must be non-empty and strictly ascending")]
    UnsortedTrace,

    /// A voxel grid with no positions has no layers to resample.
    #[error("voxel grid needs at least one position")]
    EmptyGrid,

    /// A supplied value map contains a key outside the declared position set.
    #[error("position {0:?} is not in the voxel grid")]
    ForeignPosition(FullPosition),

    /// Cross-section reference points coincide, leaving the azimuth undefined.
    #[error("cross-section reference points coincide")]
    DegenerateSection,
}
