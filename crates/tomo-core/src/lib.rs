//! Core engine for seismic tomography plotting pipelines: raypath shell
//! clipping with turning-point detection, and resampling of sparse 3-D model
//! perturbations onto vertical great-circle cross-section grids.
//!
//! Catalog I/O, travel-time computation, and plot-script generation live in
//! external collaborators; this crate only transforms geometric and physical
//! samples into grid-ready values.

pub mod error;
pub mod position;
pub mod raypath;
pub mod runs;
pub mod section;
pub mod trace;
pub mod voxel;

pub use error::TomoError;
pub use position::{eq_eps, FullPosition, HorizontalPosition, COORD_EPS, EARTH_RADIUS_KM};
pub use raypath::Raypath;
pub use runs::{covering_run, covering_run_range, split_at_gaps, GAP_FACTOR};
pub use section::{
    Margin, SectionGrid, SectionParams, SectionProfile, SectionRecord, SectionTrace,
};
pub use trace::{InterpMode, Trace};
pub use voxel::{VoxelGrid, VoxelValues};
