//! Spherical position types for the tomography engine.
//! All coordinate math uses f64; angles are degrees unless noted.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in km; the sphere all great-circle math runs on.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Tolerance for "same radius / same latitude / same longitude" comparisons.
/// Upstream travel-time output carries trig round-off, so every sameness
/// check in the crate goes through [`eq_eps`] with this constant, never a
/// bare `==` on floats.
pub const COORD_EPS: f64 = 1e-6;

/// `a` and `b` are the same coordinate within [`COORD_EPS`].
#[inline]
pub fn eq_eps(a: f64, b: f64) -> bool {
    (a - b).abs() <= COORD_EPS
}

/// `a <= b` allowing [`COORD_EPS`] of slack.
#[inline]
pub fn leq_eps(a: f64, b: f64) -> bool {
    a <= b + COORD_EPS
}

/// `a >= b` allowing [`COORD_EPS`] of slack.
#[inline]
pub fn geq_eps(a: f64, b: f64) -> bool {
    a >= b - COORD_EPS
}

/// A point on the Earth's surface in geographic coordinates.
///
/// Longitude is normalized to [-180, 180) at construction; point sets that
/// cross the antimeridian use [`HorizontalPosition::lon_0_360`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalPosition {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, normalized to [-180, 180).
    pub lon: f64,
}

impl HorizontalPosition {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon: normalize_lon(lon) }
    }

    /// Longitude re-expressed in [0, 360).
    pub fn lon_0_360(&self) -> f64 {
        self.lon.rem_euclid(360.0)
    }

    /// Unit vector in Earth-centered Cartesian coordinates.
    fn unit_vec(&self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }

    /// Great-circle distance to `other` in degrees.
    pub fn distance_deg(&self, other: &HorizontalPosition) -> f64 {
        let a = self.unit_vec();
        let b = other.unit_vec();
        let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
        dot.acos().to_degrees()
    }

    /// Great-circle distance to `other` in km on the [`EARTH_RADIUS_KM`] sphere.
    pub fn distance_km(&self, other: &HorizontalPosition) -> f64 {
        self.distance_deg(other).to_radians() * EARTH_RADIUS_KM
    }

    /// Forward azimuth to `other`, clockwise from north in [0, 360).
    pub fn azimuth_deg(&self, other: &HorizontalPosition) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let dlon = (other.lon - self.lon).to_radians();
        let y = dlon.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Azimuth measured at `other` looking back toward `self`, in [0, 360).
    pub fn back_azimuth_deg(&self, other: &HorizontalPosition) -> f64 {
        other.azimuth_deg(self)
    }

    /// The point reached by travelling `distance_deg` along `azimuth_deg`.
    /// A negative distance travels the opposite direction along the same
    /// great circle.
    pub fn point_at(&self, azimuth_deg: f64, distance_deg: f64) -> HorizontalPosition {
        let phi1 = self.lat.to_radians();
        let delta = distance_deg.to_radians();
        let theta = azimuth_deg.to_radians();
        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let dlon = (theta.sin() * delta.sin() * phi1.cos())
            .atan2(delta.cos() - phi1.sin() * phi2.sin());
        HorizontalPosition::new(phi2.to_degrees(), self.lon + dlon.to_degrees())
    }
}

/// A 3-D position: geographic coordinates plus radius from Earth's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FullPosition {
    pub horizontal: HorizontalPosition,
    /// Radius in km from the Earth's center.
    pub radius: f64,
}

impl FullPosition {
    pub fn new(lat: f64, lon: f64, radius: f64) -> Self {
        Self { horizontal: HorizontalPosition::new(lat, lon), radius }
    }

    pub fn lat(&self) -> f64 {
        self.horizontal.lat
    }

    pub fn lon(&self) -> f64 {
        self.horizontal.lon
    }

    /// Depth below the [`EARTH_RADIUS_KM`] surface in km.
    pub fn depth_km(&self) -> f64 {
        EARTH_RADIUS_KM - self.radius
    }

    /// Sameness within [`COORD_EPS`] on all three components.
    pub fn close_to(&self, other: &FullPosition) -> bool {
        eq_eps(self.lat(), other.lat())
            && eq_eps(self.lon(), other.lon())
            && eq_eps(self.radius, other.radius)
    }
}

fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
