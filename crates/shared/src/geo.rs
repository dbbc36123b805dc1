use serde::{Deserialize, Serialize};

/// Mean earth radius used for route lengths, in miles.
pub const EARTH_RADIUS_MILES: f64 = 3963.1676;

pub const METERS_PER_MILE: f64 = 1609.344;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Great-circle distance between two coordinates, in miles.
///
/// Works in spherical coordinates (phi = 90 - latitude, theta = longitude).
pub fn distance_on_unit_sphere(a: LngLat, b: LngLat) -> f64 {
    let phi1 = (90.0 - a.lat).to_radians();
    let phi2 = (90.0 - b.lat).to_radians();
    let theta1 = a.lng.to_radians();
    let theta2 = b.lng.to_radians();

    let cos = phi1.sin() * phi2.sin() * (theta1 - theta2).cos() + phi1.cos() * phi2.cos();
    // Rounding can push identical points just past 1.0
    let arc = cos.clamp(-1.0, 1.0).acos();

    arc * EARTH_RADIUS_MILES
}

/// Length of a polyline through `points`, in meters.
pub fn path_length_meters(points: &[LngLat]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_on_unit_sphere(w[0], w[1]))
        .sum::<f64>()
        * METERS_PER_MILE
}
