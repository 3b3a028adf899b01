//! Coordinate frames on a spherical, non-rotating Earth.
//!
//! Positions are Earth-centred Cartesian. Spherical coordinates are
//! `(r, longitude, latitude)` with longitude measured from +x in the equatorial
//! plane and latitude from the equator towards +z.

use nalgebra::{Rotation3, Unit, Vector3};

use crate::constants::EARTH_RADIUS;

/// Spherical position `(radius, longitude, latitude)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub r: f64,
    pub long: f64,
    pub lat: f64,
}

/// Local unit axes at a point on the sphere.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    pub east: Vector3<f64>,
    pub north: Vector3<f64>,
    pub up: Vector3<f64>,
}

pub fn cartesian_to_spherical(position: &Vector3<f64>) -> Spherical {
    let r = position.norm();
    let long = position.y.atan2(position.x);
    let lat = position.z.atan2((position.x * position.x + position.y * position.y).sqrt());
    Spherical { r, long, lat }
}

pub fn spherical_to_cartesian(s: &Spherical) -> Vector3<f64> {
    Vector3::new(
        s.r * s.long.cos() * s.lat.cos(),
        s.r * s.long.sin() * s.lat.cos(),
        s.r * s.lat.sin(),
    )
}

/// Unit vector pointing along the `(long, lat)` spherical direction.
pub fn direction_from_angles(long: f64, lat: f64) -> Vector3<f64> {
    spherical_to_cartesian(&Spherical { r: 1.0, long, lat })
}

pub fn local_frame(long: f64, lat: f64) -> LocalFrame {
    let (sin_lon, cos_lon) = long.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    LocalFrame {
        east: Vector3::new(-sin_lon, cos_lon, 0.0),
        north: Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
        up: Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
    }
}

/// Convert a vector given in local (north, east, up) components at `position`
/// into Earth-centred Cartesian components.
pub fn local_to_cartesian(position: &Vector3<f64>, north: f64, east: f64, up: f64) -> Vector3<f64> {
    let s = cartesian_to_spherical(position);
    let frame = local_frame(s.long, s.lat);
    frame.north * north + frame.east * east + frame.up * up
}

/// Altitude above the spherical Earth (m). Negative below the surface.
pub fn altitude(position: &Vector3<f64>) -> f64 {
    position.norm() - EARTH_RADIUS
}

/// Exact rotation of `v` by `angle` radians about `axis`.
///
/// A zero axis leaves the vector unchanged.
pub fn rotate_about_axis(v: &Vector3<f64>, axis: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    match Unit::try_new(*axis, 1e-15) {
        Some(unit) => Rotation3::from_axis_angle(&unit, angle) * v,
        None => *v,
    }
}

/// Great-circle surface distance between two positions (m).
pub fn surface_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let cos_angle = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    EARTH_RADIUS * cos_angle.acos()
}
