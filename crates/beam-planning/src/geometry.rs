//! Angle computations between ECEF points
//!
//! All positions are Cartesian coordinates in a shared frame (km, Earth
//! centered). Angles are reported in degrees.

use crate::{PlanningError, Result};
use nalgebra::Vector3;

/// Cartesian position (ECEF, km)
pub type Point3 = nalgebra::Point3<f64>;

/// Shortest direction vector that still counts as a direction
const MIN_DIRECTION_NORM: f64 = 1e-12;

/// Planet center, the reference point for the boresight check
pub fn earth_center() -> Point3 {
    Point3::origin()
}

/// Angle in degrees between the direction `a → b` and the direction `b → c`.
///
/// Both directions are normalized before taking the dot product, which is
/// clamped to `[-1, 1]` so rounding never pushes `acos` out of its domain.
///
/// With this convention:
/// - `angle_degrees(sat, user, center)` is 0° for a user directly below the
///   satellite and grows as the beam tilts away from the user's vertical.
/// - `180 - angle_degrees(a, b, c)` is the angle at vertex `b` between
///   `a` and `c` (see [`separation_degrees`]).
///
/// Returns [`PlanningError::DegenerateGeometry`] if `a == b` or `b == c`.
pub fn angle_degrees(a: &Point3, b: &Point3, c: &Point3) -> Result<f64> {
    let incoming = unit(b - a, b)?;
    let outgoing = unit(c - b, b)?;

    let cos = incoming.dot(&outgoing).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Angle in degrees at vertex `b` between the directions to `a` and `c`.
pub fn separation_degrees(a: &Point3, b: &Point3, c: &Point3) -> Result<f64> {
    Ok(180.0 - angle_degrees(a, b, c)?)
}

fn unit(v: Vector3<f64>, vertex: &Point3) -> Result<Vector3<f64>> {
    v.try_normalize(MIN_DIRECTION_NORM)
        .ok_or(PlanningError::DegenerateGeometry {
            x: vertex.x,
            y: vertex.y,
            z: vertex.z,
        })
}
