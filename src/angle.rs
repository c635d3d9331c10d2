//! Angle utilities shared by view selection and descriptor matching.

use nalgebra::{DVector, Vector3};

const EPS: f64 = 1e-12;

/// Absolute cosine between a viewing ray and a plane normal.
///
/// The plane orientation is ambiguous, so antiparallel counts as aligned.
/// Returns a value in `[0, 1]`; `1` means the ray hits the plane head-on.
#[inline]
pub fn frontoparallel_score(ray: &Vector3<f64>, normal: &Vector3<f64>) -> f64 {
    let denom = (ray.norm_squared() * normal.norm_squared()).sqrt();
    if denom <= EPS {
        return 0.0;
    }
    (ray.dot(normal).abs() / denom).clamp(0.0, 1.0)
}

/// Unsigned angle between two descriptors in radians, in `[0, π]`.
///
/// Returns `None` if either vector is degenerate or the lengths differ.
pub fn descriptor_angle(a: &DVector<f64>, b: &DVector<f64>) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let denom = a.norm() * b.norm();
    if !denom.is_finite() || denom <= EPS {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos())
}

/// Unsigned angle between two 3D directions (or plane coefficient vectors).
#[inline]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = (a.norm() * b.norm()).max(EPS);
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
