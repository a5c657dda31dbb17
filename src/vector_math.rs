//! Vector and angle helpers used by the locomotion states.
//!
//! Angles handed to and returned from these helpers are in degrees, matching
//! the tuning values in [`crate::config`]. Interpolation factors are clamped
//! to `[0, 1]` so a large frame time can never overshoot a target.
use glam::{Mat3, Quat, Vec3};

use crate::constants::WORLD_UP;

/// Linear interpolation with the factor clamped to `[0, 1]`.
///
/// # Examples
/// ```
/// use crane::vector_math::lerp;
/// assert!((lerp(0.0, 10.0, 0.25) - 2.5).abs() < f32::EPSILON);
/// assert!((lerp(0.0, 10.0, 4.0) - 10.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Vector counterpart of [`lerp`].
#[must_use]
pub fn lerp_vec(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from.lerp(to, t.clamp(0.0, 1.0))
}

/// Returns the unsigned angle between two vectors in degrees.
///
/// Degenerate (zero or non-finite) input yields `0.0` rather than `NaN`, so
/// a missing surface normal reads as "flat".
///
/// # Examples
/// ```
/// use crane::vector_math::angle_between;
/// use glam::Vec3;
/// assert!((angle_between(Vec3::Y, Vec3::X) - 90.0).abs() < 1e-4);
/// assert_eq!(angle_between(Vec3::ZERO, Vec3::Y), 0.0);
/// ```
#[must_use]
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    match (a.try_normalize(), b.try_normalize()) {
        (Some(na), Some(nb)) => na.dot(nb).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

/// Removes the component of `vector` along `normal`.
#[must_use]
pub fn project_on_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    let length_squared = normal.length_squared();
    if length_squared <= f32::EPSILON {
        return vector;
    }
    vector - normal * (vector.dot(normal) / length_squared)
}

/// Projects `vector` onto the horizontal plane and normalises it.
///
/// Returns [`Vec3::ZERO`] for vertical or degenerate input.
#[must_use]
pub fn flatten(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z).normalize_or_zero()
}

/// Spherically interpolates between two directions.
///
/// Magnitudes are interpolated linearly. Opposite or zero vectors fall back to
/// a plain [`lerp_vec`].
#[must_use]
pub fn slerp_dir(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let (Some(a), Some(b)) = (from.try_normalize(), to.try_normalize()) else {
        return lerp_vec(from, to, t);
    };
    if a.dot(b) < -0.9999 {
        return lerp_vec(from, to, t);
    }
    let arc = Quat::IDENTITY.slerp(Quat::from_rotation_arc(a, b), t);
    let magnitude = lerp(from.length(), to.length(), t);
    arc * a * magnitude
}

/// Builds a rotation whose local −Z axis points along `forward`.
///
/// `up` is a hint for the roll; `None` is returned when `forward` is zero or
/// parallel to the hint.
#[must_use]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let f = forward.try_normalize()?;
    let right = f.cross(up).try_normalize()?;
    let true_up = right.cross(f);
    Some(Quat::from_mat3(&Mat3::from_cols(right, true_up, -f)).normalize())
}

/// Rotation about `axis` turning clockwise (seen from the axis tip) by
/// `degrees`. A positive value turns a forward-facing agent to its right when
/// `axis` is up.
#[must_use]
pub fn yaw_rotation(degrees: f32, axis: Vec3) -> Quat {
    let axis = axis.try_normalize().unwrap_or(WORLD_UP);
    Quat::from_axis_angle(axis, -degrees.to_radians())
}

/// Rounds `value` to the nearest multiple of `step`.
///
/// # Examples
/// ```
/// use crane::vector_math::quantize;
/// assert!((quantize(12.37, 0.2) - 12.4).abs() < 1e-4);
/// ```
#[must_use]
pub fn quantize(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Wraps an angle in degrees to `(-180, 180]`.
#[must_use]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
