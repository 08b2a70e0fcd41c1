//! Scalar and 2D vector helpers

/// Lengths at or below this are treated as "no direction"
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Restrict `value` to `[lo, hi]`
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi)
}

/// Unit vector in the direction of `(x, y)`, or `(0, 0)` for a
/// (near-)zero input.
pub fn normalize(x: f32, y: f32) -> (f32, f32) {
    let length = x.hypot(y);
    if length <= NORMALIZE_EPSILON {
        return (0.0, 0.0);
    }
    (x / length, y / length)
}

/// Unit vector for an angle given in degrees
pub fn direction_from_degrees(angle: f32) -> (f32, f32) {
    let rad = angle.to_radians();
    normalize(rad.cos(), rad.sin())
}

pub fn is_zero(v: (f32, f32)) -> bool {
    v.0.abs() <= NORMALIZE_EPSILON && v.1.abs() <= NORMALIZE_EPSILON
}
