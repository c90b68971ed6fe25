//! Small slice-level vector helpers shared by behaviors.
//!
//! Parameters have a dimension fixed at runtime, so these operate on
//! `&[f32]` rather than fixed-size vector types. Length mismatches are the
//! caller's responsibility: dimensions are validated at attach time.

/// Squared Euclidean length.
pub fn length_squared(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

/// Euclidean length.
pub fn length(v: &[f32]) -> f32 {
    length_squared(v).sqrt()
}

/// Dot product over the shorter of the two slices.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normalize in place. Returns `false` (leaving `v` untouched) for a
/// zero-length or non-finite vector.
pub fn normalize(v: &mut [f32]) -> bool {
    let len = length(v);
    if !(len > 0.0 && len.is_finite()) {
        return false;
    }
    for x in v.iter_mut() {
        *x /= len;
    }
    true
}

/// `out[i] += scale * v[i]`.
pub fn add_scaled(out: &mut [f32], v: &[f32], scale: f32) {
    for (o, x) in out.iter_mut().zip(v) {
        *o += scale * x;
    }
}

/// Scale every component so the length does not exceed `max`.
/// A non-positive `max` means unlimited.
pub fn clamp_length(v: &mut [f32], max: f32) {
    if max <= 0.0 {
        return;
    }
    let len = length(v);
    if len > max {
        let s = max / len;
        for x in v.iter_mut() {
            *x *= s;
        }
    }
}

/// Cross product of two 3-vectors.
pub fn cross3(a: &[f32], b: &[f32]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
