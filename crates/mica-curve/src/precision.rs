//! Length-relative tolerance shared by every "same position" comparison.

/// Fraction of a curve's length below which two x-positions are considered equal.
pub const RELATIVE_EPSILON: f64 = 1e-9;

/// Absolute tolerance for a curve spanning `length` units along x.
///
/// Degenerate lengths fall back to [`RELATIVE_EPSILON`] itself so the
/// tolerance is never zero.
#[must_use]
pub fn epsilon(length: f64) -> f64 {
    let length = length.abs();
    if length > 0.0 {
        length * RELATIVE_EPSILON
    } else {
        RELATIVE_EPSILON
    }
}

/// Return true if `a` and `b` denote the same position on a curve of the given length.
#[must_use]
pub fn same_position(a: f64, b: f64, length: f64) -> bool {
    (a - b).abs() <= epsilon(length)
}
