//! Error types for curve construction, evaluation and annotation.

/// Errors from curve geometry, landmark annotation and filter configuration.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    /// Returned when a curve has fewer than two coordinates.
    #[error("curve must have at least 2 points, got {len}")]
    TooFewPoints {
        /// Number of coordinates provided.
        len: usize,
    },

    /// Returned when the x and y arrays differ in length.
    #[error("x has {x_len} values but y has {y_len}")]
    LengthMismatch {
        /// Length of the x array.
        x_len: usize,
        /// Length of the y array.
        y_len: usize,
    },

    /// Returned when a coordinate is NaN or infinite.
    #[error("curve contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when x is not strictly increasing.
    #[error("x must be strictly increasing, violated at index {index}")]
    NotIncreasing {
        /// Index of the first coordinate not greater than its predecessor.
        index: usize,
    },

    /// Returned when the interpolant is evaluated outside the curve's domain.
    #[error("x = {x} is outside the curve range [{min}, {max}]")]
    OutOfRange {
        /// Requested position.
        x: f64,
        /// Smallest x of the curve.
        min: f64,
        /// Largest x of the curve.
        max: f64,
    },

    /// Returned when a resample or sample count is below 2.
    #[error("sample count must be at least 2, got {n}")]
    InvalidSampleCount {
        /// The rejected sample count.
        n: usize,
    },

    /// Returned when a filter threshold lies outside `[0, 1]`.
    #[error("filter threshold must lie in [0, 1], got {value}")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },

    /// Returned when a coordinate index exceeds the curve size.
    #[error("index {index} out of bounds for curve of size {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// Curve size.
        len: usize,
    },

    /// Returned when a manual edit targets an endpoint or assigns start/end.
    #[error("landmark at index {index} is reserved for the curve boundary")]
    ReservedLandmark {
        /// The rejected index.
        index: usize,
    },
}
