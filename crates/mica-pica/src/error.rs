//! Error types for interval decompositions and pairwise alignment.

use mica_curve::CurveError;

/// Errors from decomposition edits, distance evaluation and PICA alignment.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Wraps a geometry or annotation error.
    #[error("curve error: {0}")]
    Curve(#[from] CurveError),

    /// Returned when a distance function is configured with fewer than 2 samples.
    #[error("distance needs at least 2 samples, got {samples}")]
    InvalidSampleCount {
        /// The rejected sample count.
        samples: usize,
    },

    /// Returned when a configuration value is outside its valid range.
    #[error("invalid value {value} for parameter {name}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when both alignment weights are zero or any weight is negative.
    #[error("alignment weights must be non-negative and not both zero, got {first} and {second}")]
    InvalidWeights {
        /// Weight of the first decomposition.
        first: f64,
        /// Weight of the second decomposition.
        second: f64,
    },

    /// Returned when two decompositions differ in interval count or boundary types.
    #[error("incompatible decompositions: {left} vs {right} intervals or unalignable boundaries")]
    Incompatible {
        /// Interval count of the left decomposition.
        left: usize,
        /// Interval count of the right decomposition.
        right: usize,
    },

    /// Returned when an interval index exceeds the interval count.
    #[error("interval {interval} out of bounds for decomposition with {size} intervals")]
    IntervalOutOfBounds {
        /// The requested interval.
        interval: usize,
        /// Interval count.
        size: usize,
    },

    /// Returned when a landmark is not strictly inside the target interval.
    #[error("coordinate {index} is not strictly inside interval {interval}")]
    NotInterior {
        /// Coordinate index of the landmark.
        index: usize,
        /// Target interval.
        interval: usize,
    },

    /// Returned when a landmark is not among the source curve's filtered landmarks.
    #[error("coordinate {index} is not a filtered landmark of curve {curve}")]
    UnknownLandmark {
        /// Coordinate index of the landmark.
        index: usize,
        /// Name of the source curve.
        curve: String,
    },

    /// Returned when explicit boundaries are not strictly increasing interior coordinates.
    #[error("boundary at coordinate {index} is out of order or at an endpoint")]
    UnorderedBoundary {
        /// The offending coordinate index.
        index: usize,
    },

    /// Returned when a relative split position is outside `(0, 1)`.
    #[error("relative position must lie in (0, 1), got {value}")]
    InvalidRelativePosition {
        /// The rejected position.
        value: f64,
    },

    /// Returned when a target length is not strictly positive and finite.
    #[error("target length must be positive and finite, got {length}")]
    InvalidLength {
        /// The rejected length.
        length: f64,
    },

    /// Invariant violation: a warped curve drifted from its target length.
    #[error("curve {curve} has length {actual} after warping, expected {expected}")]
    LengthDrift {
        /// Name of the drifting curve.
        curve: String,
        /// Target length.
        expected: f64,
        /// Length after warping.
        actual: f64,
    },

    /// Invariant violation: an expected position has no coordinate within tolerance.
    #[error("no coordinate of curve {curve} within tolerance of x = {x}")]
    PositionNotFound {
        /// Name of the curve searched.
        curve: String,
        /// The expected position.
        x: f64,
    },
}
