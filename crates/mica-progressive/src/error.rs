use mica_curve::CurveError;
use mica_pica::AlignError;

/// Errors from consensus synthesis and progressive alignment.
#[derive(Debug, thiserror::Error)]
pub enum MicaError {
    /// Returned when no curves are given.
    #[error("need at least one curve to align")]
    EmptyInput,

    /// Returned when the reference index does not name an input curve.
    #[error("reference index {index} out of bounds for {len} curves")]
    InvalidReference {
        /// The requested reference index.
        index: usize,
        /// Number of input curves.
        len: usize,
    },

    /// Returned when a decomposition does not match the first one's intervals.
    #[error("decomposition {index} is not compatible with decomposition 0")]
    Incompatible {
        /// Position of the offending decomposition in the input.
        index: usize,
    },

    /// Invariant violation: a cached pair names a node that is no longer live.
    #[error("guide tree node {id} is not live")]
    UnknownNode {
        /// Identifier of the missing node.
        id: usize,
    },

    /// Wraps a pairwise alignment or decomposition error.
    #[error("alignment error: {0}")]
    Align(#[from] AlignError),

    /// Wraps a geometry or annotation error.
    #[error("curve error: {0}")]
    Curve(#[from] CurveError),
}
