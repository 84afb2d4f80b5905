//! Output of a pairwise alignment.

use crate::decomposition::IntervalDecomposition;

/// Two decompositions warped onto common interval boundaries.
///
/// Both have the same interval count, the same interval lengths and the same
/// start position.
#[derive(Debug, Clone)]
pub struct PairwiseAlignment {
    pub(crate) first: IntervalDecomposition,
    pub(crate) second: IntervalDecomposition,
    pub(crate) distance: f64,
    pub(crate) splits: usize,
}

impl PairwiseAlignment {
    /// Return the aligned first decomposition.
    #[must_use]
    pub fn first(&self) -> &IntervalDecomposition {
        &self.first
    }

    /// Return the aligned second decomposition.
    #[must_use]
    pub fn second(&self) -> &IntervalDecomposition {
        &self.second
    }

    /// Return the distance between the aligned curves.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Return the number of splits committed by the greedy search.
    #[must_use]
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Consume the result and return both decompositions.
    #[must_use]
    pub fn into_parts(self) -> (IntervalDecomposition, IntervalDecomposition) {
        (self.first, self.second)
    }
}
