//! Configuration builder for pairwise interval alignment.

use crate::control::{CancelToken, Outcome};
use crate::decomposition::IntervalDecomposition;
use crate::distance::Distance;
use crate::error::AlignError;
use crate::result::PairwiseAlignment;

/// Configuration for PICA, the greedy pairwise interval alignment.
///
/// Construct via [`PicaConfig::new`], then chain `with_*` methods to override defaults.
/// Values are checked when [`align`][Self::align] runs.
///
/// # Defaults
///
/// | Parameter                 | Default |
/// |---------------------------|---------|
/// | `min_rel_interval_length` | 0.01    |
/// | `max_rel_x_shift`         | 0.2     |
/// | `max_distortion_ratio`    | 2.0     |
/// | `warp_penalty`            | 0.0 (off) |
#[derive(Debug, Clone)]
pub struct PicaConfig {
    pub(crate) distance: Distance,
    pub(crate) min_rel_interval_length: f64,
    pub(crate) max_rel_x_shift: f64,
    pub(crate) max_distortion_ratio: f64,
    pub(crate) warp_penalty: f64,
}

impl PicaConfig {
    /// Create a configuration comparing curves with `distance`.
    #[must_use]
    pub fn new(distance: Distance) -> Self {
        Self {
            distance,
            min_rel_interval_length: 0.01,
            max_rel_x_shift: 0.2,
            max_distortion_ratio: 2.0,
            warp_penalty: 0.0,
        }
    }

    /// Set the fraction of the total length below which an interval is not split further.
    #[must_use]
    pub fn with_min_rel_interval_length(mut self, value: f64) -> Self {
        self.min_rel_interval_length = value;
        self
    }

    /// Set how far (as a fraction of the total length) a landmark may move
    /// relative to its position in the unaligned input.
    #[must_use]
    pub fn with_max_rel_x_shift(mut self, value: f64) -> Self {
        self.max_rel_x_shift = value;
        self
    }

    /// Set the largest stretch or compression a split may apply to a sub-interval.
    #[must_use]
    pub fn with_max_distortion_ratio(mut self, value: f64) -> Self {
        self.max_distortion_ratio = value;
        self
    }

    /// Set the warp penalty scaling. Zero disables the penalty.
    #[must_use]
    pub fn with_warp_penalty(mut self, value: f64) -> Self {
        self.warp_penalty = value;
        self
    }

    /// Return the distance function.
    #[must_use]
    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Return the minimal interval length relative to the curve length.
    #[must_use]
    pub fn min_rel_interval_length(&self) -> f64 {
        self.min_rel_interval_length
    }

    /// Return the maximal landmark shift relative to the curve length.
    #[must_use]
    pub fn max_rel_x_shift(&self) -> f64 {
        self.max_rel_x_shift
    }

    /// Return the maximal stretch or compression of a sub-interval.
    #[must_use]
    pub fn max_distortion_ratio(&self) -> f64 {
        self.max_distortion_ratio
    }

    /// Return the warp penalty scaling.
    #[must_use]
    pub fn warp_penalty(&self) -> f64 {
        self.warp_penalty
    }

    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidParameter`] naming the first parameter out of range:
    ///
    /// | Parameter | Valid range |
    /// |---|---|
    /// | `min_rel_interval_length` | `[0, 1)` |
    /// | `max_rel_x_shift` | `(0, 1]` |
    /// | `max_distortion_ratio` | `>= 1` |
    /// | `warp_penalty` | `>= 0`, finite |
    pub fn validate(&self) -> Result<(), AlignError> {
        let checks: [(&'static str, f64, bool); 4] = [
            (
                "min_rel_interval_length",
                self.min_rel_interval_length,
                (0.0..1.0).contains(&self.min_rel_interval_length),
            ),
            (
                "max_rel_x_shift",
                self.max_rel_x_shift,
                self.max_rel_x_shift > 0.0 && self.max_rel_x_shift <= 1.0,
            ),
            (
                "max_distortion_ratio",
                self.max_distortion_ratio,
                self.max_distortion_ratio >= 1.0,
            ),
            (
                "warp_penalty",
                self.warp_penalty,
                self.warp_penalty.is_finite() && self.warp_penalty >= 0.0,
            ),
        ];
        match checks.into_iter().find(|(_, _, ok)| !ok) {
            Some((name, value, _)) => Err(AlignError::InvalidParameter { name, value }),
            None => Ok(()),
        }
    }

    /// Align two decompositions weighted by `first_weight` and `second_weight`.
    ///
    /// The weights usually count the input curves each decomposition already
    /// represents. A zero weight lets the other side dictate interval lengths.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidParameter`] | a configuration value is out of range |
    /// | [`AlignError::InvalidWeights`] | a weight is negative or both are zero |
    /// | [`AlignError::Incompatible`] | the decompositions cannot be aligned interval by interval |
    /// | [`AlignError::LengthDrift`] | the global warp missed its target length by more than 1% |
    pub fn align(
        &self,
        first: &IntervalDecomposition,
        first_weight: f64,
        second: &IntervalDecomposition,
        second_weight: f64,
        cancel: &CancelToken,
    ) -> Result<Outcome<PairwiseAlignment>, AlignError> {
        crate::pica::align(first, first_weight, second, second_weight, self, cancel)
    }
}
