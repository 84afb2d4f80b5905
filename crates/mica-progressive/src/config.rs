//! Configuration builder for progressive multiple curve alignment.

use std::sync::Arc;

use mica_curve::AnnotatedCurve;
use mica_pica::{CancelToken, IntervalDecomposition, Outcome, PicaConfig};

use crate::error::MicaError;
use crate::node::AlignmentNode;

/// Configuration for MICA, the progressive multiple curve alignment.
///
/// Every fusion step runs a pairwise alignment configured by the wrapped
/// [`PicaConfig`].
#[derive(Debug, Clone)]
pub struct MicaConfig {
    pub(crate) pica: PicaConfig,
}

impl MicaConfig {
    /// Create a configuration that aligns consensus pairs with `pica`.
    #[must_use]
    pub fn new(pica: PicaConfig) -> Self {
        Self { pica }
    }

    /// Replace the pairwise alignment configuration.
    #[must_use]
    pub fn with_pica(mut self, pica: PicaConfig) -> Self {
        self.pica = pica;
        self
    }

    /// Return the pairwise alignment configuration.
    #[must_use]
    pub fn pica(&self) -> &PicaConfig {
        &self.pica
    }

    /// Align all `curves`, decomposed at their split landmarks.
    ///
    /// The root node lists its members in the order of `curves`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MicaError::EmptyInput`] | `curves` is empty |
    /// | [`MicaError::Incompatible`] | curves differ in split count or split order |
    /// | [`MicaError::Align`] | a pairwise alignment failed or an invariant broke |
    /// | [`MicaError::UnknownNode`] | the guide tree lost track of a node |
    pub fn align(
        &self,
        curves: &[Arc<AnnotatedCurve>],
        cancel: &CancelToken,
    ) -> Result<Outcome<AlignmentNode>, MicaError> {
        self.align_decompositions(decompose_all(curves), None, cancel)
    }

    /// Align all `curves` with `curves[reference]` fixing every interval length.
    ///
    /// # Errors
    ///
    /// Same as [`align`][Self::align], plus [`MicaError::InvalidReference`]
    /// if `reference` is not an index into `curves`.
    pub fn align_to_reference(
        &self,
        reference: usize,
        curves: &[Arc<AnnotatedCurve>],
        cancel: &CancelToken,
    ) -> Result<Outcome<AlignmentNode>, MicaError> {
        self.align_decompositions(decompose_all(curves), Some(reference), cancel)
    }

    /// Align prepared decompositions, optionally pinning one as reference.
    ///
    /// # Errors
    ///
    /// Same as [`align_to_reference`][Self::align_to_reference].
    pub fn align_decompositions(
        &self,
        decompositions: Vec<IntervalDecomposition>,
        reference: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<Outcome<AlignmentNode>, MicaError> {
        crate::mica::align(decompositions, reference, &self.pica, cancel)
    }
}

fn decompose_all(curves: &[Arc<AnnotatedCurve>]) -> Vec<IntervalDecomposition> {
    curves
        .iter()
        .map(|c| IntervalDecomposition::new(Arc::clone(c)))
        .collect()
}
