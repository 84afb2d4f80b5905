//! Interval decompositions, curve distances and PICA pairwise alignment.
//!
//! An [`IntervalDecomposition`] is a warpable working copy of an annotated
//! curve, split into intervals at boundary landmarks. [`PicaConfig::align`]
//! warps two decompositions onto each other, inserting matching landmark
//! pairs as new boundaries while that lowers the [`Distance`] between them.

mod config;
mod control;
mod decomposition;
mod distance;
mod error;
mod pica;
mod result;

pub use config::PicaConfig;
pub use control::{CancelToken, Outcome};
pub use decomposition::IntervalDecomposition;
pub use distance::{Basis, Distance, Metric};
pub use error::AlignError;
pub use result::PairwiseAlignment;
