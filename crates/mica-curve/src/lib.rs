//! Curve geometry, landmark classification and annotation filters.
//!
//! Pure math library with no I/O. Provides piecewise-linear curves with a
//! derivative, the landmark taxonomy used to anchor alignments, automatic
//! classification of extrema and inflection points, and threshold filters
//! that thin out weak landmarks.

mod annotated;
mod curve;
mod error;
mod filter;
mod landmark;
pub mod precision;

pub use annotated::AnnotatedCurve;
pub use curve::Curve;
pub use error::CurveError;
pub use filter::{same_filter, AnnotationFilter, ExtremaFilter, InflectionFilter};
pub use landmark::{Category, Landmark, LandmarkType, Provenance};
