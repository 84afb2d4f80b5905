//! File I/O, validation, and serialization for the mica pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Dataset, RunName};
pub use error::IoError;
pub use reader::CurveReader;
pub use writer::ResultWriter;
