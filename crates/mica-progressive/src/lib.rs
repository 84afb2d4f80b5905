//! Progressive multiple curve alignment.
//!
//! [`MicaConfig::align`] builds a binary guide tree over the input curves by
//! repeatedly fusing the two nodes whose consensus curves are closest under
//! pairwise alignment. The root node holds every input curve warped onto
//! common landmark positions, plus their [`consensus`].

mod config;
mod consensus;
mod error;
mod mica;
mod node;

pub use config::MicaConfig;
pub use consensus::consensus;
pub use error::MicaError;
pub use node::AlignmentNode;
