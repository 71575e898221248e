//! Monte Carlo consensus over per-site price estimates.
//!
//! Each site's bounds become a sample distribution (triangular, uniform, or
//! a point mass, depending on how many bounds it published). Draws are
//! combined by taking the median across sites at every draw index, and the
//! consensus is the median of those per-draw aggregates.

pub mod engine;
pub mod error;
pub mod sampling;

pub use engine::{Consensus, ConsensusEngine, ImputedMidpoint, DEFAULT_DRAWS};
pub use error::ConsensusError;
