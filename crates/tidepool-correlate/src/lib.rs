//! Pearson correlation and the lagged cross-instrument search the
//! correlation worker runs once per minute tick.

pub mod lagged_search;
pub mod pearson;

pub use lagged_search::{CorrelationCandidate, best_lagged_correlation};
pub use pearson::pearson;
