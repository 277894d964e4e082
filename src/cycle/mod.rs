//! Cycle length bookkeeping: neighbour repair on every period mutation, the
//! per-user average, and projections built from it.

pub mod length;
pub mod orchestrator;
pub mod projection;
pub mod report;
pub mod stats;

pub use projection::{Projection, UNKNOWN_CYCLE_LENGTH};
