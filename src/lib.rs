//! Period tracking backend: derived cycle lengths, per-user averages and
//! forward projections over a pluggable store.

pub mod config;
pub mod cycle;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use error::{AppError, Result};
