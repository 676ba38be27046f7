//! kryst-amg: smoothed-aggregation algebraic multigrid over faer
//!
//! This crate provides an aggregation-based AMG preconditioner for sparse symmetric
//! positive definite systems in CSR storage, with SSOR smoothing on every level, a
//! dense LU solve on the coarsest one and a preconditioned conjugate gradient driver.

pub mod config;
pub mod core;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;
pub use utils::*;
