//! Preconditioners for linear solvers.
//!
//! This module defines the Preconditioner trait and its implementations: the SSOR
//! relaxation used as a multigrid smoother and the aggregation-based AMG hierarchy.

use crate::error::AmgError;

/// A preconditioner M ≈ A⁻¹.
///
/// `x` carries the initial iterate on entry and the result on exit; pass zeros to
/// obtain z = M⁻¹ b. Application may update internal scratch storage, hence `&mut self`.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to b, updating x in place.
    fn apply(&mut self, b: &V, x: &mut V) -> Result<(), AmgError>;
    /// Apply M⁻ᵀ to b, updating x in place.
    fn trans_apply(&mut self, b: &V, x: &mut V) -> Result<(), AmgError>;
    /// Setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), AmgError> {
        Ok(())
    }
}

pub mod amg;
pub mod ssor;

pub use amg::{AMG, AmgDiagnostics};
pub use ssor::{SorSweep, Ssor};
