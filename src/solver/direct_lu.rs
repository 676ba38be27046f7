//! Dense LU factorization for the coarsest multigrid level.
//!
//! The coarsest AMG operator is small, so it is materialized densely and factored
//! once with faer's partial-pivoting LU. Both `A x = b` and `Aᵀ x = b` are solved from
//! the same factorization through two separate entry points; neither mutates it.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations

use crate::error::AmgError;
use crate::matrix::sparse::CsrMatrix;
use faer::linalg::solvers::{PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatMut};

/// Cached LU factorization with partial (row) pivoting.
pub struct DenseLu {
    factor: PartialPivLu<f64>,
    n: usize,
}

impl DenseLu {
    /// Factor a square dense matrix.
    pub fn decompose(a: &Mat<f64>) -> Result<Self, AmgError> {
        if a.nrows() != a.ncols() {
            return Err(AmgError::NotSquare { nrows: a.nrows(), ncols: a.ncols() });
        }
        Ok(Self { factor: PartialPivLu::new(a.as_ref()), n: a.nrows() })
    }

    /// Factor a sparse matrix through its dense materialization.
    pub fn from_csr(a: &CsrMatrix<f64>) -> Result<Self, AmgError> {
        Self::decompose(&a.to_dense())
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Overwrite `x` with A⁻¹ x.
    pub fn solve(&self, x: &mut [f64]) -> Result<(), AmgError> {
        self.check_len(x)?;
        let n = x.len();
        let x_mat = MatMut::from_column_major_slice_mut(&mut *x, n, 1);
        self.factor.solve_in_place_with_conj(Conj::No, x_mat);
        Self::check_finite(x)
    }

    /// Overwrite `x` with A⁻ᵀ x.
    pub fn solve_transpose(&self, x: &mut [f64]) -> Result<(), AmgError> {
        self.check_len(x)?;
        let n = x.len();
        let x_mat = MatMut::from_column_major_slice_mut(&mut *x, n, 1);
        self.factor.solve_transpose_in_place_with_conj(Conj::No, x_mat);
        Self::check_finite(x)
    }

    fn check_len(&self, x: &[f64]) -> Result<(), AmgError> {
        if x.len() != self.n {
            return Err(AmgError::DimensionMismatch { expected: self.n, got: x.len() });
        }
        Ok(())
    }

    // A zero pivot shows up as inf/NaN in the solution.
    fn check_finite(x: &[f64]) -> Result<(), AmgError> {
        if x.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(AmgError::SingularCoarse)
        }
    }
}
