use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use num_traits::Float;

use crate::error::AmgError;
use crate::matrix::sparse::CsrMatrix;
use crate::preconditioner::Preconditioner;

bitflags! {
    /// Sweep directions of one relaxation step.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SorSweep: u32 {
        const FORWARD   = 0b01; // Gauss-Seidel in increasing row order
        const BACKWARD  = 0b10; // decreasing row order
        const SYMMETRIC = Self::FORWARD.bits() | Self::BACKWARD.bits();
    }
}

/// Symmetric Successive Over-Relaxation on a CSR matrix.
///
/// One application performs a forward sweep damped by `omega_f` followed, for
/// [`SorSweep::SYMMETRIC`], by a backward sweep damped by `omega_r`. With only
/// [`SorSweep::FORWARD`] this is plain SOR. Sweeps are strictly sequential: row i
/// reads the value just written for row i-1.
///
/// The matrix is held through an `Arc` so that the pre- and post-smoother of a
/// multigrid level share the level operator.
pub struct Ssor<T> {
    omega_f: T,
    omega_r: T,
    sweep: SorSweep,
    a: Option<Arc<CsrMatrix<T>>>,
    diag: Vec<usize>,
    half: Vec<T>,
}

impl<T: Float> Ssor<T> {
    pub fn new(omega_f: T, omega_r: T, sweep: SorSweep) -> Result<Self, AmgError> {
        let two = T::one() + T::one();
        for omega in [omega_f, omega_r] {
            if !(omega > T::zero() && omega <= two) {
                return Err(AmgError::InvalidParameter(
                    "SSOR relaxation factor must be in (0, 2]".into(),
                ));
            }
        }
        Ok(Self { omega_f, omega_r, sweep, a: None, diag: Vec::new(), half: Vec::new() })
    }

    /// Symmetric Gauss-Seidel (both factors 1).
    pub fn gauss_seidel() -> Self {
        Self {
            omega_f: T::one(),
            omega_r: T::one(),
            sweep: SorSweep::SYMMETRIC,
            a: None,
            diag: Vec::new(),
            half: Vec::new(),
        }
    }

    /// Bind to a shared matrix and locate the diagonal of every row.
    pub fn set_matrix(&mut self, a: Arc<CsrMatrix<T>>) -> Result<(), AmgError> {
        let diag = a.find_diagonal()?;
        let values = a.values();
        if let Some(i) = (0..diag.len()).find(|&i| values[diag[i]] == T::zero()) {
            return Err(AmgError::ZeroPivot(i));
        }
        self.diag = diag;
        self.half = vec![T::zero(); a.nrows()];
        self.a = Some(a);
        Ok(())
    }

    pub fn omega_f(&self) -> T {
        self.omega_f
    }
    pub fn omega_r(&self) -> T {
        self.omega_r
    }
    pub fn sweep(&self) -> SorSweep {
        self.sweep
    }

    fn relax(&mut self, b: &[T], x: &mut [T]) -> Result<(), AmgError> {
        let a = self.a.as_ref().ok_or(AmgError::NotSetUp)?;
        let n = a.nrows();
        if b.len() != n {
            return Err(AmgError::DimensionMismatch { expected: n, got: b.len() });
        }
        if x.len() != n {
            return Err(AmgError::DimensionMismatch { expected: n, got: x.len() });
        }
        let (row_ptr, col_idx, values) = (a.row_ptr(), a.col_idx(), a.values());
        let half = &mut self.half;
        half.copy_from_slice(x);

        // Forward sweep: half-iterate from x, fresh values below the diagonal.
        if self.sweep.contains(SorSweep::FORWARD) {
            for i in 0..n {
                let d = self.diag[i];
                let mut sigma = T::zero();
                for k in row_ptr[i]..d {
                    sigma = sigma + values[k] * half[col_idx[k]];
                }
                for k in d + 1..row_ptr[i + 1] {
                    sigma = sigma + values[k] * x[col_idx[k]];
                }
                let target = (b[i] - sigma) / values[d];
                half[i] = x[i] + self.omega_f * (target - x[i]);
            }
        }
        if !self.sweep.contains(SorSweep::BACKWARD) {
            x.copy_from_slice(half);
            return Ok(());
        }

        // Backward sweep: half-iterate below the diagonal, fresh values above.
        for i in (0..n).rev() {
            let d = self.diag[i];
            let mut sigma = T::zero();
            for k in row_ptr[i]..d {
                sigma = sigma + values[k] * half[col_idx[k]];
            }
            for k in d + 1..row_ptr[i + 1] {
                sigma = sigma + values[k] * x[col_idx[k]];
            }
            let target = (b[i] - sigma) / values[d];
            x[i] = half[i] + self.omega_r * (target - half[i]);
        }
        Ok(())
    }
}

impl<T: Float + fmt::Display> fmt::Display for Ssor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SSOR(omega_f={}, omega_r={}, sweep={:?})", self.omega_f, self.omega_r, self.sweep)
    }
}

impl<T: Float> Preconditioner<CsrMatrix<T>, Vec<T>> for Ssor<T> {
    fn setup(&mut self, a: &CsrMatrix<T>) -> Result<(), AmgError> {
        self.set_matrix(Arc::new(a.clone()))
    }

    fn apply(&mut self, b: &Vec<T>, x: &mut Vec<T>) -> Result<(), AmgError> {
        self.relax(b, x)
    }

    /// Assumes a symmetric matrix: the transposed sweep is the sweep itself.
    fn trans_apply(&mut self, b: &Vec<T>, x: &mut Vec<T>) -> Result<(), AmgError> {
        self.relax(b, x)
    }
}
