//! Multigrid hierarchy construction.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AmgOptions;
use crate::error::AmgError;
use crate::matrix::sparse::CsrMatrix;
use crate::preconditioner::amg::aggregation::{Aggregates, strength_threshold};
use crate::preconditioner::amg::interpolation::Interpolation;
use crate::preconditioner::ssor::{SorSweep, Ssor};
use crate::solver::direct_lu::DenseLu;

/// One grid of the hierarchy with its smoothers and cycle scratch space.
pub(super) struct Level {
    pub a: Arc<CsrMatrix<f64>>,
    pub pre: Ssor<f64>,
    pub post: Ssor<f64>,
    /// Iterate
    pub u: Vec<f64>,
    /// Right-hand side
    pub f: Vec<f64>,
    /// Residual
    pub r: Vec<f64>,
}

impl Level {
    fn new(a: CsrMatrix<f64>, options: &AmgOptions) -> Result<Self, AmgError> {
        let n = a.nrows();
        let a = Arc::new(a);
        let mut pre = Ssor::new(options.omega_pre_f, options.omega_pre_r, SorSweep::SYMMETRIC)?;
        pre.set_matrix(Arc::clone(&a))?;
        let mut post = Ssor::new(options.omega_post_f, options.omega_post_r, SorSweep::SYMMETRIC)?;
        post.set_matrix(Arc::clone(&a))?;
        Ok(Self { a, pre, post, u: vec![0.0; n], f: vec![0.0; n], r: vec![0.0; n] })
    }
}

/// Diagnostic information about AMG setup
#[derive(Debug, Clone, PartialEq)]
pub struct AmgDiagnostics {
    /// Number of levels, coarsest included
    pub num_levels: usize,
    /// Rows per level
    pub level_rows: Vec<usize>,
    /// Stored entries per level
    pub level_nnz: Vec<usize>,
    /// Σ rows_k / rows_0
    pub grid_complexity: f64,
    /// Σ nnz_k / nnz_0
    pub operator_complexity: f64,
    /// Setup time in milliseconds
    pub setup_time_ms: f64,
}

pub(super) struct Hierarchy {
    pub levels: Vec<Level>,
    /// `interps[k]` maps level k+1 to level k.
    pub interps: Vec<Interpolation>,
    pub lu: DenseLu,
    pub diagnostics: AmgDiagnostics,
}

impl Hierarchy {
    pub fn build(a: &CsrMatrix<f64>, options: &AmgOptions) -> Result<Self, AmgError> {
        let start = Instant::now();
        let mut matrices = vec![a.clone()];
        let mut interps = Vec::new();

        while matrices.len() < options.max_levels {
            let k = matrices.len() - 1;
            let ak = &matrices[k];
            if ak.nrows() <= options.min_size {
                break;
            }
            let aggs = Aggregates::build(ak, strength_threshold(k))?;
            if aggs.is_empty() {
                log::debug!("AMG level {k}: no aggregates, coarsening stops");
                break;
            }
            let dropped = aggs.unaggregated();
            if dropped > 0 {
                log::warn!("AMG level {k}: {dropped} isolated nodes left out of the coarse grid");
            }
            let (interp, coarse) = Interpolation::build(ak, &aggs, options.omega);
            log::debug!(
                "AMG level {k}: {} rows, {} nnz -> {} aggregates ({} nnz)",
                ak.nrows(),
                ak.nnz(),
                coarse.nrows(),
                coarse.nnz()
            );
            interps.push(interp);
            matrices.push(coarse);
        }

        if interps.is_empty() {
            return Err(AmgError::MatrixTooSmall { rows: a.nrows() });
        }

        let coarsest = matrices.last().ok_or(AmgError::MatrixTooSmall { rows: a.nrows() })?;
        let lu = DenseLu::from_csr(coarsest)?;

        let level_rows: Vec<usize> = matrices.iter().map(|m| m.nrows()).collect();
        let level_nnz: Vec<usize> = matrices.iter().map(|m| m.nnz()).collect();
        let levels = matrices
            .into_iter()
            .map(|m| Level::new(m, options))
            .collect::<Result<Vec<_>, _>>()?;

        let (grid_complexity, operator_complexity) = complexities(&level_rows, &level_nnz);
        let setup_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "AMG hierarchy: {} levels {:?}, grid complexity {:.3}, operator complexity {:.3}, setup {:.2} ms",
            levels.len(),
            level_rows,
            grid_complexity,
            operator_complexity,
            setup_time_ms
        );

        let diagnostics = AmgDiagnostics {
            num_levels: levels.len(),
            level_rows,
            level_nnz,
            grid_complexity,
            operator_complexity,
            setup_time_ms,
        };
        Ok(Self { levels, interps, lu, diagnostics })
    }
}

fn complexities(rows: &[usize], nnz: &[usize]) -> (f64, f64) {
    let ratio = |v: &[usize]| {
        let fine = v.first().copied().unwrap_or(0).max(1) as f64;
        v.iter().sum::<usize>() as f64 / fine
    };
    (ratio(rows), ratio(nnz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexities_sum_over_levels() {
        let (g, o) = complexities(&[64, 22, 8], &[190, 64, 22]);
        assert_eq!(g, 94.0 / 64.0);
        assert_eq!(o, 276.0 / 190.0);
    }
}
