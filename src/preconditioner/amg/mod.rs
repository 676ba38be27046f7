//! Smoothed-aggregation algebraic multigrid preconditioner.
//!
//! Setup coarsens the system matrix by aggregation until a level has at most
//! `min_size` rows (or `max_levels` is reached), factors the coarsest operator
//! densely and binds SSOR pre- and post-smoothers to every level. One application
//! is a single V-cycle (`gamma = 1`) or W-cycle (`gamma = 2`) started from the
//! incoming `x`.
//!
//! # References
//! - Vaněk, Mandel & Brezina, Computing 56 (1996) 179-196
//! - Trottenberg, Oosterlee & Schüller, Multigrid, §2.4

pub mod aggregation;
mod hierarchy;
pub mod interpolation;

pub use hierarchy::AmgDiagnostics;

use crate::config::AmgOptions;
use crate::error::AmgError;
use crate::matrix::sparse::CsrMatrix;
use crate::preconditioner::Preconditioner;
use crate::solver::DenseLu;
use hierarchy::{Hierarchy, Level};
use interpolation::Interpolation;

pub struct AMG {
    options: AmgOptions,
    levels: Vec<Level>,
    interps: Vec<Interpolation>,
    lu: Option<DenseLu>,
    visits: Vec<usize>,
    diagnostics: Option<AmgDiagnostics>,
}

impl AMG {
    /// An empty preconditioner; call [`Preconditioner::setup`] before applying it.
    pub fn new(options: AmgOptions) -> Result<Self, AmgError> {
        options.validate()?;
        Ok(Self {
            options,
            levels: Vec::new(),
            interps: Vec::new(),
            lu: None,
            visits: Vec::new(),
            diagnostics: None,
        })
    }

    /// Build the hierarchy for `a` right away.
    pub fn from_csr(a: &CsrMatrix<f64>, options: AmgOptions) -> Result<Self, AmgError> {
        let mut amg = Self::new(options)?;
        amg.setup(a)?;
        Ok(amg)
    }

    pub fn options(&self) -> &AmgOptions {
        &self.options
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Operator of level `k`; level 0 is the system matrix.
    pub fn level_matrix(&self, k: usize) -> Option<&CsrMatrix<f64>> {
        self.levels.get(k).map(|l| l.a.as_ref())
    }

    /// Interpolation from level `k + 1` to level `k`.
    pub fn interpolation(&self, k: usize) -> Option<&Interpolation> {
        self.interps.get(k)
    }

    /// How often each level was entered during the most recent cycle.
    pub fn level_visits(&self) -> &[usize] {
        &self.visits
    }

    pub fn diagnostics(&self) -> Option<&AmgDiagnostics> {
        self.diagnostics.as_ref()
    }

    fn cycle(&mut self, k: usize, transposed: bool) -> Result<(), AmgError> {
        self.visits[k] += 1;

        if k + 1 == self.levels.len() {
            let lu = self.lu.as_ref().ok_or(AmgError::NotSetUp)?;
            let level = &mut self.levels[k];
            level.u.copy_from_slice(&level.f);
            return if transposed {
                lu.solve_transpose(&mut level.u)
            } else {
                lu.solve(&mut level.u)
            };
        }

        let (nu1, nu2, gamma) = (self.options.nu1, self.options.nu2, self.options.gamma);
        {
            let (fine, coarse) = self.levels.split_at_mut(k + 1);
            let (fine, coarse) = (&mut fine[k], &mut coarse[0]);
            for _ in 0..nu1 {
                fine.pre.apply(&fine.f, &mut fine.u)?;
            }
            coarse.u.fill(0.0);
            fine.a.residual(&fine.f, &fine.u, &mut fine.r);
            self.interps[k].restrict(&fine.r, &mut coarse.f);
        }

        for _ in 0..gamma {
            self.cycle(k + 1, transposed)?;
        }

        let (fine, coarse) = self.levels.split_at_mut(k + 1);
        let (fine, coarse) = (&mut fine[k], &coarse[0]);
        self.interps[k].prolongate_add(&coarse.u, &mut fine.u);
        for _ in 0..nu2 {
            fine.post.apply(&fine.f, &mut fine.u)?;
        }
        Ok(())
    }

    fn run(&mut self, b: &[f64], x: &mut [f64], transposed: bool) -> Result<(), AmgError> {
        let n = match self.levels.first() {
            Some(level) => level.a.nrows(),
            None => return Err(AmgError::NotSetUp),
        };
        if b.len() != n {
            return Err(AmgError::DimensionMismatch { expected: n, got: b.len() });
        }
        if x.len() != n {
            return Err(AmgError::DimensionMismatch { expected: n, got: x.len() });
        }
        self.visits.fill(0);
        self.levels[0].u.copy_from_slice(x);
        self.levels[0].f.copy_from_slice(b);
        self.cycle(0, transposed)?;
        x.copy_from_slice(&self.levels[0].u);
        Ok(())
    }
}

impl Preconditioner<CsrMatrix<f64>, Vec<f64>> for AMG {
    /// Rebuild the hierarchy for `a`. On error the previous hierarchy is kept.
    fn setup(&mut self, a: &CsrMatrix<f64>) -> Result<(), AmgError> {
        let Hierarchy { levels, interps, lu, diagnostics } = Hierarchy::build(a, &self.options)?;
        self.visits = vec![0; levels.len()];
        self.levels = levels;
        self.interps = interps;
        self.lu = Some(lu);
        self.diagnostics = Some(diagnostics);
        Ok(())
    }

    /// One multigrid cycle for `A x = b`, starting from the current `x`.
    fn apply(&mut self, b: &Vec<f64>, x: &mut Vec<f64>) -> Result<(), AmgError> {
        self.run(b, x, false)
    }

    /// Same cycle with the coarsest solve transposed; smoothers and transfers
    /// assume a symmetric operator.
    fn trans_apply(&mut self, b: &Vec<f64>, x: &mut Vec<f64>) -> Result<(), AmgError> {
        self.run(b, x, true)
    }
}
