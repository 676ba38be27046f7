//! Construction options for the AMG preconditioner.
//!
//! `AmgOptions` collects the relaxation factors of the pre- and post-smoothers,
//! the sweep counts, the cycle fan-out and the coarsening controls. Values are
//! checked by [`AmgOptions::validate`] before any hierarchy is built.

use crate::error::AmgError;

/// AMG preconditioner parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AmgOptions {
    /// Forward relaxation factor of the pre-smoother, in (0, 2]
    pub omega_pre_f: f64,
    /// Backward relaxation factor of the pre-smoother, in (0, 2]
    pub omega_pre_r: f64,
    /// Forward relaxation factor of the post-smoother, in (0, 2]
    pub omega_post_f: f64,
    /// Backward relaxation factor of the post-smoother, in (0, 2]
    pub omega_post_r: f64,
    /// Pre-smoothing sweeps (ν₁)
    pub nu1: usize,
    /// Post-smoothing sweeps (ν₂)
    pub nu2: usize,
    /// Recursive calls per level: 1 gives a V-cycle, 2 a W-cycle
    pub gamma: usize,
    /// Stop coarsening once a level has at most this many rows
    pub min_size: usize,
    /// Jacobi damping of the prolongation smoother, in [0, 1]; 0 disables smoothing
    pub omega: f64,
    /// Upper bound on the number of levels, coarsest included
    pub max_levels: usize,
}

impl Default for AmgOptions {
    fn default() -> Self {
        // SSOR(1, 1.85) before and SSOR(1.85, 1) after keeps the cycle symmetric.
        Self {
            omega_pre_f: 1.0,
            omega_pre_r: 1.85,
            omega_post_f: 1.85,
            omega_post_r: 1.0,
            nu1: 1,
            nu2: 1,
            gamma: 1,
            min_size: 40,
            omega: 2.0 / 3.0,
            max_levels: 25,
        }
    }
}

impl AmgOptions {
    /// Plain Gauss-Seidel smoothing (all relaxation factors 1) with the default coarsening.
    pub fn gauss_seidel() -> Self {
        Self {
            omega_pre_f: 1.0,
            omega_pre_r: 1.0,
            omega_post_f: 1.0,
            omega_post_r: 1.0,
            ..Default::default()
        }
    }
    pub fn with_pre_smoother(mut self, omega_f: f64, omega_r: f64) -> Self {
        self.omega_pre_f = omega_f;
        self.omega_pre_r = omega_r;
        self
    }
    pub fn with_post_smoother(mut self, omega_f: f64, omega_r: f64) -> Self {
        self.omega_post_f = omega_f;
        self.omega_post_r = omega_r;
        self
    }
    pub fn with_sweeps(mut self, nu1: usize, nu2: usize) -> Self {
        self.nu1 = nu1;
        self.nu2 = nu2;
        self
    }
    pub fn with_gamma(mut self, gamma: usize) -> Self {
        self.gamma = gamma;
        self
    }
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<(), AmgError> {
        let factors = [
            ("omega_pre_f", self.omega_pre_f),
            ("omega_pre_r", self.omega_pre_r),
            ("omega_post_f", self.omega_post_f),
            ("omega_post_r", self.omega_post_r),
        ];
        for (name, value) in factors {
            if !(value > 0.0 && value <= 2.0) {
                return Err(AmgError::InvalidParameter(format!(
                    "{name} must be in (0, 2], got {value}"
                )));
            }
        }
        if self.gamma < 1 {
            return Err(AmgError::InvalidParameter("gamma must be at least 1".into()));
        }
        if self.min_size == 0 {
            return Err(AmgError::InvalidParameter("min_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.omega) {
            return Err(AmgError::InvalidParameter(format!(
                "omega must be in [0, 1], got {}",
                self.omega
            )));
        }
        if self.max_levels < 2 {
            return Err(AmgError::InvalidParameter("max_levels must be at least 2".into()));
        }
        Ok(())
    }
}
