//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2

use crate::core::traits::{Axpy, Indexing, InnerProduct, MatVec};
use crate::error::AmgError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};

pub struct PcgSolver<T> {
    pub conv: Convergence<T>,
    pub residual_history: Vec<T>,
}

impl<T: Copy + num_traits::Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self { conv: Convergence { tol, max_iters }, residual_history: Vec::new() }
    }
    pub fn clear_history(&mut self) {
        self.residual_history.clear();
    }
}

// z ← M⁻¹ r, starting the preconditioner from a zero iterate.
fn precondition<M, V, T>(
    pc: &mut Option<&mut dyn Preconditioner<M, V>>,
    r: &V,
    z: &mut V,
) -> Result<(), AmgError>
where
    V: AsMut<[T]> + Clone,
    T: num_traits::Float,
{
    match pc {
        Some(pc) => {
            z.as_mut().fill(T::zero());
            pc.apply(r, z)
        }
        None => {
            z.clone_from(r);
            Ok(())
        }
    }
}

impl<M, V, T> LinearSolver<M, V> for PcgSolver<T>
where
    M: MatVec<V> + Indexing,
    (): InnerProduct<V, Scalar = T>,
    V: AsMut<[T]> + AsRef<[T]> + From<Vec<T>> + Clone + Axpy<T>,
    T: num_traits::Float + From<f64>,
{
    type Error = AmgError;
    type Scalar = T;

    /// Solve with the relative (unpreconditioned) residual as stopping test.
    fn solve(
        &mut self,
        a: &M,
        mut pc: Option<&mut dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<T>, AmgError> {
        let n = b.as_ref().len();
        if a.nrows() != n {
            return Err(AmgError::DimensionMismatch { expected: a.nrows(), got: n });
        }
        let ip = ();
        let mut r = V::from(vec![T::zero(); n]);
        a.matvec(x, &mut r);
        for (ri, &bi) in r.as_mut().iter_mut().zip(b.as_ref()) {
            *ri = bi - *ri;
        }
        let res0 = ip.norm(&r);
        self.residual_history.push(res0);
        if res0 == T::zero() {
            return Ok(SolveStats { iterations: 0, final_residual: res0, converged: true });
        }
        let mut z = V::from(vec![T::zero(); n]);
        precondition::<M, V, T>(&mut pc, &r, &mut z)?;
        let mut p = z.clone();
        let mut ap = V::from(vec![T::zero(); n]);
        let mut rz = ip.dot(&r, &z);
        let mut stats = SolveStats { iterations: 0, final_residual: res0, converged: false };
        for i in 0..self.conv.max_iters {
            a.matvec(&p, &mut ap);
            let p_dot_ap = ip.dot(&p, &ap);
            if p_dot_ap <= T::zero() {
                return Err(AmgError::IndefiniteMatrix);
            }
            let alpha = rz / p_dot_ap;
            x.axpy(alpha, &p);
            r.axpy(-alpha, &ap);
            let res_norm = ip.norm(&r);
            self.residual_history.push(res_norm);
            let (stop, s) = self.conv.check(res_norm, res0, i + 1);
            stats = s;
            if stop {
                break;
            }
            precondition::<M, V, T>(&mut pc, &r, &mut z)?;
            let rz_new = ip.dot(&r, &z);
            let beta = rz_new / rz;
            // p ← z + β p
            for (pj, &zj) in p.as_mut().iter_mut().zip(z.as_ref()) {
                *pj = zj + beta * *pj;
            }
            rz = rz_new;
        }
        Ok(stats)
    }
}
