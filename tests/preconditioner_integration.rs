//! Integration tests for the AMG preconditioner inside the conjugate gradient solver.
//!
//! A symmetric AMG cycle (SSOR(1, 1.85) before, SSOR(1.85, 1) after) is a valid SPD
//! preconditioner, so PCG must converge and needs far fewer iterations than plain CG
//! on the model Laplacians.

use kryst_amg::config::AmgOptions;
use kryst_amg::matrix::CsrMatrix;
use kryst_amg::preconditioner::{AMG, Preconditioner, Ssor};
use kryst_amg::solver::{LinearSolver, PcgSolver};

fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
    let mut t = Vec::new();
    for i in 0..n {
        t.push((i, i, 2.0));
        if i > 0 {
            t.push((i, i - 1, -1.0));
        }
        if i + 1 < n {
            t.push((i, i + 1, -1.0));
        }
    }
    CsrMatrix::from_triplets(n, n, t)
}

fn laplacian_2d(m: usize) -> CsrMatrix<f64> {
    let idx = |i: usize, j: usize| i * m + j;
    let mut t = Vec::new();
    for i in 0..m {
        for j in 0..m {
            t.push((idx(i, j), idx(i, j), 4.0));
            if i > 0 {
                t.push((idx(i, j), idx(i - 1, j), -1.0));
            }
            if i + 1 < m {
                t.push((idx(i, j), idx(i + 1, j), -1.0));
            }
            if j > 0 {
                t.push((idx(i, j), idx(i, j - 1), -1.0));
            }
            if j + 1 < m {
                t.push((idx(i, j), idx(i, j + 1), -1.0));
            }
        }
    }
    CsrMatrix::from_triplets(m * m, m * m, t)
}

fn relative_residual(a: &CsrMatrix<f64>, b: &[f64], x: &[f64]) -> f64 {
    let mut r = vec![0.0; b.len()];
    a.residual(b, x, &mut r);
    let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
    norm(&r) / norm(b)
}

/// Iterations of plain CG and AMG-preconditioned CG on `A x = 1`.
fn compare(a: &CsrMatrix<f64>, options: AmgOptions) -> (usize, usize) {
    let n = a.nrows();
    let b = vec![1.0; n];

    let mut x = vec![0.0; n];
    let plain = PcgSolver::new(1e-8, 500).solve(a, None, &b, &mut x).unwrap();
    assert!(plain.converged);

    let mut amg = AMG::from_csr(a, options).unwrap();
    let mut x = vec![0.0; n];
    let stats = PcgSolver::new(1e-8, 500).solve(a, Some(&mut amg), &b, &mut x).unwrap();
    assert!(stats.converged);
    assert!(relative_residual(a, &b, &x) < 1e-7);
    (plain.iterations, stats.iterations)
}

#[test]
fn pcg_amg_on_chain() {
    let a = laplacian_1d(64);
    for min_size in [40, 10] {
        let (plain, amg) = compare(&a, AmgOptions::default().with_min_size(min_size));
        assert!(amg <= 15, "AMG-PCG took {amg} iterations");
        assert!(amg < plain, "AMG-PCG {amg} vs CG {plain}");
    }
}

#[test]
fn pcg_amg_on_grid() {
    let a = laplacian_2d(16);
    let (plain, amg) = compare(&a, AmgOptions::default().with_min_size(10));
    assert!(amg <= 15, "AMG-PCG took {amg} iterations");
    assert!(amg < plain, "AMG-PCG {amg} vs CG {plain}");
}

#[test]
fn pcg_w_cycle_unsmoothed() {
    let a = laplacian_2d(16);
    let options = AmgOptions::default().with_min_size(10).with_omega(0.0).with_gamma(2);
    let (plain, amg) = compare(&a, options);
    assert!(amg < plain, "AMG-PCG {amg} vs CG {plain}");
}

#[test]
fn pcg_with_ssor_preconditioner() {
    let a = laplacian_1d(64);
    let b = vec![1.0; 64];
    let mut ssor = Ssor::<f64>::gauss_seidel();
    ssor.setup(&a).unwrap();
    let mut x = vec![0.0; 64];
    let mut solver = PcgSolver::new(1e-8, 500);
    let stats = solver.solve(&a, Some(&mut ssor), &b, &mut x).unwrap();
    assert!(stats.converged);
    assert_eq!(solver.residual_history.len(), stats.iterations + 1);
    assert!(relative_residual(&a, &b, &x) < 1e-7);
}

#[test]
fn amg_setup_through_trait_object() {
    let a = laplacian_1d(64);
    let mut amg = AMG::new(AmgOptions::default()).unwrap();
    let pc: &mut dyn Preconditioner<CsrMatrix<f64>, Vec<f64>> = &mut amg;
    pc.setup(&a).unwrap();
    let b = vec![1.0; 64];
    let mut x = vec![0.0; 64];
    pc.apply(&b, &mut x).unwrap();
    assert!(relative_residual(&a, &b, &x) < 1.0);
    assert_eq!(amg.num_levels(), 2);
}
