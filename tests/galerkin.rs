//! Galerkin property of the coarse operators.
//!
//! For random weighted 1-D and 2-D Laplacians the coarse matrix produced with the
//! interpolation must equal the dense triple product `Iᵀ A I`, both for the plain
//! tentative prolongation and for the Jacobi-smoothed one.

use approx::assert_abs_diff_eq;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kryst_amg::matrix::CsrMatrix;
use kryst_amg::preconditioner::amg::aggregation::{Aggregates, strength_threshold};
use kryst_amg::preconditioner::amg::interpolation::Interpolation;

/// Weighted graph Laplacian with a small diagonal shift so that it is SPD.
fn weighted_laplacian(n: usize, edges: &[(usize, usize, f64)]) -> CsrMatrix<f64> {
    let mut diag = vec![0.1; n];
    let mut t = Vec::new();
    for &(i, j, w) in edges {
        t.push((i, j, -w));
        t.push((j, i, -w));
        diag[i] += w;
        diag[j] += w;
    }
    t.extend(diag.into_iter().enumerate().map(|(i, d)| (i, i, d)));
    CsrMatrix::from_triplets(n, n, t)
}

fn random_chain(rng: &mut StdRng) -> CsrMatrix<f64> {
    let n = rng.gen_range(5..=50);
    let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1, rng.gen_range(0.5..2.0))).collect();
    weighted_laplacian(n, &edges)
}

fn random_grid(rng: &mut StdRng) -> CsrMatrix<f64> {
    let nx = rng.gen_range(3..=7);
    let ny = rng.gen_range(3..=7);
    let idx = |i: usize, j: usize| i * ny + j;
    let mut edges = Vec::new();
    for i in 0..nx {
        for j in 0..ny {
            if i + 1 < nx {
                edges.push((idx(i, j), idx(i + 1, j), rng.gen_range(0.5..2.0)));
            }
            if j + 1 < ny {
                edges.push((idx(i, j), idx(i, j + 1), rng.gen_range(0.5..2.0)));
            }
        }
    }
    weighted_laplacian(nx * ny, &edges)
}

/// Dense `Pᵀ A P`.
fn triple_product(a: &Mat<f64>, p: &Mat<f64>) -> Mat<f64> {
    let ap = Mat::from_fn(a.nrows(), p.ncols(), |i, c| {
        (0..a.ncols()).map(|j| a[(i, j)] * p[(j, c)]).sum::<f64>()
    });
    Mat::from_fn(p.ncols(), p.ncols(), |r, c| {
        (0..p.nrows()).map(|i| p[(i, r)] * ap[(i, c)]).sum::<f64>()
    })
}

fn check_galerkin(a: &CsrMatrix<f64>, level: usize, omega: f64) {
    let aggs = Aggregates::build(a, strength_threshold(level)).unwrap();
    let (interp, coarse) = Interpolation::build(a, &aggs, omega);
    let p = interp.to_csr().to_dense();
    let expected = triple_product(&a.to_dense(), &p);

    assert_eq!(coarse.nrows(), aggs.len());
    for r in 0..coarse.nrows() {
        for c in 0..coarse.ncols() {
            assert_abs_diff_eq!(coarse.get(r, c), expected[(r, c)], epsilon = 1e-10);
            assert_abs_diff_eq!(coarse.get(r, c), coarse.get(c, r), epsilon = 1e-12);
        }
        // the diagonal is always stored
        assert!(coarse.row(r).any(|(c, _)| c == r));
    }
}

#[test]
fn galerkin_tentative_random_chains() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        check_galerkin(&random_chain(&mut rng), 0, 0.0);
    }
}

#[test]
fn galerkin_smoothed_random_chains() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        check_galerkin(&random_chain(&mut rng), 0, 2.0 / 3.0);
    }
}

#[test]
fn galerkin_random_grids() {
    let mut rng = StdRng::seed_from_u64(2024);
    for trial in 0..20 {
        let a = random_grid(&mut rng);
        let level = trial % 3;
        check_galerkin(&a, level, 0.0);
        check_galerkin(&a, level, 2.0 / 3.0);
        check_galerkin(&a, level, 1.0);
    }
}

#[test]
fn smoothed_prolongation_preserves_constants_away_from_boundary() {
    // Interior rows of the unshifted operator annihilate constants, so P 1 = 1 there.
    let n = 30;
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
    let a = CsrMatrix::from_triplets(n, n, t);
    let aggs = Aggregates::build(&a, strength_threshold(0)).unwrap();
    let (interp, _) = Interpolation::build(&a, &aggs, 2.0 / 3.0);
    let mut u = vec![0.0; n];
    interp.prolongate_add(&vec![1.0; interp.n_coarse()], &mut u);
    for &ui in &u[1..n - 1] {
        assert_abs_diff_eq!(ui, 1.0, epsilon = 1e-14);
    }
}
