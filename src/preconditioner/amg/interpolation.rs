//! Prolongation operators and Galerkin coarse operators.
//!
//! The tentative prolongation maps every aggregated fine node to the column of its
//! aggregate with weight one. With a nonzero damping factor ω it is improved by one
//! damped Jacobi step on the filtered matrix (weak couplings lumped onto the
//! diagonal), which gives the smoothed-aggregation prolongation
//! `P = (I - ω D⁻¹ A_F) P_tent`.
//!
//! Either way the coarse operator is exactly `Pᵀ A P`.

use std::collections::BTreeMap;

use crate::matrix::sparse::{CsrMatrix, SparseMatrix};
use crate::preconditioner::amg::aggregation::Aggregates;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Interpolation from one coarse level to the next finer one.
#[derive(Debug, Clone)]
pub enum Interpolation {
    /// Piecewise-constant prolongation; columns are disjoint so a map suffices.
    Tentative {
        node_to_agg: Vec<Option<usize>>,
        members: Vec<Vec<usize>>,
    },
    /// Jacobi-smoothed prolongation, with its transpose kept for restriction.
    Smoothed { p: CsrMatrix<f64>, pt: CsrMatrix<f64> },
}

impl Interpolation {
    /// Build the interpolation for `aggs` and return it with the coarse operator.
    pub fn build(a: &CsrMatrix<f64>, aggs: &Aggregates, omega: f64) -> (Self, CsrMatrix<f64>) {
        if omega == 0.0 {
            let coarse = galerkin_tentative(a, aggs);
            let interp = Interpolation::Tentative {
                node_to_agg: aggs.node_to_agg.clone(),
                members: aggs.members.clone(),
            };
            return (interp, coarse);
        }
        let p = smoothed_prolongation(a, aggs, omega);
        let pt = p.transpose();
        let coarse = galerkin_explicit(a, &pt);
        (Interpolation::Smoothed { p, pt }, coarse)
    }

    pub fn n_fine(&self) -> usize {
        match self {
            Interpolation::Tentative { node_to_agg, .. } => node_to_agg.len(),
            Interpolation::Smoothed { p, .. } => p.nrows(),
        }
    }

    pub fn n_coarse(&self) -> usize {
        match self {
            Interpolation::Tentative { members, .. } => members.len(),
            Interpolation::Smoothed { p, .. } => p.ncols(),
        }
    }

    /// Restriction: `fc ← Iᵀ r`.
    pub fn restrict(&self, r: &[f64], fc: &mut [f64]) {
        assert_eq!(r.len(), self.n_fine());
        assert_eq!(fc.len(), self.n_coarse());
        match self {
            Interpolation::Tentative { members, .. } => {
                // Row c of Iᵀ is the indicator of aggregate c.
                let sum = |(c, f): (usize, &mut f64)| *f = members[c].iter().map(|&i| r[i]).sum();
                #[cfg(feature = "rayon")]
                fc.par_iter_mut().enumerate().for_each(sum);
                #[cfg(not(feature = "rayon"))]
                fc.iter_mut().enumerate().for_each(sum);
            }
            Interpolation::Smoothed { pt, .. } => pt.spmv(r, fc),
        }
    }

    /// Coarse-grid correction: `uf ← uf + I uc`.
    pub fn prolongate_add(&self, uc: &[f64], uf: &mut [f64]) {
        assert_eq!(uc.len(), self.n_coarse());
        assert_eq!(uf.len(), self.n_fine());
        match self {
            Interpolation::Tentative { node_to_agg, .. } => {
                let add = |(u, c): (&mut f64, &Option<usize>)| {
                    if let Some(c) = *c {
                        *u += uc[c];
                    }
                };
                #[cfg(feature = "rayon")]
                uf.par_iter_mut().zip(node_to_agg.par_iter()).for_each(add);
                #[cfg(not(feature = "rayon"))]
                uf.iter_mut().zip(node_to_agg.iter()).for_each(add);
            }
            Interpolation::Smoothed { p, .. } => {
                let add = |(i, u): (usize, &mut f64)| *u += p.row_dot(i, uc);
                #[cfg(feature = "rayon")]
                uf.par_iter_mut().enumerate().for_each(add);
                #[cfg(not(feature = "rayon"))]
                uf.iter_mut().enumerate().for_each(add);
            }
        }
    }

    /// The prolongation as an explicit `n_fine × n_coarse` CSR matrix.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        match self {
            Interpolation::Tentative { node_to_agg, members } => {
                let triplets = node_to_agg
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| c.map(|c| (i, c, 1.0)))
                    .collect();
                CsrMatrix::from_triplets(node_to_agg.len(), members.len(), triplets)
            }
            Interpolation::Smoothed { p, .. } => p.clone(),
        }
    }
}

/// `Pᵀ A P` for the tentative prolongation by scattering every fine entry into
/// its (aggregate, aggregate) slot. Coarse rows are accumulated one at a time in a
/// dense scratch row, so the work is linear in nnz(A) plus the sort of each coarse row.
fn galerkin_tentative(a: &CsrMatrix<f64>, aggs: &Aggregates) -> CsrMatrix<f64> {
    let nc = aggs.len();
    let mut acc = vec![0.0; nc];
    // coarse row that last wrote each column
    let mut owner: Vec<Option<usize>> = vec![None; nc];
    let mut touched: Vec<usize> = Vec::new();

    let mut row_ptr = Vec::with_capacity(nc + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0);
    for (c, members) in aggs.members.iter().enumerate() {
        for &i in members {
            for (j, v) in a.row(i) {
                let Some(cj) = aggs.node_to_agg[j] else { continue };
                if owner[cj] != Some(c) {
                    owner[cj] = Some(c);
                    acc[cj] = 0.0;
                    touched.push(cj);
                }
                acc[cj] += v;
            }
        }
        touched.sort_unstable();
        for &cj in &touched {
            col_idx.push(cj);
            values.push(acc[cj]);
        }
        touched.clear();
        row_ptr.push(col_idx.len());
    }
    CsrMatrix::from_csr(nc, nc, row_ptr, col_idx, values)
}

/// One row of `(I - ω D⁻¹ A_F) P_tent`.
fn smoothed_row(a: &CsrMatrix<f64>, aggs: &Aggregates, omega: f64, i: usize) -> Vec<(usize, f64)> {
    let strong = &aggs.neighborhoods[i];
    let is_strong = |j: usize| strong.binary_search(&j).is_ok();
    let a_ii = a.values()[aggs.diag[i]];

    // Weak couplings are lumped onto the diagonal of the filtered matrix.
    let weak: f64 = a.row(i).filter(|&(j, _)| j != i && !is_strong(j)).map(|(_, v)| v).sum();

    let mut row: BTreeMap<usize, f64> = BTreeMap::new();
    for (j, v) in a.row(i).filter(|&(j, _)| is_strong(j)) {
        let v = if j == i { v - weak } else { v };
        if let Some(c) = aggs.node_to_agg[j] {
            *row.entry(c).or_insert(0.0) += v;
        }
    }
    let scale = -omega / a_ii;
    for v in row.values_mut() {
        *v *= scale;
    }
    if let Some(c) = aggs.node_to_agg[i] {
        *row.entry(c).or_insert(0.0) += 1.0;
    }
    row.into_iter().collect()
}

fn smoothed_prolongation(a: &CsrMatrix<f64>, aggs: &Aggregates, omega: f64) -> CsrMatrix<f64> {
    let n = a.nrows();
    #[cfg(feature = "rayon")]
    let rows: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| smoothed_row(a, aggs, omega, i))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let rows: Vec<Vec<(usize, f64)>> = (0..n).map(|i| smoothed_row(a, aggs, omega, i)).collect();
    assemble(n, aggs.len(), rows)
}

/// Column `c` of `Pᵀ A P`: expand column c of P densely, apply A, then Pᵀ.
/// The diagonal is always kept, even when it cancels to zero.
fn galerkin_column(a: &CsrMatrix<f64>, pt: &CsrMatrix<f64>, c: usize) -> Vec<(usize, usize, f64)> {
    let n_fine = a.nrows();
    let mut v = vec![0.0; n_fine];
    for (i, val) in pt.row(c) {
        v[i] = val;
    }
    let mut w = vec![0.0; n_fine];
    a.spmv(&v, &mut w);
    let mut y = vec![0.0; pt.nrows()];
    pt.spmv(&w, &mut y);
    y.into_iter()
        .enumerate()
        .filter(|&(r, val)| val != 0.0 || r == c)
        .map(|(r, val)| (r, c, val))
        .collect()
}

fn galerkin_explicit(a: &CsrMatrix<f64>, pt: &CsrMatrix<f64>) -> CsrMatrix<f64> {
    let nc = pt.nrows();
    #[cfg(feature = "rayon")]
    let triplets: Vec<(usize, usize, f64)> = (0..nc)
        .into_par_iter()
        .flat_map_iter(|c| galerkin_column(a, pt, c))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let triplets: Vec<(usize, usize, f64)> = (0..nc).flat_map(|c| galerkin_column(a, pt, c)).collect();
    CsrMatrix::from_triplets(nc, nc, triplets)
}

/// CSR from per-row lists already sorted by column.
fn assemble(nrows: usize, ncols: usize, rows: Vec<Vec<(usize, f64)>>) -> CsrMatrix<f64> {
    let mut row_ptr = Vec::with_capacity(nrows + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();
    row_ptr.push(0);
    for row in rows {
        for (j, v) in row {
            col_idx.push(j);
            values.push(v);
        }
        row_ptr.push(col_idx.len());
    }
    CsrMatrix::from_csr(nrows, ncols, row_ptr, col_idx, values)
}
