// SparseMatrix trait and the CSR implementation used by every AMG level.

use crate::core::traits::{Indexing, MatVec};
use crate::error::AmgError;
use faer::Mat;
use num_traits::Float;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Compressed sparse row storage.
///
/// Column indices are sorted within every row; both constructors enforce it.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    ///
    /// Rows whose column indices are out of order are sorted in place.
    ///
    /// # Panics
    /// Panics if the arrays are inconsistent with the shape.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        mut col_idx: Vec<usize>,
        mut values: Vec<T>,
    ) -> Self {
        assert_eq!(row_ptr.len(), nrows + 1, "row_ptr must have nrows + 1 entries");
        assert_eq!(col_idx.len(), values.len(), "col_idx and values differ in length");
        assert_eq!(row_ptr[nrows], values.len(), "row_ptr[nrows] must equal nnz");
        assert!(
            row_ptr.windows(2).all(|w| w[0] <= w[1]),
            "row_ptr must be non-decreasing"
        );
        assert!(col_idx.iter().all(|&j| j < ncols), "column index out of range");
        for i in 0..nrows {
            let range = row_ptr[i]..row_ptr[i + 1];
            if !col_idx[range.clone()].windows(2).all(|w| w[0] <= w[1]) {
                let mut entries: Vec<(usize, T)> = col_idx[range.clone()]
                    .iter()
                    .copied()
                    .zip(values[range.clone()].iter().copied())
                    .collect();
                entries.sort_by_key(|&(j, _)| j);
                for (k, (j, v)) in range.zip(entries) {
                    col_idx[k] = j;
                    values[k] = v;
                }
            }
        }
        Self { nrows, ncols, row_ptr, col_idx, values }
    }

    /// Assemble from (row, col, value) triplets. Duplicate entries are summed.
    pub fn from_triplets(nrows: usize, ncols: usize, mut triplets: Vec<(usize, usize, T)>) -> Self {
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        let mut row_ptr = vec![0; nrows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;
        for (i, j, v) in triplets {
            assert!(i < nrows && j < ncols, "triplet ({i}, {j}) out of range");
            if last == Some((i, j)) {
                if let Some(acc) = values.last_mut() {
                    *acc = *acc + v;
                }
                continue;
            }
            col_idx.push(j);
            values.push(v);
            row_ptr[i + 1] += 1;
            last = Some((i, j));
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        Self { nrows, ncols, row_ptr, col_idx, values }
    }

    /// Materialize a dense faer matrix.
    pub fn from_dense(a: &Mat<T>) -> Self {
        let mut row_ptr = Vec::with_capacity(a.nrows() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                let v = a[(i, j)];
                if v != T::zero() {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self { nrows: a.nrows(), ncols: a.ncols(), row_ptr, col_idx, values }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }
    pub fn ncols(&self) -> usize {
        self.ncols
    }
    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over the (column, value) pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Stored value at (i, j), zero when absent.
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        match self.col_idx[range.clone()].binary_search(&j) {
            Ok(k) => self.values[range.start + k],
            Err(_) => T::zero(),
        }
    }

    /// Position of each row's diagonal entry within `col_idx`/`values`.
    ///
    /// Uses a binary search over the sorted column range of every row.
    pub fn find_diagonal(&self) -> Result<Vec<usize>, AmgError> {
        if self.nrows != self.ncols {
            return Err(AmgError::NotSquare { nrows: self.nrows, ncols: self.ncols });
        }
        (0..self.nrows)
            .map(|i| {
                let start = self.row_ptr[i];
                self.col_idx[start..self.row_ptr[i + 1]]
                    .binary_search(&i)
                    .map(|k| start + k)
                    .map_err(|_| AmgError::MissingDiagonal { row: i })
            })
            .collect()
    }

    /// Explicit transpose, again in CSR.
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0; self.ncols + 1];
        for &j in &self.col_idx {
            row_ptr[j + 1] += 1;
        }
        for j in 0..self.ncols {
            row_ptr[j + 1] += row_ptr[j];
        }
        let mut next = row_ptr.clone();
        let mut col_idx = vec![0; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        // Rows are visited in order, so the transposed rows come out sorted.
        for i in 0..self.nrows {
            for (j, v) in self.row(i) {
                let k = next[j];
                col_idx[k] = i;
                values[k] = v;
                next[j] += 1;
            }
        }
        Self { nrows: self.ncols, ncols: self.nrows, row_ptr, col_idx, values }
    }

    pub fn to_dense(&self) -> Mat<T> {
        let mut dense = Mat::from_fn(self.nrows, self.ncols, |_, _| T::zero());
        for i in 0..self.nrows {
            for (j, v) in self.row(i) {
                dense[(i, j)] = dense[(i, j)] + v;
            }
        }
        dense
    }

    /// Dot product of row `i` with `x`.
    pub fn row_dot(&self, i: usize, x: &[T]) -> T {
        self.row(i).fold(T::zero(), |acc, (j, v)| acc + v * x[j])
    }
}

#[cfg(feature = "rayon")]
impl<T: Float + Send + Sync> CsrMatrix<T> {
    /// Residual r = b - A x, computed row by row in parallel.
    pub fn residual(&self, b: &[T], x: &[T], r: &mut [T]) {
        assert_eq!(b.len(), self.nrows);
        assert_eq!(x.len(), self.ncols);
        assert_eq!(r.len(), self.nrows);
        r.par_iter_mut()
            .enumerate()
            .for_each(|(i, ri)| *ri = b[i] - self.row_dot(i, x));
    }
}

#[cfg(not(feature = "rayon"))]
impl<T: Float> CsrMatrix<T> {
    /// Residual r = b - A x.
    pub fn residual(&self, b: &[T], x: &[T], r: &mut [T]) {
        assert_eq!(b.len(), self.nrows);
        assert_eq!(x.len(), self.ncols);
        assert_eq!(r.len(), self.nrows);
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = b[i] - self.row_dot(i, x);
        }
    }
}

impl<T: Float + Send + Sync> SparseMatrix<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        #[cfg(feature = "rayon")]
        y.par_iter_mut()
            .enumerate()
            .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        #[cfg(not(feature = "rayon"))]
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row_dot(i, x);
        }
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

impl<T> Indexing for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
}
