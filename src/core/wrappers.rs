//! Trait implementations for `Vec<T>` and `faer::Mat`.
//!
//! These let plain vectors and dense faer matrices flow through the generic
//! solver and preconditioner code alongside [`CsrMatrix`](crate::matrix::sparse::CsrMatrix).
//! Inner products use Rayon parallel iterators when the `rayon` feature is enabled.

use crate::core::traits::{Axpy, Indexing, InnerProduct, MatVec};
use faer::Mat;
use num_traits::Float;

/// Dense matrix-vector multiplication for `faer::Mat`, mostly used as a reference.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

/// Inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    fn norm(&self, x: &Vec<T>) -> T {
        self.dot(x, x).sqrt()
    }
}

impl<T: Float + Send + Sync> Axpy<T> for Vec<T> {
    fn axpy(&mut self, a: T, x: &Self) {
        assert_eq!(self.len(), x.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.par_iter_mut()
                .zip(x.par_iter())
                .for_each(|(yi, &xi)| *yi = *yi + a * xi);
        }
        #[cfg(not(feature = "rayon"))]
        for (yi, &xi) in self.iter_mut().zip(x.iter()) {
            *yi = *yi + a * xi;
        }
    }
}

impl<T> Indexing for Vec<T> {
    fn nrows(&self) -> usize {
        self.len()
    }
}

impl<T> Indexing for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dot_norm_axpy() {
        let ip = ();
        let x = vec![3.0, 4.0];
        let mut y = vec![1.0, 1.0];
        assert_relative_eq!(ip.dot(&x, &y), 7.0);
        assert_relative_eq!(ip.norm(&x), 5.0);
        y.axpy(2.0, &x);
        assert_eq!(y, vec![7.0, 9.0]);
    }

    #[test]
    fn dense_matvec() {
        let a = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        let x = vec![1.0, 1.0, 1.0];
        let mut y = vec![0.0; 2];
        a.matvec(&x, &mut y);
        assert_eq!(y, vec![3.0, 12.0]);
    }
}
