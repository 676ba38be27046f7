//! Matrix module: compressed sparse row storage.

pub mod sparse;
pub use sparse::{CsrMatrix, SparseMatrix};
