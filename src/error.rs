use thiserror::Error;

// Unified error type for kryst-amg

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmgError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("missing diagonal entry in row {row}")]
    MissingDiagonal { row: usize },
    #[error("zero pivot in row {0}")]
    ZeroPivot(usize),
    #[error("matrix too small for AMG ({rows} rows)")]
    MatrixTooSmall { rows: usize },
    #[error("matrix is not square ({nrows}x{ncols})")]
    NotSquare { nrows: usize, ncols: usize },
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("coarsest operator is singular")]
    SingularCoarse,
    #[error("preconditioner used before setup")]
    NotSetUp,
    #[error("indefinite matrix detected (p^T A p <= 0)")]
    IndefiniteMatrix,
}
