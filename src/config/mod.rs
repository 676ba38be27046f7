//! Configuration for the preconditioner.

pub mod options;
pub use options::AmgOptions;
