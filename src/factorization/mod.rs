//! Sparse matrix factorizations.

pub mod cholesky;
