//! Sparse matrices and vectors for scientific computing, built on top of
//! [nalgebra](https://www.nalgebra.org) for the dense side of the API.
//!
//! ## Highlighted features
//!
//! - [DOK](dok::DokMatrix), [COO](coo::CooMatrix), [CSR](cs::CsrMatrix),
//!   [CSC](cs::CscMatrix) and [DIA](dia::DiaMatrix) formats, and
//!   [conversions](convert) between them.
//! - Sparse vectors ([`vector::SparseVector`]) and a reusable sparse
//!   accumulator for `O(nnz)` row/column merges.
//! - Arithmetic kernels in [`ops`]: elementwise add/sub, scalar
//!   multiplication, and sparse-sparse and sparse-dense products.
//! - Bit-packed [`binary`] vectors and matrices for boolean/Hamming-space
//!   workloads.
//! - Sparse [Cholesky factorization](factorization::cholesky) with
//!   triangular solves.
//! - A tagged-variant [`api`] facade for callers who want to dispatch
//!   over matrix format at runtime rather than pick a representation at
//!   compile time.
//! - Little-endian binary (de)serialization in [`io`].
//! - [proptest strategies](proptest) for generating matrices and vectors
//!   when the `proptest-support` feature is enabled.
//! - [matrixcompare support](https://crates.io/crates/matrixcompare) for
//!   comparing matrices of different formats in tests, when the
//!   `compare` feature is enabled.
//!
//! # Example: DOK -> CSR -> matrix-vector product
//!
//! ```
//! use sparsity::dok::DokMatrix;
//! use sparsity::convert::serial::convert_coo_csr;
//! use sparsity::api::{self, MatrixType};
//!
//! let mut dok = DokMatrix::new(3, 3);
//! dok.set(0, 0, 1.0);
//! dok.set(0, 2, 3.0);
//! dok.set(1, 0, 2.0);
//! dok.set(1, 2, 1.3);
//! dok.set(2, 2, 4.1);
//!
//! let csr = convert_coo_csr(dok.to_coo());
//!
//! let x = [1.3, -4.0, 3.5];
//! let y = api::mul_mat_vec(&MatrixType::Csr(csr), &x).unwrap();
//!
//! let expected = [11.8, 7.15, 14.35];
//! for (got, want) in y.iter().zip(&expected) {
//!     assert!((got - want).abs() < 1e-9);
//! }
//! ```
#![deny(
    nonstandard_style,
    unused,
    missing_docs,
    rust_2018_idioms,
    rust_2018_compatibility,
    missing_copy_implementations
)]

pub extern crate nalgebra as na;

pub mod api;
pub mod binary;
pub mod blas;
pub mod convert;
pub mod coo;
pub mod cs;
pub mod dia;
pub mod dok;
pub mod error;
pub mod factorization;
pub mod io;
pub mod ops;
mod pool;
pub mod vector;

#[cfg(feature = "proptest-support")]
pub mod proptest;

#[cfg(feature = "compare")]
mod matrixcompare;

pub use self::coo::CooMatrix;
pub use self::dok::DokMatrix;
