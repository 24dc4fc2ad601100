//! [`proptest`] strategies for generating sparse matrices and vectors,
//! enabled by the `proptest-support` feature.
//!
//! Each strategy generates a shape first, then fills in non-zero
//! positions up to a caller-supplied density, so that shrinking keeps
//! producing valid matrices rather than ones with out-of-bounds
//! coordinates.

use proptest::collection::{hash_set, vec};
use proptest::prelude::*;

use crate::coo::CooMatrix;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::dia::DiaMatrix;
use crate::vector::SparseVector;

/// Generates a `(nrows, ncols)` shape pair, each dimension in `1..=max_dim`.
pub fn shape(max_dim: usize) -> impl Strategy<Value = (usize, usize)> {
    (1..=max_dim, 1..=max_dim)
}

/// Generates a [`CooMatrix`] of the given shape with up to `max_nnz`
/// distinct, non-duplicate entries, each value drawn from `value_strategy`.
pub fn coo_matrix(
    nrows: usize,
    ncols: usize,
    max_nnz: usize,
    value_strategy: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = CooMatrix> {
    let max_nnz = max_nnz.min(nrows.saturating_mul(ncols));
    hash_set((0..nrows, 0..ncols), 0..=max_nnz).prop_flat_map(move |coords| {
        let coords: Vec<_> = coords.into_iter().collect();
        let n = coords.len();
        vec(value_strategy.clone(), n).prop_map(move |values| {
            let mut coo = CooMatrix::new(nrows, ncols);
            for (&(i, j), v) in coords.iter().zip(values) {
                coo.push(i, j, v);
            }
            coo
        })
    })
}

/// Generates a [`CooMatrix`] over a random shape, values in `-10.0..10.0`.
pub fn arbitrary_coo_matrix() -> impl Strategy<Value = CooMatrix> {
    shape(8).prop_flat_map(|(nrows, ncols)| coo_matrix(nrows, ncols, nrows * ncols, -10.0..10.0))
}

/// Generates a [`CsrMatrix`] by building a [`CooMatrix`] and converting.
pub fn csr_matrix(
    nrows: usize,
    ncols: usize,
    max_nnz: usize,
    value_strategy: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = CsrMatrix> {
    coo_matrix(nrows, ncols, max_nnz, value_strategy)
        .prop_map(crate::convert::serial::convert_coo_csr)
}

/// Generates a [`CscMatrix`] by building a [`CooMatrix`] and converting.
pub fn csc_matrix(
    nrows: usize,
    ncols: usize,
    max_nnz: usize,
    value_strategy: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = CscMatrix> {
    coo_matrix(nrows, ncols, max_nnz, value_strategy)
        .prop_map(crate::convert::serial::convert_coo_csc)
}

/// Generates a [`DiaMatrix`] of the given shape, with a diagonal no
/// longer than `min(nrows, ncols)`.
pub fn dia_matrix(
    nrows: usize,
    ncols: usize,
    value_strategy: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = DiaMatrix> {
    let max_len = nrows.min(ncols);
    (0..=max_len)
        .prop_flat_map(move |len| vec(value_strategy.clone(), len))
        .prop_map(move |data| DiaMatrix::new(nrows, ncols, data))
}

/// Generates a [`SparseVector`] of the given length with up to `max_nnz`
/// stored entries.
pub fn sparse_vector(
    len: usize,
    max_nnz: usize,
    value_strategy: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = SparseVector> {
    let max_nnz = max_nnz.min(len);
    hash_set(0..len.max(1), 0..=max_nnz).prop_flat_map(move |positions| {
        let mut positions: Vec<_> = positions.into_iter().collect();
        positions.sort_unstable();
        let n = positions.len();
        vec(value_strategy.clone().prop_filter("nonzero", |v| *v != 0.0), n).prop_map(move |values| {
            SparseVector::from_sorted_parts(len, positions.clone(), values)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;

    proptest! {
        #[test]
        fn generated_coo_matrices_have_requested_shape(coo in arbitrary_coo_matrix()) {
            let (r, c) = coo.shape();
            prop_assert!(r >= 1 && c >= 1);
        }

        #[test]
        fn generated_csr_matrices_round_trip_to_dense((nrows, ncols) in shape(6)) {
            let strat = csr_matrix(nrows, ncols, nrows * ncols, -5.0..5.0);
            let mut runner = proptest::test_runner::TestRunner::default();
            let csr = strat.new_tree(&mut runner).unwrap().current();
            prop_assert_eq!(csr.nrows(), nrows);
            prop_assert_eq!(csr.ncols(), ncols);
        }
    }
}
