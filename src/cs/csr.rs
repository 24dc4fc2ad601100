//! Compressed Sparse Row (CSR): row-major compressed storage.
//!
//! Fast row access and row-wise iteration; column access walks every row.
//! The usual receiver type for sparse matrix-vector and matrix-matrix
//! products (see [`crate::ops::serial::spmul`]).

use super::{CompressedRowStorage, CsMatrix, LaneView};

/// A compressed-sparse-row matrix, generic over owned (`Vec<_>`) or
/// borrowed (`&[_]`) backing storage.
pub type CsrMatrix<MO = Vec<usize>, MI = Vec<usize>, D = Vec<f64>> =
    CsMatrix<MO, MI, D, CompressedRowStorage>;

impl CsrMatrix {
    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let offsets = (0..=n).collect();
        let indices = (0..n).collect();
        let data = vec![1.0; n];
        unsafe { CsMatrix::from_parts_unchecked(n, n, offsets, indices, data) }
    }

    /// A row-major view of row `i`, sharing storage with `self`.
    pub fn row(&self, i: usize) -> LaneView<'_> {
        self.major_lane_view(i)
    }

    /// Calls `f(row, col, value)` for every stored entry of row `i`.
    pub fn do_row_non_zero(&self, i: usize, f: impl FnMut(usize, usize, f64)) {
        self.do_major_non_zero(i, f);
    }

    /// A dense copy of row `i`.
    pub fn raw_row_view(&self, i: usize) -> Vec<f64> {
        self.raw_major_view(i)
    }

    /// A dense copy of column `j`, built by probing every row with
    /// [`CsMatrix::at`]; unlike [`CsrMatrix::row`], this cannot be a
    /// zero-copy view because CSR does not store data column-contiguously.
    pub fn raw_col_view(&self, j: usize) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.at(i, j)).collect()
    }
}

/// Trait alias bound used by the arithmetic driver to accept any CSR
/// matrix regardless of storage ownership.
pub trait AnyCsr {
    /// The matrix shape.
    fn shape(&self) -> (usize, usize);
    /// Number of stored entries.
    fn nnz(&self) -> usize;
    /// Row offsets (`indptr`).
    fn row_offsets(&self) -> &[usize];
    /// Column indices, concatenated across rows.
    fn col_indices(&self) -> &[usize];
    /// Stored values, concatenated across rows.
    fn values(&self) -> &[f64];
}

impl<MO, MI, D> AnyCsr for CsMatrix<MO, MI, D, CompressedRowStorage>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    fn shape(&self) -> (usize, usize) {
        CsMatrix::shape(self)
    }

    fn nnz(&self) -> usize {
        CsMatrix::nnz(self)
    }

    fn row_offsets(&self) -> &[usize] {
        self.major_offsets()
    }

    fn col_indices(&self) -> &[usize] {
        self.minor_indices()
    }

    fn values(&self) -> &[f64] {
        CsMatrix::values(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_diagonal_ones() {
        let m = CsrMatrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.at(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn row_view_shares_storage() {
        let m =
            CsrMatrix::try_from_parts(2, 3, vec![0, 2, 2], vec![0, 2], vec![1.0, 2.0]).unwrap();
        let row = m.row(0);
        assert_eq!(row.to_dense(), vec![1.0, 0.0, 2.0]);
    }
}
