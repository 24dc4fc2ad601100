//! Compressed Sparse Column (CSC): column-major compressed storage.
//!
//! Fast column access; row access walks every column. Useful as a
//! right-hand operand in `CSR * CSC` row-by-column products (see
//! [`crate::ops::serial::spmul`]) and as the lazily-built mirror used by
//! [`crate::factorization::cholesky`]'s back-substitution.

use super::{CompressedColumnStorage, CsMatrix, LaneView};

/// A compressed-sparse-column matrix, generic over owned (`Vec<_>`) or
/// borrowed (`&[_]`) backing storage.
pub type CscMatrix<MO = Vec<usize>, MI = Vec<usize>, D = Vec<f64>> =
    CsMatrix<MO, MI, D, CompressedColumnStorage>;

impl CscMatrix {
    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let offsets = (0..=n).collect();
        let indices = (0..n).collect();
        let data = vec![1.0; n];
        unsafe { CsMatrix::from_parts_unchecked(n, n, offsets, indices, data) }
    }
}

impl<MO, MI, D> CsMatrix<MO, MI, D, CompressedColumnStorage>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    /// A column-major view of column `j` (native axis for CSC), sharing
    /// storage with `self`.
    pub fn col(&self, j: usize) -> LaneView<'_> {
        self.major_lane_view(j)
    }

    /// Calls `f(row, col, value)` for every stored entry of column `j`.
    pub fn do_col_non_zero(&self, j: usize, f: impl FnMut(usize, usize, f64)) {
        self.do_major_non_zero(j, f);
    }

    /// A dense copy of column `j`.
    pub fn raw_col_view(&self, j: usize) -> Vec<f64> {
        self.raw_major_view(j)
    }

    /// A dense copy of row `i`, built by probing every column.
    pub fn raw_row_view(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.at(i, j)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_diagonal_ones() {
        let m = CscMatrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.at(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn col_view_shares_storage() {
        let m =
            CscMatrix::try_from_parts(3, 2, vec![0, 2, 2], vec![0, 2], vec![1.0, 2.0]).unwrap();
        let col = m.col(0);
        assert_eq!(col.to_dense(), vec![1.0, 0.0, 2.0]);
    }
}
