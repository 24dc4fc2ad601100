//! Coordinate-list (COO) sparse matrix.
//!
//! A [`CooMatrix`] is parallel `rows`/`cols`/`data` arrays with no
//! ordering guarantee. Duplicate entries at the same `(i, j)` are
//! allowed and are summed under conversion and under [`CooMatrix::at`] —
//! this is what makes COO convenient for matrix *construction*: callers
//! can push contributions to a position as they discover them, in
//! whatever order, and let conversion to CSR/CSC coalesce the result.

use nalgebra::{ClosedAdd, DMatrix, Dim, Matrix, RawStorage, Scalar};
use num_traits::Zero;

/// A coordinate-list sparse matrix: parallel arrays of row index, column
/// index, and value, in unspecified order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooMatrix {
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    data: Vec<f64>,
}

impl CooMatrix {
    /// Creates an empty COO matrix of the given shape.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            rows: Vec::new(),
            cols: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Builds a COO matrix from pre-existing triplet arrays.
    ///
    /// # Errors
    ///
    /// Fails if the three arrays do not have equal length, or if any
    /// coordinate is out of bounds for `(nrows, ncols)`.
    pub fn try_from_triplets(
        nrows: usize,
        ncols: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, String> {
        if rows.len() != cols.len() || rows.len() != data.len() {
            return Err("row, column and value arrays must have equal length".into());
        }
        if rows.iter().any(|&r| r >= nrows) || cols.iter().any(|&c| c >= ncols) {
            return Err("triplet coordinate out of bounds".into());
        }
        Ok(Self {
            nrows,
            ncols,
            rows,
            cols,
            data,
        })
    }

    /// The matrix shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored triples. May exceed the number of distinct
    /// non-zero positions if duplicates were pushed.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Appends a single `(i, j, v)` triple.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows` or `j >= ncols`.
    pub fn push(&mut self, i: usize, j: usize, v: f64) {
        assert!(i < self.nrows, "row index {i} out of range");
        assert!(j < self.ncols, "column index {j} out of range");
        self.rows.push(i);
        self.cols.push(j);
        self.data.push(v);
    }

    /// Appends every non-zero entry of a dense matrix, offset by
    /// `(row_offset, col_offset)`.
    pub fn push_matrix<R, C, S>(
        &mut self,
        row_offset: usize,
        col_offset: usize,
        dense: &Matrix<f64, R, C, S>,
    ) where
        R: Dim,
        C: Dim,
        S: RawStorage<f64, R, C>,
    {
        for i in 0..dense.nrows() {
            for j in 0..dense.ncols() {
                let v = *dense.index((i, j));
                if v != 0.0 {
                    self.push(row_offset + i, col_offset + j, v);
                }
            }
        }
    }

    /// The value at `(i, j)`: the sum of every stored triple at that
    /// coordinate, or `0.0` if none is stored.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.triplet_iter()
            .filter(|&(r, c, _)| r == i && c == j)
            .map(|(_, _, v)| v)
            .sum()
    }

    /// Iterates over stored `(row, col, value)` triples in storage order.
    pub fn triplet_iter(&self) -> impl Iterator<Item = (usize, usize, &f64)> {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.data)
            .map(|((&r, &c), v)| (r, c, v))
    }

    /// Consumes the matrix, returning its raw `(rows, cols, data)` arrays.
    pub fn disassemble(self) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        (self.rows, self.cols, self.data)
    }

    /// A fresh COO matrix with rows and columns swapped, sharing no
    /// storage with `self`.
    pub fn transpose(&self) -> CooMatrix {
        CooMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            rows: self.cols.clone(),
            cols: self.rows.clone(),
            data: self.data.clone(),
        }
    }

    /// Applies a row permutation in place: row `i` becomes row `perm[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `perm` is not a bijection on `[0, nrows)`.
    pub fn permute_rows(&mut self, perm: &[usize]) {
        assert_eq!(perm.len(), self.nrows, "permutation length must equal nrows");
        assert!(is_bijection(perm), "permutation must be a bijection");
        for r in &mut self.rows {
            *r = perm[*r];
        }
    }

    /// Applies a column permutation in place: column `j` becomes column
    /// `perm[j]`.
    ///
    /// # Panics
    ///
    /// Panics if `perm` is not a bijection on `[0, ncols)`.
    pub fn permute_cols(&mut self, perm: &[usize]) {
        assert_eq!(perm.len(), self.ncols, "permutation length must equal ncols");
        assert!(is_bijection(perm), "permutation must be a bijection");
        for c in &mut self.cols {
            *c = perm[*c];
        }
    }

    /// Computes `dst <- dst + A * x` (or `dst <- dst + Aᵀ * x` when
    /// `trans`), by iterating the triples and scattering `v * x[j]` (or
    /// `v * x[i]`) into `dst`.
    pub fn mul_vec_to(&self, dst: &mut [f64], trans: bool, x: &[f64]) {
        if !trans {
            assert_eq!(dst.len(), self.nrows);
            assert_eq!(x.len(), self.ncols);
            for (i, j, &v) in self.triplet_iter() {
                dst[i] += v * x[j];
            }
        } else {
            assert_eq!(dst.len(), self.ncols);
            assert_eq!(x.len(), self.nrows);
            for (i, j, &v) in self.triplet_iter() {
                dst[j] += v * x[i];
            }
        }
    }

    /// A dense rendering of this matrix, summing duplicates.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut out = DMatrix::<f64>::zeros(self.nrows, self.ncols);
        for (i, j, &v) in self.triplet_iter() {
            out[(i, j)] += v;
        }
        out
    }
}

fn is_bijection(perm: &[usize]) -> bool {
    let n = perm.len();
    let mut seen = vec![false; n];
    for &p in perm {
        if p >= n || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Converts a dense matrix to [`CooMatrix`], keeping only non-zero entries.
pub fn convert_dense_coo<R, C, S>(dense: &Matrix<f64, R, C, S>) -> CooMatrix
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    let mut coo = CooMatrix::new(dense.nrows(), dense.ncols());
    for (index, v) in dense.iter().enumerate() {
        if *v != f64::zero() {
            let i = index % dense.nrows();
            let j = index / dense.nrows();
            coo.push(i, j, *v);
        }
    }
    coo
}

/// Converts a [`CooMatrix`] to a dense matrix, summing duplicates.
pub fn convert_coo_dense(coo: &CooMatrix) -> DMatrix<f64>
where
    f64: Scalar + Zero + ClosedAdd,
{
    coo.to_dense()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_triples_sum_under_at() {
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, 1.0);
        coo.push(0, 0, 2.0);
        assert_eq!(coo.at(0, 0), 3.0);
        assert_eq!(coo.nnz(), 2);
    }

    #[test]
    fn transpose_swaps_rows_and_cols() {
        let mut coo = CooMatrix::new(2, 3);
        coo.push(0, 2, 5.0);
        let t = coo.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.at(2, 0), 5.0);
    }

    #[test]
    fn permute_rows_rejects_non_bijection() {
        let mut coo = CooMatrix::new(3, 3);
        coo.push(0, 0, 1.0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            coo.permute_rows(&[0, 0, 1]);
        }));
        assert!(result.is_err());
    }
}
