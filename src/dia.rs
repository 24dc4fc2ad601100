//! Diagonal (DIA) matrix: a matrix whose only non-zero entries, if any,
//! lie on the main diagonal.
//!
//! Storage is just the diagonal itself, so DIA is by far the cheapest
//! format both to hold and to multiply against — [`crate::ops::serial::spmul`]
//! special-cases `DIA * _` and `_ * DIA` as a row/column scale rather
//! than falling through to a general sparse product.

use nalgebra::DMatrix;

/// A diagonal matrix: `(rows, cols)` plus a diagonal of length at most
/// `min(rows, cols)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiaMatrix {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
}

impl DiaMatrix {
    /// Builds a diagonal matrix from its diagonal entries.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() > min(nrows, ncols)`.
    pub fn new(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert!(
            data.len() <= nrows.min(ncols),
            "diagonal length {} exceeds min(rows, cols) = {}",
            data.len(),
            nrows.min(ncols)
        );
        Self { nrows, ncols, data }
    }

    /// An identity matrix of size `n`.
    pub fn identity(n: usize) -> Self {
        Self::new(n, n, vec![1.0; n])
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

    /// The diagonal entries, top-left to bottom-right.
    pub fn diagonal(&self) -> &[f64] {
        &self.data
    }

    /// Number of explicitly stored diagonal entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// `data[i]` when `i == j` and `i < len(data)`, else `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows` or `j >= ncols`.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.nrows && j < self.ncols, "index ({i}, {j}) out of range");
        if i == j {
            self.data.get(i).copied().unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Calls `f(i, i, value)` for every stored diagonal entry.
    pub fn do_non_zero(&self, mut f: impl FnMut(usize, usize, f64)) {
        for (i, &v) in self.data.iter().enumerate() {
            f(i, i, v);
        }
    }

    /// A fresh header sharing no storage with `self`, with `(rows, cols)`
    /// swapped — the diagonal entries themselves are identical under
    /// transpose.
    pub fn transpose(&self) -> DiaMatrix {
        DiaMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            data: self.data.clone(),
        }
    }

    /// A dense rendering of this matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut out = DMatrix::<f64>::zeros(self.nrows, self.ncols);
        for (i, &v) in self.data.iter().enumerate() {
            out[(i, i)] = v;
        }
        out
    }

    /// The trace: the sum of the diagonal entries (`Σ M[i,i]`).
    pub fn trace(&self) -> f64 {
        self.data.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_reads_diagonal_only() {
        let d = DiaMatrix::new(3, 4, vec![1.0, 2.0]);
        assert_eq!(d.at(0, 0), 1.0);
        assert_eq!(d.at(1, 1), 2.0);
        assert_eq!(d.at(2, 2), 0.0);
        assert_eq!(d.at(0, 1), 0.0);
    }

    #[test]
    fn trace_sums_diagonal() {
        let d = DiaMatrix::new(3, 3, vec![1.0, 2.0, 3.0]);
        assert_eq!(d.trace(), 6.0);
    }
}
