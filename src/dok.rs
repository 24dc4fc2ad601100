//! Dictionary-of-keys (DOK) sparse matrix.
//!
//! [`DokMatrix`] is the friendliest format for incremental construction
//! by random access: `set(i, j, v)` just replaces a map entry. It is a
//! poor format for arithmetic, so the usual pattern is to build a matrix
//! in DOK, then convert to CSR/CSC once construction is finished.
//!
//! `set(i, j, 0.0)` on a key that has never been written is a no-op
//! rather than inserting an explicit zero (see `DESIGN.md` for why this
//! revision of the behavior, rather than the alternative, was chosen).

use std::collections::BTreeMap;

use crate::coo::CooMatrix;

/// A sparse matrix represented as a map from `(row, col)` to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DokMatrix {
    nrows: usize,
    ncols: usize,
    entries: BTreeMap<(usize, usize), f64>,
}

impl DokMatrix {
    /// Creates an empty DOK matrix of the given shape.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: BTreeMap::new(),
        }
    }

    /// The matrix shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// The value at `(i, j)`, or `0.0` if unset.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows` or `j >= ncols`.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.nrows && j < self.ncols, "index ({i}, {j}) out of range");
        self.entries.get(&(i, j)).copied().unwrap_or(0.0)
    }

    /// Sets the value at `(i, j)`.
    ///
    /// Replaces any existing entry at that key, including with `0.0`. If
    /// no entry exists yet, setting `0.0` is a no-op — it does not insert
    /// an explicit zero.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows` or `j >= ncols`.
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        assert!(i < self.nrows && j < self.ncols, "index ({i}, {j}) out of range");
        if self.entries.contains_key(&(i, j)) {
            if v == 0.0 {
                self.entries.remove(&(i, j));
            } else {
                self.entries.insert((i, j), v);
            }
        } else if v != 0.0 {
            self.entries.insert((i, j), v);
        }
    }

    /// Calls `f(i, j, v)` for every stored entry, in row-major key order
    /// (a `BTreeMap` over `(row, col)` orders lexicographically, so this
    /// also happens to be deterministic across runs).
    pub fn do_non_zero(&self, mut f: impl FnMut(usize, usize, f64)) {
        for (&(i, j), &v) in &self.entries {
            f(i, j, v);
        }
    }

    /// Converts to a [`CooMatrix`], enumerating the map in key order.
    pub fn to_coo(&self) -> CooMatrix {
        let mut coo = CooMatrix::new(self.nrows, self.ncols);
        for (&(i, j), &v) in &self.entries {
            coo.push(i, j, v);
        }
        coo
    }

    /// A dense rendering of this matrix.
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut out = nalgebra::DMatrix::<f64>::zeros(self.nrows, self.ncols);
        for (&(i, j), &v) in &self.entries {
            out[(i, j)] = v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_zero_on_missing_key_is_noop() {
        let mut m = DokMatrix::new(2, 2);
        m.set(0, 0, 0.0);
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn set_zero_on_existing_key_removes_it() {
        let mut m = DokMatrix::new(2, 2);
        m.set(0, 0, 5.0);
        m.set(0, 0, 0.0);
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.at(0, 0), 0.0);
    }

    #[test]
    fn dok_to_csr_dense_rendering() {
        // 11x11 DOK from the map in the spec's end-to-end scenario
        let mut m = DokMatrix::new(11, 11);
        let pairs = [
            (0usize, 3usize, 1.0),
            (1, 1, 2.0),
            (2, 2, 3.0),
            (5, 8, 4.0),
            (10, 10, 5.0),
            (1, 5, 6.0),
            (3, 5, 7.0),
        ];
        for &(i, j, v) in &pairs {
            m.set(i, j, v);
        }
        let dense = m.to_dense();
        for i in 0..11 {
            for j in 0..11 {
                let expected = pairs
                    .iter()
                    .find(|&&(pi, pj, _)| pi == i && pj == j)
                    .map(|&(_, _, v)| v)
                    .unwrap_or(0.0);
                assert_eq!(dense[(i, j)], expected, "mismatch at ({i}, {j})");
            }
        }
    }
}
