//! Sparse Cholesky factorization: `A = L * Lᵀ` for a symmetric
//! positive-definite `A`, via the dot-product variant that builds `L`
//! row by row, each row needing only a sparse dot product against the
//! rows already computed.
//!
//! [`CholeskyFactor`] stores `L` as CSR (the natural layout for the
//! row-by-row build) and lazily builds a CSC mirror the first time
//! [`CholeskyFactor::solve`] needs to walk `L` by column for the
//! back-substitution half of the solve — building it eagerly would
//! waste the conversion for callers who only ever call `solve` once, or
//! not at all.

use std::cell::OnceCell;

use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::CsMatrix;
use crate::error::{OperationError, OperationErrorKind};

/// A Cholesky factorization `A = L * Lᵀ`, holding the lower-triangular
/// factor `L`.
pub struct CholeskyFactor {
    l: CsrMatrix,
    csc_mirror: OnceCell<CscMatrix>,
}

impl CholeskyFactor {
    /// Factors a symmetric positive-definite matrix, reading only its
    /// lower triangle (the upper triangle is assumed to mirror it and is
    /// never read).
    ///
    /// # Errors
    ///
    /// Returns an [`OperationError`] with kind
    /// [`OperationErrorKind::NonPositiveDefinite`] if a diagonal pivot
    /// is non-positive or non-finite, which happens iff `a` is not
    /// actually positive-definite.
    ///
    /// # Panics
    ///
    /// Panics if `a` is not square.
    pub fn factor(a: &CsrMatrix) -> Result<Self, OperationError> {
        assert_eq!(a.nrows(), a.ncols(), "Cholesky factorization requires a square matrix");
        let n = a.nrows();
        let mut rows: Vec<(Vec<usize>, Vec<f64>)> = Vec::with_capacity(n);

        for i in 0..n {
            let mut row_idx = Vec::new();
            let mut row_val = Vec::new();
            for j in 0..=i {
                let aij = a.at(i, j);
                let (other_idx, other_val): (&[usize], &[f64]) =
                    if j == i { (&row_idx, &row_val) } else { (&rows[j].0, &rows[j].1) };
                let dot = sparse_merge_dot_below(&row_idx, &row_val, other_idx, other_val, j);
                let reduced = aij - dot;

                let v = if i == j {
                    if reduced <= 0.0 || !reduced.is_finite() {
                        return Err(OperationError::from_kind_and_message(
                            OperationErrorKind::NonPositiveDefinite,
                            format!("pivot at row {i} is non-positive or non-finite"),
                        ));
                    }
                    reduced.sqrt()
                } else {
                    let l_jj = *row_val_of(&rows, j, j)
                        .expect("diagonal of an already-factored row must be present");
                    reduced / l_jj
                };

                if v != 0.0 {
                    row_idx.push(j);
                    row_val.push(v);
                }
            }
            rows.push((row_idx, row_val));
        }

        let mut offsets = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        offsets.push(0);
        for (idx, val) in rows {
            indices.extend(idx);
            data.extend(val);
            offsets.push(indices.len());
        }

        let l = unsafe { CsMatrix::from_parts_unchecked(n, n, offsets, indices, data) };
        Ok(Self { l, csc_mirror: OnceCell::new() })
    }

    /// The lower-triangular factor `L`, in CSR layout.
    pub fn l(&self) -> &CsrMatrix {
        &self.l
    }

    fn csc(&self) -> &CscMatrix {
        self.csc_mirror.get_or_init(|| crate::convert::serial::convert_csr_csc(&self.l))
    }

    /// Solves `A x = b` given the factorization `A = L Lᵀ`, by forward
    /// substitution (`L y = b`) followed by back substitution
    /// (`Lᵀ x = y`, walking `L`'s CSC mirror).
    ///
    /// # Errors
    ///
    /// Returns an [`OperationError`] with kind
    /// [`OperationErrorKind::NonPositiveDefinite`] if a zero pivot is
    /// encountered during either substitution (should not happen for a
    /// factor produced by [`CholeskyFactor::factor`]).
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, OperationError> {
        let y = self.forward_substitute(b)?;
        self.back_substitute(&y)
    }

    fn forward_substitute(&self, b: &[f64]) -> Result<Vec<f64>, OperationError> {
        let n = self.l.nrows();
        assert_eq!(b.len(), n, "right-hand side length must match factor size");
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = b[i];
            let mut diag = 0.0;
            self.l.do_row_non_zero(i, |_, j, v| {
                if j < i {
                    sum -= v * y[j];
                } else if j == i {
                    diag = v;
                }
            });
            if diag == 0.0 {
                return Err(OperationError::from_kind_and_message(
                    OperationErrorKind::NonPositiveDefinite,
                    format!("zero pivot at row {i} during forward substitution"),
                ));
            }
            y[i] = sum / diag;
        }
        Ok(y)
    }

    fn back_substitute(&self, y: &[f64]) -> Result<Vec<f64>, OperationError> {
        let n = self.l.nrows();
        let mut x = vec![0.0; n];
        let csc = self.csc();
        for i in (0..n).rev() {
            let mut sum = y[i];
            let mut diag = 0.0;
            let col = csc.col(i);
            for (&row, &v) in col.indices().iter().zip(col.values()) {
                if row > i {
                    sum -= v * x[row];
                } else if row == i {
                    diag = v;
                }
            }
            if diag == 0.0 {
                return Err(OperationError::from_kind_and_message(
                    OperationErrorKind::NonPositiveDefinite,
                    format!("zero pivot at row {i} during back substitution"),
                ));
            }
            x[i] = sum / diag;
        }
        Ok(x)
    }
}

fn row_val_of<'a>(rows: &'a [(Vec<usize>, Vec<f64>)], row: usize, col: usize) -> Option<&'a f64> {
    let (idx, val) = &rows[row];
    idx.binary_search(&col).ok().map(|k| &val[k])
}

fn sparse_merge_dot_below(
    ix1: &[usize],
    v1: &[f64],
    ix2: &[usize],
    v2: &[f64],
    limit: usize,
) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0;
    while i < ix1.len() && ix1[i] < limit && j < ix2.len() && ix2[j] < limit {
        match ix1[i].cmp(&ix2[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                acc += v1[i] * v2[j];
                i += 1;
                j += 1;
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_matches_hand_computed_small_spd() {
        // A = [[4, 2], [2, 3]], L = [[2, 0], [1, sqrt(2)]]
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 4], vec![0, 1, 0, 1], vec![4.0, 2.0, 2.0, 3.0])
            .unwrap();
        let chol = CholeskyFactor::factor(&a).unwrap();
        assert!((chol.l().at(0, 0) - 2.0).abs() < 1e-12);
        assert!((chol.l().at(1, 0) - 1.0).abs() < 1e-12);
        assert!((chol.l().at(1, 1) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn solve_recovers_known_solution() {
        // A = [[4, 2], [2, 3]], x = [1, 1] => b = [6, 5]
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 4], vec![0, 1, 0, 1], vec![4.0, 2.0, 2.0, 3.0])
            .unwrap();
        let chol = CholeskyFactor::factor(&a).unwrap();
        let x = chol.solve(&[6.0, 5.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn factor_rejects_non_positive_definite() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 4], vec![0, 1, 0, 1], vec![1.0, 2.0, 2.0, 1.0])
            .unwrap();
        let result = CholeskyFactor::factor(&a);
        assert!(result.is_err());
    }
}
