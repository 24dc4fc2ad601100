//! Sparse-matrix subtraction.
//!
//! Subtraction performance depends on the storage layouts of the two
//! operands: `spsub_csr_csr` and `spsub_csc_csc` are the fastest, since
//! both sides walk in the same major order. Mixing CSR and CSC is
//! slightly slower, since the secondary matrix must be walked along its
//! minor lanes to line up with the primary's major order.

use crate::convert::utils::CountToOffsetIter;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::{CompressedColumnStorage, CompressedRowStorage, CsMatrix};
use crate::error::{OperationError, OperationErrorKind};
use nalgebra::DMatrix;
use std::borrow::Borrow;
use std::cmp::Ordering;

fn shape_mismatch(lhs: (usize, usize), rhs: (usize, usize)) -> Result<(), OperationError> {
    if lhs != rhs {
        Err(OperationError::from_kind_and_message(
            OperationErrorKind::InvalidPattern,
            format!("matrix shapes {lhs:?} and {rhs:?} do not match"),
        ))
    } else {
        Ok(())
    }
}

/// `lhs - rhs` for two CSR matrices, returning a CSR result.
pub fn spsub_csr_csr<MO1, MI1, D1, MO2, MI2, D2>(
    lhs: &CsMatrix<MO1, MI1, D1, CompressedRowStorage>,
    rhs: &CsMatrix<MO2, MI2, D2, CompressedRowStorage>,
) -> Result<CsrMatrix, OperationError>
where
    MO1: Borrow<[usize]>,
    MI1: Borrow<[usize]>,
    D1: Borrow<[f64]>,
    MO2: Borrow<[usize]>,
    MI2: Borrow<[usize]>,
    D2: Borrow<[f64]>,
{
    shape_mismatch(lhs.shape(), rhs.shape())?;
    let (nrows, ncols) = lhs.shape();
    let mut left_iter = lhs.triplet_iter().map(|(i, j, v)| (i, j, *v));
    let mut right_iter = rhs.triplet_iter().map(|(i, j, v)| (i, j, *v));
    let left_val = left_iter.next();
    let right_val = right_iter.next();

    let merged = TripletSubtractionIter { left_val, right_val, left_iter, right_iter };
    let mut counts = vec![0usize; nrows];
    let mut indices = Vec::with_capacity(lhs.nnz() + rhs.nnz());
    let mut data = Vec::with_capacity(lhs.nnz() + rhs.nnz());
    for (i, j, v) in merged {
        counts[i] += 1;
        indices.push(j);
        data.push(v);
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) })
}

/// `lhs - rhs` for two CSC matrices, returning a CSC result.
pub fn spsub_csc_csc<MO1, MI1, D1, MO2, MI2, D2>(
    lhs: &CsMatrix<MO1, MI1, D1, CompressedColumnStorage>,
    rhs: &CsMatrix<MO2, MI2, D2, CompressedColumnStorage>,
) -> Result<CscMatrix, OperationError>
where
    MO1: Borrow<[usize]>,
    MI1: Borrow<[usize]>,
    D1: Borrow<[f64]>,
    MO2: Borrow<[usize]>,
    MI2: Borrow<[usize]>,
    D2: Borrow<[f64]>,
{
    shape_mismatch(lhs.shape(), rhs.shape())?;
    let (nrows, ncols) = lhs.shape();
    let mut left_iter = lhs.triplet_iter().map(|(i, j, v)| (j, i, *v));
    let mut right_iter = rhs.triplet_iter().map(|(i, j, v)| (j, i, *v));
    let left_val = left_iter.next();
    let right_val = right_iter.next();

    let merged = TripletSubtractionIter { left_val, right_val, left_iter, right_iter };
    let mut counts = vec![0usize; ncols];
    let mut indices = Vec::with_capacity(lhs.nnz() + rhs.nnz());
    let mut data = Vec::with_capacity(lhs.nnz() + rhs.nnz());
    for (j, i, v) in merged {
        counts[j] += 1;
        indices.push(i);
        data.push(v);
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) })
}

/// `csr - csc`, returning a CSR result.
pub fn spsub_csr_csc<MO1, MI1, D1, MO2, MI2, D2>(
    csr: &CsMatrix<MO1, MI1, D1, CompressedRowStorage>,
    csc: &CsMatrix<MO2, MI2, D2, CompressedColumnStorage>,
) -> Result<CsrMatrix, OperationError>
where
    MO1: Borrow<[usize]>,
    MI1: Borrow<[usize]>,
    D1: Borrow<[f64]>,
    MO2: Borrow<[usize]>,
    MI2: Borrow<[usize]>,
    D2: Borrow<[f64]>,
{
    shape_mismatch(csr.shape(), csc.shape())?;
    let (nrows, ncols) = csr.shape();
    let mut left_iter = csr.triplet_iter().map(|(i, j, v)| (i, j, *v));
    let mut right_iter = csc
        .minor_lane_iter()
        .enumerate()
        .flat_map(|(j, lane)| lane.map(move |(i, &v)| (i, j, v)));
    let left_val = left_iter.next();
    let right_val = right_iter.next();

    let merged = TripletSubtractionIter { left_val, right_val, left_iter, right_iter };
    let mut counts = vec![0usize; nrows];
    let mut indices = Vec::with_capacity(csr.nnz() + csc.nnz());
    let mut data = Vec::with_capacity(csr.nnz() + csc.nnz());
    for (i, j, v) in merged {
        counts[i] += 1;
        indices.push(j);
        data.push(v);
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) })
}

/// `csc - csr`, returning a CSC result.
pub fn spsub_csc_csr<MO1, MI1, D1, MO2, MI2, D2>(
    csc: &CsMatrix<MO1, MI1, D1, CompressedColumnStorage>,
    csr: &CsMatrix<MO2, MI2, D2, CompressedRowStorage>,
) -> Result<CscMatrix, OperationError>
where
    MO1: Borrow<[usize]>,
    MI1: Borrow<[usize]>,
    D1: Borrow<[f64]>,
    MO2: Borrow<[usize]>,
    MI2: Borrow<[usize]>,
    D2: Borrow<[f64]>,
{
    shape_mismatch(csc.shape(), csr.shape())?;
    let (nrows, ncols) = csc.shape();
    let mut left_iter = csc.triplet_iter().map(|(i, j, v)| (j, i, *v));
    let mut right_iter = csr
        .minor_lane_iter()
        .enumerate()
        .flat_map(|(i, lane)| lane.map(move |(j, &v)| (j, i, v)));
    let left_val = left_iter.next();
    let right_val = right_iter.next();

    let merged = TripletSubtractionIter { left_val, right_val, left_iter, right_iter };
    let mut counts = vec![0usize; ncols];
    let mut indices = Vec::with_capacity(csc.nnz() + csr.nnz());
    let mut data = Vec::with_capacity(csc.nnz() + csr.nnz());
    for (j, i, v) in merged {
        counts[j] += 1;
        indices.push(i);
        data.push(v);
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) })
}

/// `dense - csr`, in place on a fresh copy of `dense`.
pub fn spsub_dense_csr<MO, MI, D>(
    dense: &DMatrix<f64>,
    csr: &CsMatrix<MO, MI, D, CompressedRowStorage>,
) -> Result<DMatrix<f64>, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    shape_mismatch((dense.nrows(), dense.ncols()), csr.shape())?;
    let mut out = dense.clone();
    csr.do_non_zero(|i, j, v| out[(i, j)] -= v);
    Ok(out)
}

/// `csr - dense`.
pub fn spsub_csr_dense<MO, MI, D>(
    csr: &CsMatrix<MO, MI, D, CompressedRowStorage>,
    dense: &DMatrix<f64>,
) -> Result<DMatrix<f64>, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    shape_mismatch(csr.shape(), (dense.nrows(), dense.ncols()))?;
    let mut out = -dense.clone();
    csr.do_non_zero(|i, j, v| out[(i, j)] += v);
    Ok(out)
}

/// Merges two `(row, col, &value)` triplet iterators, in matching major
/// order, into a single `(major, minor, value)` iterator that subtracts
/// overlapping positions and passes through the rest (negated for
/// right-only entries). Private: the two iterators must already walk in
/// the same major order, which only the functions above guarantee.
struct TripletSubtractionIter<IL, IR> {
    left_val: Option<(usize, usize, f64)>,
    right_val: Option<(usize, usize, f64)>,
    left_iter: IL,
    right_iter: IR,
}

impl<IL, IR> Iterator for TripletSubtractionIter<IL, IR>
where
    IL: Iterator<Item = (usize, usize, f64)>,
    IR: Iterator<Item = (usize, usize, f64)>,
{
    type Item = (usize, usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        match (self.left_val, self.right_val) {
            (Some((il, jl, vl)), Some((ir, jr, vr))) => match (il.cmp(&ir), jl.cmp(&jr)) {
                (Ordering::Less, _) | (Ordering::Equal, Ordering::Less) => {
                    self.left_val = self.left_iter.next();
                    Some((il, jl, vl))
                }
                (Ordering::Greater, _) | (Ordering::Equal, Ordering::Greater) => {
                    self.right_val = self.right_iter.next();
                    Some((ir, jr, -vr))
                }
                (Ordering::Equal, Ordering::Equal) => {
                    self.left_val = self.left_iter.next();
                    self.right_val = self.right_iter.next();
                    Some((il, jl, vl - vr))
                }
            },
            (Some((i, j, v)), None) => {
                self.left_val = self.left_iter.next();
                Some((i, j, v))
            }
            (None, Some((i, j, v))) => {
                self.right_val = self.right_iter.next();
                Some((i, j, -v))
            }
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spsub_csr_csr_agrees_with_dense() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![4.0, 2.0, 1.0])
            .unwrap();
        let b = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]).unwrap();
        let diff = spsub_csr_csr(&a, &b).unwrap();
        assert_eq!(diff.to_dense(), a.to_dense() - b.to_dense());
    }

    #[test]
    fn spsub_csr_csc_matches_csr_csr() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![4.0, 2.0, 1.0])
            .unwrap();
        let b = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]).unwrap();
        let b_csc: CscMatrix = crate::convert::serial::convert_csr_csc(&b);
        let diff = spsub_csr_csc(&a, &b_csc).unwrap();
        assert_eq!(diff.to_dense(), a.to_dense() - b.to_dense());
    }

    #[test]
    fn spsub_dense_csr_matches_elementwise() {
        let dense = DMatrix::from_row_slice(2, 2, &[5.0, 1.0, 0.0, 3.0]);
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 1], vec![1], vec![2.0]).unwrap();
        let diff = spsub_dense_csr(&dense, &csr).unwrap();
        assert_eq!(diff, dense - csr.to_dense());
    }
}
