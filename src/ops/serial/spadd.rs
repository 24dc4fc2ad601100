//! Sparse-matrix addition.
//!
//! Mirrors [`crate::ops::serial::spsub`]'s merge strategy but without the
//! negation, plus one extra rule the spec calls out: when adding a
//! sparse operand to a DIA operand, the denser of the two shapes should
//! drive the result layout, so `spadd_cs_dia` and `spadd_dia_cs` fold
//! the diagonal into a clone of the sparse operand in place rather than
//! building a fresh merge.

use crate::convert::utils::CountToOffsetIter;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::{CompressedColumnStorage, CompressedRowStorage, CsMatrix};
use crate::dia::DiaMatrix;
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

/// `lhs + rhs` for two CSR matrices, returning a CSR result.
pub fn spadd_csr_csr<MO1, MI1, D1, MO2, MI2, D2>(
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

    let merged = TripletAdditionIter { left_val, right_val, left_iter, right_iter };
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

/// `lhs + rhs` for two CSC matrices, returning a CSC result.
pub fn spadd_csc_csc<MO1, MI1, D1, MO2, MI2, D2>(
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

    let merged = TripletAdditionIter { left_val, right_val, left_iter, right_iter };
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

/// `csr + csc`, returning a CSR result.
pub fn spadd_csr_csc<MO1, MI1, D1, MO2, MI2, D2>(
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

    let merged = TripletAdditionIter { left_val, right_val, left_iter, right_iter };
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

/// Adds a diagonal matrix into a clone of `cs`'s pattern, since the
/// diagonal's footprint is always a subset of (or equal to) the general
/// sparse operand's addressable positions. Works for either compression
/// via [`crate::cs::CsMatrix::set`], which only CSR/CSC owned matrices
/// support.
pub fn spadd_cs_dia<C: crate::cs::Compression>(
    cs: &CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>,
    dia: &DiaMatrix,
) -> Result<CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>, OperationError> {
    shape_mismatch(cs.shape(), dia.shape())?;
    let mut out = cs.clone();
    dia.do_non_zero(|i, j, v| {
        let updated = out.at(i, j) + v;
        out.set(i, j, updated);
    });
    Ok(out)
}

/// `dia + cs`, commutative with [`spadd_cs_dia`].
pub fn spadd_dia_cs<C: crate::cs::Compression>(
    dia: &DiaMatrix,
    cs: &CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>,
) -> Result<CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>, OperationError> {
    spadd_cs_dia(cs, dia)
}

/// `dia_a + dia_b`, returning a fresh DIA matrix.
pub fn spadd_dia_dia(a: &DiaMatrix, b: &DiaMatrix) -> Result<DiaMatrix, OperationError> {
    shape_mismatch(a.shape(), b.shape())?;
    let len = a.diagonal().len().max(b.diagonal().len());
    let mut data = vec![0.0; len];
    for (i, v) in data.iter_mut().enumerate() {
        *v = a.diagonal().get(i).copied().unwrap_or(0.0) + b.diagonal().get(i).copied().unwrap_or(0.0);
    }
    Ok(DiaMatrix::new(a.nrows(), a.ncols(), data))
}

/// `dense + csr`.
pub fn spadd_dense_csr<MO, MI, D>(
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
    csr.do_non_zero(|i, j, v| out[(i, j)] += v);
    Ok(out)
}

struct TripletAdditionIter<IL, IR> {
    left_val: Option<(usize, usize, f64)>,
    right_val: Option<(usize, usize, f64)>,
    left_iter: IL,
    right_iter: IR,
}

impl<IL, IR> Iterator for TripletAdditionIter<IL, IR>
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
                    Some((ir, jr, vr))
                }
                (Ordering::Equal, Ordering::Equal) => {
                    self.left_val = self.left_iter.next();
                    self.right_val = self.right_iter.next();
                    Some((il, jl, vl + vr))
                }
            },
            (Some((i, j, v)), None) => {
                self.left_val = self.left_iter.next();
                Some((i, j, v))
            }
            (None, Some((i, j, v))) => {
                self.right_val = self.right_iter.next();
                Some((i, j, v))
            }
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spadd_csr_csr_agrees_with_dense() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![4.0, 2.0, 1.0])
            .unwrap();
        let b = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]).unwrap();
        let sum = spadd_csr_csr(&a, &b).unwrap();
        assert_eq!(sum.to_dense(), a.to_dense() + b.to_dense());
    }

    #[test]
    fn spadd_cs_dia_adds_to_diagonal_positions() {
        let cs = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![5.0, 2.0]).unwrap();
        let dia = DiaMatrix::new(2, 2, vec![1.0, 1.0]);
        let sum = spadd_cs_dia(&cs, &dia).unwrap();
        assert_eq!(sum.at(0, 0), 1.0);
        assert_eq!(sum.at(1, 1), 1.0);
        assert_eq!(sum.at(0, 1), 5.0);
        assert_eq!(sum.at(1, 0), 2.0);
    }

    #[test]
    fn spadd_dia_dia_sums_diagonals_of_differing_length() {
        let a = DiaMatrix::new(3, 3, vec![1.0, 2.0]);
        let b = DiaMatrix::new(3, 3, vec![1.0, 1.0, 1.0]);
        let sum = spadd_dia_dia(&a, &b).unwrap();
        assert_eq!(sum.diagonal(), &[2.0, 3.0, 1.0]);
    }
}
