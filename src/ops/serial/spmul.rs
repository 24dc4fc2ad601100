//! Sparse-matrix multiplication.
//!
//! Dispatch follows the spec's fast-path-first rule: any product
//! involving a [`DiaMatrix`] operand degrades to an element scale
//! rather than a general sparse product (`mul_dia_*`/`mul_*_dia`).
//! `CSR * CSR` runs Gustavson's algorithm over a [`crate::vector::Accumulator`]
//! (the sparse accumulator, SPA); `CSR * CSC` merges along matching
//! sorted index lists row-by-column, avoiding the SPA since neither
//! operand needs per-row scattering. Dense operands fall through to
//! [`crate::blas::spmm`]. [`crate::api`] is the façade that picks among
//! these based on runtime [`crate::api::MatrixType`] tags.

use crate::convert::serial::convert_csc_csr;
use crate::convert::utils::CountToOffsetIter;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::{CompressedColumnStorage, CompressedRowStorage, CsMatrix};
use crate::dia::DiaMatrix;
use crate::error::{OperationError, OperationErrorKind};
use crate::vector::Accumulator;
use nalgebra::DMatrix;
use std::borrow::Borrow;

fn mul_mismatch(inner_lhs: usize, inner_rhs: usize) -> Result<(), OperationError> {
    if inner_lhs != inner_rhs {
        Err(OperationError::from_kind_and_message(
            OperationErrorKind::InvalidPattern,
            format!("inner dimensions {inner_lhs} and {inner_rhs} do not match"),
        ))
    } else {
        Ok(())
    }
}

/// `dia * csr`: scales row `i` of `csr` by `dia`'s `i`-th diagonal entry,
/// dropping rows at or beyond the diagonal's length.
pub fn mul_dia_csr<MO, MI, D>(
    dia: &DiaMatrix,
    csr: &CsMatrix<MO, MI, D, CompressedRowStorage>,
) -> Result<CsrMatrix, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    mul_mismatch(dia.ncols(), csr.nrows())?;
    let (out_rows, out_cols) = (dia.nrows(), csr.ncols());
    let mut counts = vec![0usize; out_rows];
    let mut indices = Vec::with_capacity(csr.nnz());
    let mut data = Vec::with_capacity(csr.nnz());
    for i in 0..out_rows {
        if i < dia.diagonal().len() && i < csr.nrows() {
            let scale = dia.diagonal()[i];
            csr.do_major_non_zero(i, |_, j, v| {
                indices.push(j);
                data.push(v * scale);
            });
            counts[i] = csr.major_offsets()[i + 1] - csr.major_offsets()[i];
        }
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `csr * dia`: scales column `j` of `csr` by `dia`'s `j`-th diagonal
/// entry, dropping entries at or beyond the diagonal's length.
pub fn mul_csr_dia<MO, MI, D>(
    csr: &CsMatrix<MO, MI, D, CompressedRowStorage>,
    dia: &DiaMatrix,
) -> Result<CsrMatrix, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    mul_mismatch(csr.ncols(), dia.nrows())?;
    let (out_rows, out_cols) = (csr.nrows(), dia.ncols());
    let diag_len = dia.diagonal().len();
    let mut counts = vec![0usize; out_rows];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for i in 0..out_rows {
        csr.do_major_non_zero(i, |_, j, v| {
            if j < diag_len {
                indices.push(j);
                data.push(v * dia.diagonal()[j]);
                counts[i] += 1;
            }
        });
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `dia * csc`, symmetric to [`mul_dia_csr`].
pub fn mul_dia_csc<MO, MI, D>(
    dia: &DiaMatrix,
    csc: &CsMatrix<MO, MI, D, CompressedColumnStorage>,
) -> Result<CscMatrix, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    mul_mismatch(dia.ncols(), csc.nrows())?;
    let (out_rows, out_cols) = (dia.nrows(), csc.ncols());
    let diag_len = dia.diagonal().len();
    let mut counts = vec![0usize; out_cols];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for j in 0..out_cols {
        csc.do_major_non_zero(j, |i, _, v| {
            if i < diag_len && i < out_rows {
                indices.push(i);
                data.push(v * dia.diagonal()[i]);
                counts[j] += 1;
            }
        });
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `csc * dia`, symmetric to [`mul_csr_dia`].
pub fn mul_csc_dia<MO, MI, D>(
    csc: &CsMatrix<MO, MI, D, CompressedColumnStorage>,
    dia: &DiaMatrix,
) -> Result<CscMatrix, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    mul_mismatch(csc.ncols(), dia.nrows())?;
    let (out_rows, out_cols) = (csc.nrows(), dia.ncols());
    let diag_len = dia.diagonal().len();
    let mut counts = vec![0usize; out_cols];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for j in 0..out_cols {
        if j < diag_len && j < csc.ncols() {
            let scale = dia.diagonal()[j];
            csc.do_major_non_zero(j, |i, _, v| {
                indices.push(i);
                data.push(v * scale);
            });
            counts[j] = csc.major_offsets()[j + 1] - csc.major_offsets()[j];
        }
    }
    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `dia_a * dia_b`: the product of two diagonals is a diagonal.
pub fn mul_dia_dia(a: &DiaMatrix, b: &DiaMatrix) -> Result<DiaMatrix, OperationError> {
    mul_mismatch(a.ncols(), b.nrows())?;
    let len = a.diagonal().len().min(b.diagonal().len());
    let data = (0..len).map(|i| a.diagonal()[i] * b.diagonal()[i]).collect();
    Ok(DiaMatrix::new(a.nrows(), b.ncols(), data))
}

/// `lhs * rhs` for two CSR matrices, via Gustavson's algorithm: for each
/// row of `lhs`, scatter each nonzero's contribution (scaled by the
/// matching row of `rhs`) into a sparse accumulator, then drain it in
/// sorted order as the output row.
pub fn mul_csr_csr<MO1, MI1, D1, MO2, MI2, D2>(
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
    mul_mismatch(lhs.ncols(), rhs.nrows())?;
    let (out_rows, out_cols) = (lhs.nrows(), rhs.ncols());
    let mut spa = Accumulator::new(out_cols);
    let mut counts = vec![0usize; out_rows];
    let mut indices = Vec::new();
    let mut data = Vec::new();

    for i in 0..out_rows {
        lhs.do_major_non_zero(i, |_, k, v| {
            let row_k = rhs.major_lane_view(k);
            spa.scatter_add(v, row_k.indices(), row_k.values());
        });
        let (row_idx, row_val) = spa.gather_sorted();
        counts[i] = row_idx.len();
        indices.extend(row_idx);
        data.extend(row_val);
    }

    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `lhs * rhs` for a CSR left operand and a CSC right operand: since
/// both sides already expose the contraction axis as a sorted index
/// list (`lhs`'s rows, `rhs`'s columns), each output entry is a sparse
/// dot product between the two, skipping pairs whose merge yields an
/// exact zero.
pub fn mul_csr_csc<MO1, MI1, D1, MO2, MI2, D2>(
    lhs: &CsMatrix<MO1, MI1, D1, CompressedRowStorage>,
    rhs: &CsMatrix<MO2, MI2, D2, CompressedColumnStorage>,
) -> Result<CsrMatrix, OperationError>
where
    MO1: Borrow<[usize]>,
    MI1: Borrow<[usize]>,
    D1: Borrow<[f64]>,
    MO2: Borrow<[usize]>,
    MI2: Borrow<[usize]>,
    D2: Borrow<[f64]>,
{
    mul_mismatch(lhs.ncols(), rhs.nrows())?;
    let (out_rows, out_cols) = (lhs.nrows(), rhs.ncols());
    let mut counts = vec![0usize; out_rows];
    let mut indices = Vec::new();
    let mut data = Vec::new();

    for i in 0..out_rows {
        let row = lhs.major_lane_view(i);
        for j in 0..out_cols {
            let col = rhs.major_lane_view(j);
            let v = sparse_merge_dot(row.indices(), row.values(), col.indices(), col.values());
            if v != 0.0 {
                indices.push(j);
                data.push(v);
                counts[i] += 1;
            }
        }
    }

    let offsets = CountToOffsetIter::new(counts).collect();
    Ok(unsafe { CsMatrix::from_parts_unchecked(out_rows, out_cols, offsets, indices, data) })
}

/// `lhs * rhs` for two CSC matrices: converts `lhs` to CSR (cheap
/// counting-sort, see [`crate::convert::serial::convert_csc_csr`]) and
/// delegates to [`mul_csr_csc`], then discards row-major order in
/// favour of the caller's CSC expectation via a final transpose-free
/// conversion.
pub fn mul_csc_csc<MO1, MI1, D1, MO2, MI2, D2>(
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
    let lhs_csr = convert_csc_csr(lhs);
    let result_csr = mul_csr_csc(&lhs_csr, rhs)?;
    Ok(crate::convert::serial::convert_csr_csc(&result_csr))
}

/// `csr * dense`, via [`crate::blas::spmm`].
pub fn mul_csr_dense<MO, MI, D>(
    csr: &CsMatrix<MO, MI, D, CompressedRowStorage>,
    dense: &DMatrix<f64>,
) -> Result<DMatrix<f64>, OperationError>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
{
    mul_mismatch(csr.ncols(), dense.nrows())?;
    let (nrows, ncols_b) = (csr.nrows(), dense.ncols());
    let mut c = DMatrix::<f64>::zeros(nrows, ncols_b);
    let b_col_major: Vec<f64> = (0..ncols_b).flat_map(|j| dense.column(j).iter().copied().collect::<Vec<_>>()).collect();
    let mut c_col_major = vec![0.0; nrows * ncols_b];
    crate::blas::spmm(
        1.0,
        false,
        csr.major_offsets(),
        csr.minor_indices(),
        csr.values(),
        &b_col_major,
        csr.ncols(),
        ncols_b,
        &mut c_col_major,
        nrows,
    );
    for j in 0..ncols_b {
        for i in 0..nrows {
            c[(i, j)] = c_col_major[j * nrows + i];
        }
    }
    Ok(c)
}

fn sparse_merge_dot(ix1: &[usize], v1: &[f64], ix2: &[usize], v2: &[f64]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0;
    while i < ix1.len() && j < ix2.len() {
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
    fn mul_csr_csr_agrees_with_dense() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 0], vec![1.0, 2.0, 3.0])
            .unwrap();
        let b = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![4.0, 5.0]).unwrap();
        let c = mul_csr_csr(&a, &b).unwrap();
        assert_eq!(c.to_dense(), a.to_dense() * b.to_dense());
    }

    #[test]
    fn mul_csr_csc_agrees_with_dense() {
        let a = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 0], vec![1.0, 2.0, 3.0])
            .unwrap();
        let b = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![4.0, 5.0]).unwrap();
        let b_csc = crate::convert::serial::convert_csr_csc(&b);
        let c = mul_csr_csc(&a, &b_csc).unwrap();
        assert_eq!(c.to_dense(), a.to_dense() * b.to_dense());
    }

    #[test]
    fn mul_dia_csr_scales_rows() {
        let dia = DiaMatrix::new(2, 2, vec![2.0, 3.0]);
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]).unwrap();
        let c = mul_dia_csr(&dia, &csr).unwrap();
        assert_eq!(c.at(0, 0), 2.0);
        assert_eq!(c.at(1, 1), 3.0);
    }

    #[test]
    fn mul_csr_dense_matches_nalgebra() {
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 2, 3], vec![0, 1, 0], vec![1.0, 2.0, 3.0])
            .unwrap();
        let dense = DMatrix::<f64>::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let c = mul_csr_dense(&csr, &dense).unwrap();
        assert_eq!(c, csr.to_dense() * dense);
    }
}
