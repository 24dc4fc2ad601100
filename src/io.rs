//! Little-endian binary persistence for every sparse format.
//!
//! Each `marshal_*` writes a small fixed header (shape, then format-
//! specific array lengths) followed by the raw `u64`/`f64` arrays, all
//! little-endian; each `unmarshal_*` validates the header against the
//! buffer length before allocating anything; buffers wider than the
//! buffer cannot support return [`IoError::LengthOverflow`] rather than
//! attempting the allocation.

use byteorder::{ByteOrder, LittleEndian};

use crate::coo::CooMatrix;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::{CompressedColumnStorage, CompressedRowStorage, CsMatrix};
use crate::dia::DiaMatrix;
use crate::dok::DokMatrix;
use crate::error::IoError;

const U64_BYTES: usize = 8;
const F64_BYTES: usize = 8;

fn write_u64(out: &mut Vec<u8>, v: u64) {
    let mut buf = [0u8; U64_BYTES];
    LittleEndian::write_u64(&mut buf, v);
    out.extend_from_slice(&buf);
}

fn write_f64(out: &mut Vec<u8>, v: f64) {
    let mut buf = [0u8; F64_BYTES];
    LittleEndian::write_f64(&mut buf, v);
    out.extend_from_slice(&buf);
}

fn write_usize_slice(out: &mut Vec<u8>, slice: &[usize]) {
    for &v in slice {
        write_u64(out, v as u64);
    }
}

fn write_f64_slice(out: &mut Vec<u8>, slice: &[f64]) {
    for &v in slice {
        write_f64(out, v);
    }
}

fn read_u64(buf: &[u8], at: usize) -> Result<u64, IoError> {
    if at + U64_BYTES > buf.len() {
        return Err(IoError::UnexpectedEof);
    }
    Ok(LittleEndian::read_u64(&buf[at..at + U64_BYTES]))
}

fn read_usize(buf: &[u8], at: usize) -> Result<usize, IoError> {
    let v = read_u64(buf, at)?;
    usize::try_from(v).map_err(|_| IoError::LengthOverflow)
}

fn read_f64(buf: &[u8], at: usize) -> Result<f64, IoError> {
    if at + F64_BYTES > buf.len() {
        return Err(IoError::UnexpectedEof);
    }
    Ok(LittleEndian::read_f64(&buf[at..at + F64_BYTES]))
}

fn read_usize_vec(buf: &[u8], at: usize, count: usize) -> Result<Vec<usize>, IoError> {
    let end = at.checked_add(count.checked_mul(U64_BYTES).ok_or(IoError::LengthOverflow)?)
        .ok_or(IoError::LengthOverflow)?;
    if end > buf.len() {
        return Err(IoError::UnexpectedEof);
    }
    (0..count).map(|k| read_usize(buf, at + k * U64_BYTES)).collect()
}

fn read_f64_vec(buf: &[u8], at: usize, count: usize) -> Result<Vec<f64>, IoError> {
    let end = at.checked_add(count.checked_mul(F64_BYTES).ok_or(IoError::LengthOverflow)?)
        .ok_or(IoError::LengthOverflow)?;
    if end > buf.len() {
        return Err(IoError::UnexpectedEof);
    }
    (0..count).map(|k| read_f64(buf, at + k * F64_BYTES)).collect()
}

/// Serializes a CSR matrix as `[nrows][ncols][nnz][indptr...][indices...][data...]`.
pub fn marshal_csr<MO, MI, D>(m: &CsMatrix<MO, MI, D, CompressedRowStorage>) -> Vec<u8>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    let mut out = Vec::new();
    write_u64(&mut out, m.nrows() as u64);
    write_u64(&mut out, m.ncols() as u64);
    write_u64(&mut out, m.nnz() as u64);
    write_usize_slice(&mut out, m.major_offsets());
    write_usize_slice(&mut out, m.minor_indices());
    write_f64_slice(&mut out, m.values());
    out
}

/// Deserializes a CSR matrix written by [`marshal_csr`].
pub fn unmarshal_csr(buf: &[u8]) -> Result<CsrMatrix, IoError> {
    let nrows = read_usize(buf, 0)?;
    let ncols = read_usize(buf, U64_BYTES)?;
    let nnz = read_usize(buf, 2 * U64_BYTES)?;
    let mut at = 3 * U64_BYTES;
    let offsets = read_usize_vec(buf, at, nrows + 1)?;
    at += (nrows + 1) * U64_BYTES;
    let indices = read_usize_vec(buf, at, nnz)?;
    at += nnz * U64_BYTES;
    let data = read_f64_vec(buf, at, nnz)?;

    if offsets.first() != Some(&0) || offsets.last() != Some(&nnz) {
        return Err(IoError::InconsistentHeader("indptr must start at 0 and end at nnz"));
    }
    CsMatrix::try_from_parts(nrows, ncols, offsets, indices, data)
        .map_err(|_| IoError::InconsistentHeader("malformed CSR structure"))
}

/// Serializes a CSC matrix, symmetric to [`marshal_csr`].
pub fn marshal_csc<MO, MI, D>(m: &CsMatrix<MO, MI, D, CompressedColumnStorage>) -> Vec<u8>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    let mut out = Vec::new();
    write_u64(&mut out, m.nrows() as u64);
    write_u64(&mut out, m.ncols() as u64);
    write_u64(&mut out, m.nnz() as u64);
    write_usize_slice(&mut out, m.major_offsets());
    write_usize_slice(&mut out, m.minor_indices());
    write_f64_slice(&mut out, m.values());
    out
}

/// Deserializes a CSC matrix written by [`marshal_csc`].
pub fn unmarshal_csc(buf: &[u8]) -> Result<CscMatrix, IoError> {
    let nrows = read_usize(buf, 0)?;
    let ncols = read_usize(buf, U64_BYTES)?;
    let nnz = read_usize(buf, 2 * U64_BYTES)?;
    let mut at = 3 * U64_BYTES;
    let offsets = read_usize_vec(buf, at, ncols + 1)?;
    at += (ncols + 1) * U64_BYTES;
    let indices = read_usize_vec(buf, at, nnz)?;
    at += nnz * U64_BYTES;
    let data = read_f64_vec(buf, at, nnz)?;

    if offsets.first() != Some(&0) || offsets.last() != Some(&nnz) {
        return Err(IoError::InconsistentHeader("indptr must start at 0 and end at nnz"));
    }
    CsMatrix::try_from_parts(nrows, ncols, offsets, indices, data)
        .map_err(|_| IoError::InconsistentHeader("malformed CSC structure"))
}

/// Serializes a COO matrix as `[nrows][ncols][nnz][rows...][cols...][data...]`.
pub fn marshal_coo(m: &CooMatrix) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64(&mut out, m.nrows() as u64);
    write_u64(&mut out, m.ncols() as u64);
    write_u64(&mut out, m.nnz() as u64);
    for (i, j, &v) in m.triplet_iter() {
        write_u64(&mut out, i as u64);
        write_u64(&mut out, j as u64);
        write_f64(&mut out, v);
    }
    out
}

/// Deserializes a COO matrix written by [`marshal_coo`].
pub fn unmarshal_coo(buf: &[u8]) -> Result<CooMatrix, IoError> {
    let nrows = read_usize(buf, 0)?;
    let ncols = read_usize(buf, U64_BYTES)?;
    let nnz = read_usize(buf, 2 * U64_BYTES)?;
    let mut at = 3 * U64_BYTES;
    let mut coo = CooMatrix::new(nrows, ncols);
    for _ in 0..nnz {
        let i = read_usize(buf, at)?;
        let j = read_usize(buf, at + U64_BYTES)?;
        let v = read_f64(buf, at + 2 * U64_BYTES)?;
        at += 2 * U64_BYTES + F64_BYTES;
        if i >= nrows || j >= ncols {
            return Err(IoError::InconsistentHeader("coordinate out of bounds"));
        }
        coo.push(i, j, v);
    }
    Ok(coo)
}

/// Serializes a DOK matrix by first converting to COO.
pub fn marshal_dok(m: &DokMatrix) -> Vec<u8> {
    marshal_coo(&m.to_coo())
}

/// Deserializes a DOK matrix written by [`marshal_dok`].
pub fn unmarshal_dok(buf: &[u8]) -> Result<DokMatrix, IoError> {
    let coo = unmarshal_coo(buf)?;
    let mut dok = DokMatrix::new(coo.nrows(), coo.ncols());
    for (i, j, &v) in coo.triplet_iter() {
        dok.set(i, j, v);
    }
    Ok(dok)
}

/// Serializes a DIA matrix as `[nrows][ncols][diag_len][diagonal...]`.
pub fn marshal_dia(m: &DiaMatrix) -> Vec<u8> {
    let mut out = Vec::new();
    write_u64(&mut out, m.nrows() as u64);
    write_u64(&mut out, m.ncols() as u64);
    write_u64(&mut out, m.diagonal().len() as u64);
    write_f64_slice(&mut out, m.diagonal());
    out
}

/// Deserializes a DIA matrix written by [`marshal_dia`].
pub fn unmarshal_dia(buf: &[u8]) -> Result<DiaMatrix, IoError> {
    let nrows = read_usize(buf, 0)?;
    let ncols = read_usize(buf, U64_BYTES)?;
    let diag_len = read_usize(buf, 2 * U64_BYTES)?;
    let data = read_f64_vec(buf, 3 * U64_BYTES, diag_len)?;
    if diag_len > nrows.min(ncols) {
        return Err(IoError::InconsistentHeader("diagonal length exceeds min(rows, cols)"));
    }
    Ok(DiaMatrix::new(nrows, ncols, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_round_trips_through_bytes() {
        let m = CsrMatrix::try_from_parts(2, 3, vec![0, 1, 2], vec![1, 2], vec![4.0, 5.0]).unwrap();
        let bytes = marshal_csr(&m);
        let back = unmarshal_csr(&bytes).unwrap();
        assert_eq!(m.to_dense(), back.to_dense());
    }

    #[test]
    fn coo_round_trips_through_bytes() {
        let mut m = CooMatrix::new(2, 2);
        m.push(0, 1, 3.0);
        m.push(1, 0, -2.0);
        let bytes = marshal_coo(&m);
        let back = unmarshal_coo(&bytes).unwrap();
        assert_eq!(m.to_dense(), back.to_dense());
    }

    #[test]
    fn dia_round_trips_through_bytes() {
        let m = DiaMatrix::new(3, 4, vec![1.0, 2.0]);
        let bytes = marshal_dia(&m);
        let back = unmarshal_dia(&bytes).unwrap();
        assert_eq!(m.to_dense(), back.to_dense());
    }

    #[test]
    fn unmarshal_truncated_buffer_errors() {
        let m = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).unwrap();
        let mut bytes = marshal_csr(&m);
        bytes.truncate(bytes.len() - 4);
        assert_eq!(unmarshal_csr(&bytes), Err(IoError::UnexpectedEof));
    }
}
