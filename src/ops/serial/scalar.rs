//! Scalar scale operations for sparse matrices and vectors.

use crate::cs::{Compression, CsMatrix};
use crate::vector::SparseVector;
use std::borrow::Borrow;

/// Scales every stored entry of a sparse matrix by `scalar`, returning a
/// fresh owned matrix. Does not check whether `scalar` is zero: scaling
/// by `0.0` leaves explicit zeros in the result rather than dropping
/// them (consistent with [`crate::cs::CsMatrix::set`] semantics).
pub fn sp_cs_scalar_prod<MO, MI, D, C>(
    cs: &CsMatrix<MO, MI, D, C>,
    scalar: f64,
) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
    C: Compression,
{
    let (rows, columns) = cs.shape();
    let offsets = cs.major_offsets().to_vec();
    let indices = cs.minor_indices().to_vec();
    let data = cs.values().iter().map(|x| x * scalar).collect();

    unsafe { CsMatrix::from_parts_unchecked(rows, columns, offsets, indices, data) }
}

/// Divides every stored entry of a sparse matrix by `scalar`.
pub fn sp_cs_scalar_div<MO, MI, D, C>(
    cs: &CsMatrix<MO, MI, D, C>,
    scalar: f64,
) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
    C: Compression,
{
    sp_cs_scalar_prod(cs, 1.0 / scalar)
}

/// Scales a sparse vector by `scalar`, returning a fresh owned vector.
pub fn sp_vec_scalar_prod(vec: &SparseVector, scalar: f64) -> SparseVector {
    let mut out = SparseVector::new(vec.len());
    out.scale(scalar, vec);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::csr::CsrMatrix;

    #[test]
    fn scalar_prod_scales_stored_values() {
        let m = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![2.0, 3.0]).unwrap();
        let scaled = sp_cs_scalar_prod(&m, 2.0);
        assert_eq!(scaled.at(0, 0), 4.0);
        assert_eq!(scaled.at(1, 1), 6.0);
    }

    #[test]
    fn scalar_div_is_inverse_of_prod() {
        let m = CsrMatrix::try_from_parts(1, 2, vec![0, 2], vec![0, 1], vec![4.0, 8.0]).unwrap();
        let divided = sp_cs_scalar_div(&m, 2.0);
        assert_eq!(divided.at(0, 0), 2.0);
        assert_eq!(divided.at(0, 1), 4.0);
    }

    #[test]
    fn vector_scalar_prod() {
        let v = SparseVector::from_sorted_parts(3, vec![0, 2], vec![1.0, 2.0]);
        let scaled = sp_vec_scalar_prod(&v, -1.0);
        assert_eq!(scaled.at(0), -1.0);
        assert_eq!(scaled.at(2), -2.0);
    }
}
