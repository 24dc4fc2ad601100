//! [`matrixcompare_core`] trait implementations, enabled by the
//! `compare` feature, so sparse and dense matrices can be compared with
//! `matrixcompare::assert_matrix_eq!` directly in tests regardless of
//! which format each side happens to use.

use matrixcompare_core::{Access, Matrix, SparseAccess};

use crate::cs::{CompressedColumnStorage, CompressedRowStorage, CsMatrix};
use crate::dia::DiaMatrix;

macro_rules! impl_matrix_for_cs {
    ($kind:ty) => {
        impl<MO, MI, D> SparseAccess<f64> for CsMatrix<MO, MI, D, $kind>
        where
            MO: std::borrow::Borrow<[usize]>,
            MI: std::borrow::Borrow<[usize]>,
            D: std::borrow::Borrow<[f64]>,
        {
            fn nnz(&self) -> usize {
                self.nnz()
            }

            fn fetch_triplets(&self) -> Vec<(usize, usize, f64)> {
                self.triplet_iter().map(|(i, j, &v)| (i, j, v)).collect()
            }
        }

        impl<MO, MI, D> Matrix<f64> for CsMatrix<MO, MI, D, $kind>
        where
            MO: std::borrow::Borrow<[usize]>,
            MI: std::borrow::Borrow<[usize]>,
            D: std::borrow::Borrow<[f64]>,
        {
            fn rows(&self) -> usize {
                self.nrows()
            }

            fn cols(&self) -> usize {
                self.ncols()
            }

            fn access(&self) -> Access<'_, f64> {
                Access::Sparse(self)
            }
        }
    };
}

impl_matrix_for_cs!(CompressedRowStorage);
impl_matrix_for_cs!(CompressedColumnStorage);

impl SparseAccess<f64> for DiaMatrix {
    fn nnz(&self) -> usize {
        self.nnz()
    }

    fn fetch_triplets(&self) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::new();
        self.do_non_zero(|i, j, v| out.push((i, j, v)));
        out
    }
}

impl Matrix<f64> for DiaMatrix {
    fn rows(&self) -> usize {
        self.nrows()
    }

    fn cols(&self) -> usize {
        self.ncols()
    }

    fn access(&self) -> Access<'_, f64> {
        Access::Sparse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::csr::CsrMatrix;
    use matrixcompare::compare_matrices;

    #[test]
    fn csr_matches_itself_via_matrixcompare() {
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).unwrap();
        let report = compare_matrices(&csr, &csr, &matrixcompare::comparators::ExactElementwiseComparator);
        assert!(report.is_ok());
    }

    #[test]
    fn dia_and_csr_of_same_matrix_compare_equal() {
        let dia = DiaMatrix::new(2, 2, vec![1.0, 2.0]);
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).unwrap();
        let report = compare_matrices(&dia, &csr, &matrixcompare::comparators::ExactElementwiseComparator);
        assert!(report.is_ok());
    }
}
