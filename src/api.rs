//! The high-level, format-erased façade: [`MatrixType`] tags a concrete
//! sparse or dense representation so callers can hold "a matrix" without
//! committing to CSR vs. CSC vs. dense at the type level, and the free
//! functions here (`mul_mat_mat`, `mul_mat_vec`, `dot`, `norm`, `random`)
//! dispatch on the tag to the fast path in [`crate::ops::serial`] when one
//! exists, falling back to a dense computation otherwise.
//!
//! This is a closed, user-facing enum — exactly the case spec.md's design
//! notes call out for tagged-variant dispatch, as opposed to the
//! capability-trait dispatch (`cs::Compression`) used inside the
//! arithmetic driver itself.

use nalgebra::{DMatrix, DVector};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::coo::CooMatrix;
use crate::dia::DiaMatrix;
use crate::dok::DokMatrix;
use crate::error::OperationError;
use crate::ops::serial::{spmul, spadd, spsub};

/// A format-erased matrix: one of the five storage representations this
/// crate supports, plus dense.
#[derive(Debug, Clone)]
pub enum MatrixType {
    /// A dense `nalgebra` matrix.
    Dense(DMatrix<f64>),
    /// Dictionary-of-keys.
    Dok(DokMatrix),
    /// Coordinate list.
    Coo(CooMatrix),
    /// Compressed sparse row.
    Csr(CsrMatrix),
    /// Compressed sparse column.
    Csc(CscMatrix),
    /// Diagonal.
    Dia(DiaMatrix),
}

impl MatrixType {
    /// The matrix shape, regardless of underlying representation.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            MatrixType::Dense(m) => (m.nrows(), m.ncols()),
            MatrixType::Dok(m) => m.shape(),
            MatrixType::Coo(m) => m.shape(),
            MatrixType::Csr(m) => m.shape(),
            MatrixType::Csc(m) => m.shape(),
            MatrixType::Dia(m) => m.shape(),
        }
    }

    /// The value at `(i, j)`, regardless of underlying representation.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        match self {
            MatrixType::Dense(m) => m[(i, j)],
            MatrixType::Dok(m) => m.at(i, j),
            MatrixType::Coo(m) => m.at(i, j),
            MatrixType::Csr(m) => m.at(i, j),
            MatrixType::Csc(m) => m.at(i, j),
            MatrixType::Dia(m) => m.at(i, j),
        }
    }

    /// A dense rendering, regardless of underlying representation.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            MatrixType::Dense(m) => m.clone(),
            MatrixType::Dok(m) => m.to_dense(),
            MatrixType::Coo(m) => m.to_dense(),
            MatrixType::Csr(m) => m.to_dense(),
            MatrixType::Csc(m) => m.to_dense(),
            MatrixType::Dia(m) => m.to_dense(),
        }
    }

    /// Converts to CSR, going through COO for DOK/COO, and through a
    /// direct dense scan for dense.
    pub fn to_csr(&self) -> CsrMatrix {
        match self {
            MatrixType::Csr(m) => m.clone(),
            MatrixType::Csc(m) => crate::convert::serial::convert_csc_csr(m),
            MatrixType::Dok(m) => crate::convert::serial::convert_coo_csr(m.to_coo()),
            MatrixType::Coo(m) => crate::convert::serial::convert_coo_csr(m.clone()),
            MatrixType::Dense(m) => crate::convert::serial::convert_dense_csr(m),
            MatrixType::Dia(m) => crate::convert::serial::convert_dense_csr(&m.to_dense()),
        }
    }

    /// Converts to CSC, symmetric to [`MatrixType::to_csr`].
    pub fn to_csc(&self) -> CscMatrix {
        match self {
            MatrixType::Csc(m) => m.clone(),
            MatrixType::Csr(m) => crate::convert::serial::convert_csr_csc(m),
            MatrixType::Dok(m) => crate::convert::serial::convert_coo_csc(m.to_coo()),
            MatrixType::Coo(m) => crate::convert::serial::convert_coo_csc(m.clone()),
            MatrixType::Dense(m) => crate::convert::serial::convert_dense_csc(m),
            MatrixType::Dia(m) => crate::convert::serial::convert_dense_csc(&m.to_dense()),
        }
    }
}

/// `a * b`, dispatching to the cheapest available kernel for the pair of
/// tags involved: DIA fast paths first, then CSR/CSC combinations, then
/// a dense fallback for everything else (including DOK and COO, which
/// have no native multiply and are only ever construction formats).
pub fn mul_mat_mat(a: &MatrixType, b: &MatrixType) -> Result<MatrixType, OperationError> {
    use MatrixType::*;
    match (a, b) {
        (Dia(x), Csr(y)) => spmul::mul_dia_csr(x, y).map(Csr),
        (Csr(x), Dia(y)) => spmul::mul_csr_dia(x, y).map(Csr),
        (Dia(x), Csc(y)) => spmul::mul_dia_csc(x, y).map(Csc),
        (Csc(x), Dia(y)) => spmul::mul_csc_dia(x, y).map(Csc),
        (Dia(x), Dia(y)) => spmul::mul_dia_dia(x, y).map(Dia),
        (Csr(x), Csr(y)) => spmul::mul_csr_csr(x, y).map(Csr),
        (Csr(x), Csc(y)) => spmul::mul_csr_csc(x, y).map(Csr),
        (Csc(x), Csc(y)) => spmul::mul_csc_csc(x, y).map(Csc),
        (Csc(x), Csr(y)) => {
            let x_csr = crate::convert::serial::convert_csc_csr(x);
            spmul::mul_csr_csr(&x_csr, y).map(Csr)
        }
        (Csr(x), Dense(y)) => spmul::mul_csr_dense(x, y).map(Dense),
        _ => {
            let (lhs, rhs) = (a.to_dense(), b.to_dense());
            if lhs.ncols() != rhs.nrows() {
                return Err(crate::error::OperationError::from_kind_and_message(
                    crate::error::OperationErrorKind::InvalidPattern,
                    format!("inner dimensions {} and {} do not match", lhs.ncols(), rhs.nrows()),
                ));
            }
            Ok(Dense(lhs * rhs))
        }
    }
}

/// `A * x` for a format-erased matrix and a dense vector, dispatching to
/// [`crate::blas::spmv`] for every sparse tag and to `nalgebra` for dense.
pub fn mul_mat_vec(a: &MatrixType, x: &[f64]) -> Result<Vec<f64>, OperationError> {
    let (nrows, ncols) = a.shape();
    if x.len() != ncols {
        return Err(crate::error::OperationError::from_kind_and_message(
            crate::error::OperationErrorKind::InvalidPattern,
            format!("vector length {} does not match matrix columns {ncols}", x.len()),
        ));
    }
    let mut y = vec![0.0; nrows];
    match a {
        MatrixType::Csr(m) => {
            crate::blas::spmv(1.0, false, m.major_offsets(), m.minor_indices(), m.values(), x, 1, &mut y, 1);
        }
        MatrixType::Csc(m) => {
            crate::blas::spmv(1.0, true, m.major_offsets(), m.minor_indices(), m.values(), x, 1, &mut y, 1);
        }
        MatrixType::Dia(m) => {
            for (i, v) in y.iter_mut().enumerate() {
                *v = m.at(i, i) * x.get(i).copied().unwrap_or(0.0);
            }
        }
        MatrixType::Dense(m) => {
            let xv = DVector::from_row_slice(x);
            return Ok((m * xv).as_slice().to_vec());
        }
        MatrixType::Dok(_) | MatrixType::Coo(_) => {
            let csr = a.to_csr();
            return mul_mat_vec(&MatrixType::Csr(csr), x);
        }
    }
    Ok(y)
}

/// `a + b`, dispatching the same way as [`mul_mat_mat`].
pub fn add_mat_mat(a: &MatrixType, b: &MatrixType) -> Result<MatrixType, OperationError> {
    use MatrixType::*;
    match (a, b) {
        (Csr(x), Csr(y)) => spadd::spadd_csr_csr(x, y).map(Csr),
        (Csc(x), Csc(y)) => spadd::spadd_csc_csc(x, y).map(Csc),
        (Csr(x), Csc(y)) => spadd::spadd_csr_csc(x, y).map(Csr),
        (Dia(x), Dia(y)) => spadd::spadd_dia_dia(x, y).map(Dia),
        (Csr(x), Dia(y)) | (Dia(y), Csr(x)) => spadd::spadd_cs_dia(x, y).map(Csr),
        (Csc(x), Dia(y)) | (Dia(y), Csc(x)) => spadd::spadd_cs_dia(x, y).map(Csc),
        _ => {
            let (lhs, rhs) = (a.to_dense(), b.to_dense());
            if lhs.shape() != rhs.shape() {
                return Err(crate::error::OperationError::from_kind_and_message(
                    crate::error::OperationErrorKind::InvalidPattern,
                    "matrix shapes do not match".into(),
                ));
            }
            Ok(Dense(lhs + rhs))
        }
    }
}

/// `a - b`, dispatching the same way as [`mul_mat_mat`].
pub fn sub_mat_mat(a: &MatrixType, b: &MatrixType) -> Result<MatrixType, OperationError> {
    use MatrixType::*;
    match (a, b) {
        (Csr(x), Csr(y)) => spsub::spsub_csr_csr(x, y).map(Csr),
        (Csc(x), Csc(y)) => spsub::spsub_csc_csc(x, y).map(Csc),
        (Csr(x), Csc(y)) => spsub::spsub_csr_csc(x, y).map(Csr),
        (Csc(x), Csr(y)) => spsub::spsub_csc_csr(x, y).map(Csc),
        _ => {
            let (lhs, rhs) = (a.to_dense(), b.to_dense());
            if lhs.shape() != rhs.shape() {
                return Err(crate::error::OperationError::from_kind_and_message(
                    crate::error::OperationErrorKind::InvalidPattern,
                    "matrix shapes do not match".into(),
                ));
            }
            Ok(Dense(lhs - rhs))
        }
    }
}

/// Dot product of two equal-length dense vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    crate::blas::dot(&(0..a.len()).collect::<Vec<_>>(), a, b, 1)
}

/// The `L`-norm of a dense vector (`L=2` is Euclidean).
pub fn norm(a: &[f64], l: i32) -> f64 {
    if l == 2 {
        a.iter().map(|v| v * v).sum::<f64>().sqrt()
    } else {
        a.iter().map(|v| v.abs().powi(l)).sum::<f64>().powf(1.0 / l as f64)
    }
}

/// Builds a random CSR matrix of shape `(nrows, ncols)` where each entry
/// is independently non-zero with probability `density`, drawn uniformly
/// from `[-1.0, 1.0)`.
pub fn random(nrows: usize, ncols: usize, density: f64, rng: &mut impl Rng) -> CsrMatrix {
    let presence = Uniform::new(0.0, 1.0);
    let value = Uniform::new(-1.0, 1.0);
    let mut coo = CooMatrix::new(nrows, ncols);
    for i in 0..nrows {
        for j in 0..ncols {
            if presence.sample(rng) < density {
                coo.push(i, j, value.sample(rng));
            }
        }
    }
    crate::convert::serial::convert_coo_csr(coo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn mul_mat_mat_dia_csr_fast_path() {
        let dia = MatrixType::Dia(DiaMatrix::new(2, 2, vec![2.0, 3.0]));
        let csr = MatrixType::Csr(
            CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0]).unwrap(),
        );
        let result = mul_mat_mat(&dia, &csr).unwrap();
        assert_eq!(result.at(0, 0), 2.0);
        assert_eq!(result.at(1, 1), 3.0);
    }

    #[test]
    fn mul_mat_mat_falls_back_to_dense_for_dok() {
        let mut dok = DokMatrix::new(2, 2);
        dok.set(0, 0, 2.0);
        let a = MatrixType::Dok(dok);
        let b = MatrixType::Dense(DMatrix::<f64>::identity(2, 2));
        let result = mul_mat_mat(&a, &b).unwrap();
        assert_eq!(result.at(0, 0), 2.0);
    }

    #[test]
    fn mul_mat_vec_csr_matches_dense() {
        let csr = MatrixType::Csr(
            CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![2.0, 3.0]).unwrap(),
        );
        let y = mul_mat_vec(&csr, &[1.0, 1.0]).unwrap();
        assert_eq!(y, vec![2.0, 3.0]);
    }

    #[test]
    fn random_matrix_respects_shape() {
        let mut rng = SmallRng::seed_from_u64(42);
        let m = random(4, 5, 0.5, &mut rng);
        assert_eq!(m.shape(), (4, 5));
    }
}
