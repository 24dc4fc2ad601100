//! End-to-end scenarios exercising the library across module boundaries,
//! each corresponding to one worked example: DOK construction and format
//! round-trips, a DIA fast-path multiply, a CSR sparse mat-vec, a sparse
//! vector add, a small SPD Cholesky solve, and a binary vector slice.

use sparsity::binary::BinaryVector;
use sparsity::convert::serial::{convert_coo_csc, convert_coo_csr};
use sparsity::cs::csr::CsrMatrix;
use sparsity::dia::DiaMatrix;
use sparsity::dok::DokMatrix;
use sparsity::factorization::cholesky::CholeskyFactor;
use sparsity::ops::serial::spmul;
use sparsity::vector::SparseVector;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn dok_to_csr_csc_coo_agree() {
    let mut dok = DokMatrix::new(11, 11);
    let entries = [
        (0usize, 3usize, 1.0),
        (1, 1, 2.0),
        (2, 2, 3.0),
        (5, 8, 4.0),
        (10, 10, 5.0),
        (1, 5, 6.0),
        (3, 5, 7.0),
    ];
    for &(i, j, v) in &entries {
        dok.set(i, j, v);
    }

    let coo = dok.to_coo();
    let csr = convert_coo_csr(coo.clone());
    let csc = convert_coo_csc(coo.clone());

    let dense_dok = dok.to_dense();
    let dense_csr = csr.to_dense();
    let dense_csc = csc.to_dense();
    let dense_coo = coo.to_dense();

    for i in 0..11 {
        for j in 0..11 {
            let expected = entries
                .iter()
                .find(|&&(pi, pj, _)| pi == i && pj == j)
                .map(|&(_, _, v)| v)
                .unwrap_or(0.0);
            assert_eq!(dense_dok[(i, j)], expected);
            assert_eq!(dense_csr[(i, j)], expected);
            assert_eq!(dense_csc[(i, j)], expected);
            assert_eq!(dense_coo[(i, j)], expected);
        }
    }
}

#[test]
fn dia_times_csr_scales_rows() {
    let d = DiaMatrix::new(4, 4, vec![1.0, 2.0, 3.0, 4.0]);
    #[rustfmt::skip]
    let b = CsrMatrix::try_from_parts(
        4, 3,
        vec![0, 2, 5, 5, 7],
        vec![0, 2, 0, 1, 2, 0, 2],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
    ).unwrap();

    let product = spmul::mul_dia_csr(&d, &b).unwrap();
    #[rustfmt::skip]
    let expected = nalgebra::DMatrix::<f64>::from_row_slice(4, 3, &[
        1.0, 0.0, 2.0,
        6.0, 8.0, 10.0,
        0.0, 0.0, 0.0,
        24.0, 0.0, 28.0,
    ]);
    assert_eq!(product.to_dense(), expected);
}

#[test]
fn csr_sparse_matvec_matches_expected_output() {
    let triples = [
        (0usize, 2usize, 0.142866817922),
        (0, 4, 0.0564115790271),
        (1, 1, 0.099974915818),
        (2, 1, 0.650888472949),
        (3, 3, 0.721998772267),
        (4, 2, 0.333708611139),
        (4, 3, 0.459248891966),
    ];
    let mut coo = sparsity::coo::CooMatrix::new(5, 5);
    for &(i, j, v) in &triples {
        coo.push(i, j, v);
    }
    let a = convert_coo_csr(coo);
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];

    let mut y = vec![0.0; 5];
    sparsity::blas::spmv(1.0, false, a.major_offsets(), a.minor_indices(), a.values(), &x, 1, &mut y, 1);

    let expected = [
        0.710658348901,
        0.199949831636,
        1.3017769459,
        2.88799508907,
        2.83812140128,
    ];
    for (got, want) in y.iter().zip(&expected) {
        assert!(approx_eq(*got, *want, 1e-11), "got {got}, want {want}");
    }
}

#[test]
fn sparse_vector_add_on_identical_supports() {
    let a = SparseVector::from_sorted_parts(6, vec![1, 3, 4], vec![1.0, 2.0, 1.0]);
    let b = SparseVector::from_sorted_parts(6, vec![0, 1, 3], vec![1.0, 1.0, 1.0]);

    let mut out = SparseVector::new(6);
    out.add(&a, &b);

    assert_eq!(out.to_dense(), vec![1.0, 2.0, 0.0, 3.0, 1.0, 0.0]);
    assert!(out.indices().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn cholesky_on_small_spd_matches_hand_computed_solution() {
    #[rustfmt::skip]
    let a = CsrMatrix::try_from_parts(
        3, 3,
        vec![0, 3, 6, 9],
        vec![0, 1, 2, 0, 1, 2, 0, 1, 2],
        vec![4.0, 1.0, 1.0, 1.0, 2.0, 3.0, 1.0, 3.0, 6.0],
    ).unwrap();

    let chol = CholeskyFactor::factor(&a).unwrap();
    let l = chol.l();

    assert!(approx_eq(l.at(0, 0), 2.0, 1e-9));
    assert!(approx_eq(l.at(1, 0), 0.5, 1e-9));
    assert!(approx_eq(l.at(1, 1), 1.3228756555, 1e-9));
    assert!(approx_eq(l.at(2, 0), 0.5, 1e-9));
    assert!(approx_eq(l.at(2, 1), 2.0788046016, 1e-9));
    assert!(approx_eq(l.at(2, 2), 1.1952286093, 1e-9));

    let x = chol.solve(&[5.0, 6.0, 7.0]).unwrap();
    let expected = [0.207450694, -0.174214755, 0.115777940];
    for (got, want) in x.iter().zip(&expected) {
        assert!(approx_eq(*got, *want, 1e-9), "got {got}, want {want}");
    }
}

#[test]
fn binary_vector_slice_to_u64_matches_expected_window() {
    let mut v = BinaryVector::zeros(132);
    v.set(2, true);
    v.set(65, true);

    // positions 2 and 65 fall at offsets 0 and 63 within the [2, 66) window.
    let packed = v.slice_to_u64(2, 66);
    assert_eq!(packed, 1u64 | (1u64 << 63));
}
