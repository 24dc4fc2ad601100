//! Level-1/2/3 sparse BLAS kernels.
//!
//! Every routine here operates on raw index/value slices rather than on a
//! typed matrix or vector, so that any compressed format (CSR, CSC, or a
//! bare sparse vector) can drive them without an intermediate copy. All
//! reductions are performed left-to-right over the sparse index arrays,
//! so two calls with the same operands in the same order produce
//! bit-identical results.

/// `r <- xᵀ · y`, where `x` is sparse (`x_values[k]` at `x_indices[k]`)
/// and `y` is dense with stride `incy`.
pub fn dot(x_indices: &[usize], x_values: &[f64], y: &[f64], incy: usize) -> f64 {
    debug_assert_eq!(x_indices.len(), x_values.len());
    let mut acc = 0.0;
    for (&idx, &v) in x_indices.iter().zip(x_values) {
        acc += v * y[idx * incy];
    }
    acc
}

/// `y <- alpha * x + y`, where `x` is sparse and `y` is dense with stride
/// `incy`. Returns immediately without touching `y` when `alpha == 0.0`.
pub fn axpy(alpha: f64, x_indices: &[usize], x_values: &[f64], y: &mut [f64], incy: usize) {
    if alpha == 0.0 {
        return;
    }
    debug_assert_eq!(x_indices.len(), x_values.len());
    for (&idx, &v) in x_indices.iter().zip(x_values) {
        y[idx * incy] += alpha * v;
    }
}

/// `x[k] <- y[idx[k] * incy]`.
pub fn gather(idx: &[usize], y: &[f64], incy: usize, x: &mut [f64]) {
    debug_assert_eq!(idx.len(), x.len());
    for (k, &i) in idx.iter().enumerate() {
        x[k] = y[i * incy];
    }
}

/// Like [`gather`], but additionally zeroes each gathered entry of `y`.
pub fn gather_and_zero(idx: &[usize], y: &mut [f64], incy: usize, x: &mut [f64]) {
    debug_assert_eq!(idx.len(), x.len());
    for (k, &i) in idx.iter().enumerate() {
        x[k] = y[i * incy];
        y[i * incy] = 0.0;
    }
}

/// `y[idx[k] * incy] <- x[k]`.
pub fn scatter(idx: &[usize], x: &[f64], y: &mut [f64], incy: usize) {
    debug_assert_eq!(idx.len(), x.len());
    for (k, &i) in idx.iter().enumerate() {
        y[i * incy] = x[k];
    }
}

/// `y <- alpha * A * x + y`, or `y <- alpha * Aᵀ * x + y` when `trans_a`
/// is set. `A` is given in compressed form: `indptr` has `nmajor + 1`
/// entries, `indices[indptr[i]..indptr[i+1])` and the matching slice of
/// `data` hold major line `i`.
///
/// When not transposed, each output entry is a dot product over the
/// native compressed layout; when transposed, each major line is
/// scattered via AXPY. Either way, no transposed copy of `A` is built.
#[allow(clippy::too_many_arguments)]
pub fn spmv(
    alpha: f64,
    trans_a: bool,
    indptr: &[usize],
    indices: &[usize],
    data: &[f64],
    x: &[f64],
    incx: usize,
    y: &mut [f64],
    incy: usize,
) {
    if alpha == 0.0 {
        return;
    }
    let nmajor = indptr.len() - 1;
    if !trans_a {
        for i in 0..nmajor {
            let lo = indptr[i];
            let hi = indptr[i + 1];
            let d = dot(&indices[lo..hi], &data[lo..hi], x, incx);
            y[i * incy] += alpha * d;
        }
    } else {
        for i in 0..nmajor {
            let lo = indptr[i];
            let hi = indptr[i + 1];
            let xi = x[i * incx];
            if xi == 0.0 {
                continue;
            }
            axpy(alpha * xi, &indices[lo..hi], &data[lo..hi], y, incy);
        }
    }
}

/// `C <- alpha * A * B + C`, or `C <- alpha * Aᵀ * B + C` when `trans_a`
/// is set. `B` and `C` are dense, column-major, with leading dimensions
/// `ldb`/`ldc`. Implemented as `k` independent [`spmv`] calls over the
/// columns of `B`/`C`.
#[allow(clippy::too_many_arguments)]
pub fn spmm(
    alpha: f64,
    trans_a: bool,
    indptr: &[usize],
    indices: &[usize],
    data: &[f64],
    b: &[f64],
    ldb: usize,
    ncols_b: usize,
    c: &mut [f64],
    ldc: usize,
) {
    if alpha == 0.0 {
        return;
    }
    for k in 0..ncols_b {
        let b_col = &b[k * ldb..k * ldb + ldb];
        let c_col = &mut c[k * ldc..k * ldc + ldc];
        spmv(alpha, trans_a, indptr, indices, data, b_col, 1, c_col, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_reads_with_stride() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let idx = [0usize, 2];
        let vals = [2.0, 3.0];
        // stride 2 means logical positions 0 and 2 map to y[0] and y[4]
        assert_eq!(dot(&idx, &vals, &y, 2), 2.0 * y[0] + 3.0 * y[4]);
    }

    #[test]
    fn axpy_noop_on_zero_alpha() {
        let mut y = [1.0, 2.0, 3.0];
        let before = y;
        axpy(0.0, &[0, 1], &[5.0, 6.0], &mut y, 1);
        assert_eq!(y, before);
    }

    #[test]
    fn gather_and_zero_clears_source() {
        let mut y = [1.0, 2.0, 3.0];
        let mut x = [0.0, 0.0];
        gather_and_zero(&[0, 2], &mut y, 1, &mut x);
        assert_eq!(x, [1.0, 3.0]);
        assert_eq!(y, [0.0, 2.0, 0.0]);
    }

    #[test]
    fn spmv_matches_dense() {
        // A = [[1, 0, 2], [0, 3, 0]]
        let indptr = [0usize, 2, 3];
        let indices = [0usize, 2, 1];
        let data = [1.0, 2.0, 3.0];
        let x = [1.0, 2.0, 3.0];
        let mut y = [0.0, 0.0];
        spmv(1.0, false, &indptr, &indices, &data, &x, 1, &mut y, 1);
        assert_eq!(y, [1.0 * 1.0 + 2.0 * 3.0, 3.0 * 2.0]);
    }
}
