//! Serial routines for converting between matrix formats.
//!
//! All routines in this module are single-threaded. Most have an
//! equivalent `From`/`to_*` method on the relevant format; these free
//! functions exist for call sites (and tests) that want the conversion
//! spelled out explicitly, and for the in-place, memory-reusing COO
//! conversions, which have no sensible `From` signature since they
//! consume and mutate the source's backing arrays.

use std::ops::Add;

use nalgebra::{DMatrix, Dim, Matrix, RawStorage, Scalar};
use num_traits::Zero;

use super::utils::CountToOffsetIter;
use crate::coo::CooMatrix;
use crate::cs::csc::CscMatrix;
use crate::cs::csr::CsrMatrix;
use crate::cs::{CompressedColumnStorage, CompressedRowStorage, Compression, CsMatrix};

/// Converts a dense matrix to [`CooMatrix`].
pub fn convert_dense_coo<R, C, S>(dense: &Matrix<f64, R, C, S>) -> CooMatrix
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    crate::coo::convert_dense_coo(dense)
}

/// Converts a [`CooMatrix`] to a dense matrix, summing duplicates.
pub fn convert_coo_dense(coo: &CooMatrix) -> DMatrix<f64>
where
    f64: Scalar + Zero + Add<Output = f64>,
{
    coo.to_dense()
}

/// Converts a [`CooMatrix`] to a [`CsrMatrix`], coalescing duplicates by
/// summation.
pub fn convert_coo_csr(coo: CooMatrix) -> CsrMatrix {
    convert_coo_cs(coo, &Add::add)
}

/// Converts a [`CooMatrix`] to a [`CscMatrix`], coalescing duplicates by
/// summation.
pub fn convert_coo_csc(coo: CooMatrix) -> CscMatrix {
    convert_coo_cs(coo, &Add::add)
}

/// Converts a [`CsrMatrix`] to a [`CooMatrix`].
pub fn convert_csr_coo<MO, MI, D>(csr: &CsMatrix<MO, MI, D, CompressedRowStorage>) -> CooMatrix
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    let mut result = CooMatrix::new(csr.nrows(), csr.ncols());
    for (i, j, &v) in csr.triplet_iter() {
        result.push(i, j, v);
    }
    result
}

/// Converts a [`CscMatrix`] to a [`CooMatrix`].
pub fn convert_csc_coo<MO, MI, D>(csc: &CsMatrix<MO, MI, D, CompressedColumnStorage>) -> CooMatrix
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    let mut coo = CooMatrix::new(csc.nrows(), csc.ncols());
    for (i, j, &v) in csc.triplet_iter() {
        coo.push(i, j, v);
    }
    coo
}

/// Converts a [`CsrMatrix`] to a dense matrix.
pub fn convert_csr_dense<MO, MI, D>(csr: &CsMatrix<MO, MI, D, CompressedRowStorage>) -> DMatrix<f64>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    csr.to_dense()
}

/// Converts a [`CscMatrix`] to a dense matrix.
pub fn convert_csc_dense<MO, MI, D>(csc: &CsMatrix<MO, MI, D, CompressedColumnStorage>) -> DMatrix<f64>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    csc.to_dense()
}

/// Converts a dense matrix to a [`CsrMatrix`].
pub fn convert_dense_csr<R, C, S>(dense: &Matrix<f64, R, C, S>) -> CsrMatrix
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    let mut row_offsets = Vec::with_capacity(dense.nrows() + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    row_offsets.push(0);
    for i in 0..dense.nrows() {
        for j in 0..dense.ncols() {
            let v = *dense.index((i, j));
            if v != 0.0 {
                col_idx.push(j);
                values.push(v);
            }
        }
        row_offsets.push(col_idx.len());
    }

    unsafe { CsMatrix::from_parts_unchecked(dense.nrows(), dense.ncols(), row_offsets, col_idx, values) }
}

/// Converts a dense matrix to a [`CscMatrix`].
pub fn convert_dense_csc<R, C, S>(dense: &Matrix<f64, R, C, S>) -> CscMatrix
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    let mut col_offsets = Vec::with_capacity(dense.ncols() + 1);
    let mut row_idx = Vec::new();
    let mut values = Vec::new();

    col_offsets.push(0);
    for j in 0..dense.ncols() {
        for i in 0..dense.nrows() {
            let v = *dense.index((i, j));
            if v != 0.0 {
                row_idx.push(i);
                values.push(v);
            }
        }
        col_offsets.push(row_idx.len());
    }

    unsafe { CsMatrix::from_parts_unchecked(dense.nrows(), dense.ncols(), col_offsets, row_idx, values) }
}

/// Converts a [`CsrMatrix`] to a [`CscMatrix`], via a counting-sort over
/// columns (no intermediate COO is built).
pub fn convert_csr_csc<MO, MI, D>(csr: &CsMatrix<MO, MI, D, CompressedRowStorage>) -> CscMatrix
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    transpose_cs(csr)
}

/// Converts a [`CscMatrix`] to a [`CsrMatrix`], symmetric to
/// [`convert_csr_csc`].
pub fn convert_csc_csr<MO, MI, D>(csc: &CsMatrix<MO, MI, D, CompressedColumnStorage>) -> CsrMatrix
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
{
    transpose_cs(csc)
}

/// Reformats a `CsMatrix` into its sibling compression via a counting
/// sort keyed on the *minor* index of the source, which becomes the
/// major index of the target. Since [`CsMatrix::triplet_iter`] walks the
/// source in major-then-minor order, each destination bucket receives its
/// entries with strictly increasing old-major (= new-minor) index, so no
/// secondary sort of the scattered entries is needed.
fn transpose_cs<MO, MI, D, C>(m: &CsMatrix<MO, MI, D, C>) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C::Transpose>
where
    MO: std::borrow::Borrow<[usize]>,
    MI: std::borrow::Borrow<[usize]>,
    D: std::borrow::Borrow<[f64]>,
    C: Compression,
{
    let (nrows, ncols) = m.shape();
    let nmajor_out = C::Transpose::nmajor(nrows, ncols);

    let mut counts = vec![0usize; nmajor_out];
    for (row, col, _) in m.triplet_iter() {
        let (major, _) = C::Transpose::major_minor(row, col);
        counts[major] += 1;
    }

    let nnz = m.nnz();
    let offsets: Vec<usize> = CountToOffsetIter::new(counts).collect();

    let mut indices = vec![0usize; nnz];
    let mut data = vec![0.0f64; nnz];
    let mut cursor = offsets.clone();
    for (row, col, &v) in m.triplet_iter() {
        let (major, minor) = C::Transpose::major_minor(row, col);
        let pos = cursor[major];
        indices[pos] = minor;
        data[pos] = v;
        cursor[major] += 1;
    }

    unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) }
}

/// Converts a COO matrix to a `CsMatrix`, resolving duplicates with the
/// given combinator, by sorting triples lexicographically on
/// `(major, minor)` and then walking the sorted list once, merging
/// adjacent duplicates. This builds fresh storage; [`to_csr_reuse_mem`]
/// and [`to_csc_reuse_mem`] perform the equivalent conversion in place.
fn convert_coo_cs<C, F>(
    coo: CooMatrix,
    combinator: F,
) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C>
where
    C: Compression,
    F: Fn(f64, f64) -> f64,
{
    let nrows = coo.nrows();
    let ncols = coo.ncols();
    let nmajor = C::nmajor(nrows, ncols);

    let (coo_rows, coo_cols, coo_data) = coo.disassemble();

    let mut triplets: Vec<((usize, usize), f64)> = coo_rows
        .into_iter()
        .zip(coo_cols)
        .map(|(r, c)| C::major_minor(r, c))
        .zip(coo_data)
        .collect();

    // Sorting by (major, minor) lexicographically puts the triplets in
    // exactly the order the compressed format needs.
    triplets.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));

    let mut counts = vec![0usize; nmajor];
    let mut indices = Vec::with_capacity(triplets.len());
    let mut data = Vec::<f64>::with_capacity(triplets.len());

    let mut i_prev: Option<usize> = None;

    for ((i, j), val) in triplets {
        if let Some(i_prev) = i_prev {
            if i == i_prev {
                if let Some(&j_prev) = indices.last() {
                    if j == j_prev {
                        let prev_val = data.last_mut().unwrap();
                        *prev_val = combinator(*prev_val, val);
                        continue;
                    }
                }
            }
        }

        counts[i] += 1;
        indices.push(j);
        data.push(val);

        i_prev = Some(i);
    }

    let offsets = CountToOffsetIter::new(counts).collect();

    unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, offsets, indices, data) }
}

/// Converts a COO matrix to CSR in place, consuming and reusing its
/// backing arrays via a cycle-following permutation, rather than
/// allocating fresh `indices`/`data` arrays as [`convert_coo_csr`] does.
///
/// The algorithm: first build the row histogram and derive, for each
/// row, a running write cursor `w[i]` (the row's starting offset in the
/// final layout). Then permute each triple directly to its target slot
/// by following the cycle it belongs to, so every element is moved
/// exactly once. Finally the (now-sorted) row array is reinterpreted as
/// `indptr`. A final pass coalesces duplicates in place, walking a
/// "last-seen column per row" array.
pub fn to_csr_reuse_mem(coo: CooMatrix) -> CsrMatrix {
    let nrows = coo.nrows();
    let ncols = coo.ncols();
    let (mut rows, mut cols, mut data) = coo.disassemble();

    permute_in_place_by_major(nrows, &mut rows, &mut cols, &mut data);

    let indptr = histogram_to_indptr(nrows, &rows);
    let (indices, values) = dedupe_sorted(nrows, &indptr, cols, data);

    unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, indptr, indices, values) }
}

/// Converts a COO matrix to CSC in place, symmetric to
/// [`to_csr_reuse_mem`] with rows and columns swapped.
pub fn to_csc_reuse_mem(coo: CooMatrix) -> CscMatrix {
    let nrows = coo.nrows();
    let ncols = coo.ncols();
    let (mut rows, mut cols, mut data) = coo.disassemble();

    permute_in_place_by_major(ncols, &mut cols, &mut rows, &mut data);

    let indptr = histogram_to_indptr(ncols, &cols);
    let (indices, values) = dedupe_sorted(ncols, &indptr, rows, data);

    unsafe { CsMatrix::from_parts_unchecked(nrows, ncols, indptr, indices, values) }
}

/// Permutes `(major, minor, data)` in place so that `major` ends up
/// grouped and sorted, by following the cycle each element belongs to
/// (computed from a prefix-summed histogram of `major` values), rather
/// than sorting or allocating a second triple array.
fn permute_in_place_by_major(
    nmajor: usize,
    major: &mut [usize],
    minor: &mut [usize],
    data: &mut [f64],
) {
    let n = major.len();
    if n == 0 {
        return;
    }

    let mut counts = vec![0usize; nmajor + 1];
    for &m in major.iter() {
        counts[m + 1] += 1;
    }
    for i in 0..nmajor {
        counts[i + 1] += counts[i];
    }

    // `target[k]` is where the element originally at `k` must end up;
    // `w` tracks the next free slot for each major line as elements are
    // placed.
    let mut w = counts.clone();
    let mut target = vec![0usize; n];
    for k in 0..n {
        let m = major[k];
        target[k] = w[m];
        w[m] += 1;
    }

    let mut placed = vec![false; n];
    for start in 0..n {
        if placed[start] {
            continue;
        }
        let mut current = start;
        while !placed[current] {
            let dest = target[current];
            if dest == current {
                placed[current] = true;
                break;
            }
            major.swap(current, dest);
            minor.swap(current, dest);
            data.swap(current, dest);
            placed[current] = true;
            current = dest;
        }
    }
}

/// Turns a now-grouped `major` array into an `indptr` of length
/// `nmajor + 1` by a single counting pass (the array is already grouped
/// by [`permute_in_place_by_major`], so this is a histogram, not a sort).
fn histogram_to_indptr(nmajor: usize, major: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; nmajor];
    for &m in major {
        counts[m] += 1;
    }
    CountToOffsetIter::new(counts).collect()
}

/// Coalesces duplicate `(major, minor)` entries in place by summation,
/// walking a "last-seen minor per major line" array, after the data has
/// already been grouped (but not yet minor-sorted) by major.
fn dedupe_sorted(
    nmajor: usize,
    indptr: &[usize],
    mut minor: Vec<usize>,
    mut data: Vec<f64>,
) -> (Vec<usize>, Vec<f64>) {
    // Sort each major line by minor index so duplicates become adjacent
    // and the final lane is in canonical sorted order.
    for m in 0..nmajor {
        let lo = indptr[m];
        let hi = indptr[m + 1];
        let mut order: Vec<usize> = (lo..hi).collect();
        order.sort_unstable_by_key(|&k| minor[k]);
        let sorted_minor: Vec<usize> = order.iter().map(|&k| minor[k]).collect();
        let sorted_data: Vec<f64> = order.iter().map(|&k| data[k]).collect();
        minor[lo..hi].copy_from_slice(&sorted_minor);
        data[lo..hi].copy_from_slice(&sorted_data);
    }

    let mut out_minor = Vec::with_capacity(minor.len());
    let mut out_data = Vec::with_capacity(data.len());
    for m in 0..nmajor {
        let lo = indptr[m];
        let hi = indptr[m + 1];
        let mut last_seen: Option<usize> = None;
        for k in lo..hi {
            if last_seen == Some(minor[k]) {
                *out_data.last_mut().unwrap() += data[k];
            } else {
                out_minor.push(minor[k]);
                out_data.push(data[k]);
                last_seen = Some(minor[k]);
            }
        }
    }
    (out_minor, out_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn coo_from_dense_and_dense_from_coo_are_symmetric() {
        #[rustfmt::skip]
        let dense = DMatrix::<f64>::from_row_slice(2, 3, &[
            1.0, 0.0, 3.0,
            0.0, 5.0, 0.0,
        ]);

        let coo =
            CooMatrix::try_from_triplets(2, 3, vec![0, 1, 0], vec![0, 1, 2], vec![1.0, 5.0, 3.0])
                .unwrap();

        assert_eq!(convert_dense_coo(&dense), coo);
        assert_eq!(convert_coo_dense(&coo), dense);
    }

    #[test]
    fn csr_from_coo_has_expected_format() {
        let coo = {
            let mut coo = CooMatrix::new(3, 4);
            coo.push(1, 3, 4.0);
            coo.push(0, 1, 2.0);
            coo.push(2, 0, 1.0);
            coo.push(2, 3, 2.0);
            coo.push(2, 2, 1.0);
            coo
        };

        let converted_csr = convert_coo_csr(coo);
        assert_eq!(converted_csr.at(1, 3), 4.0);
        assert_eq!(converted_csr.at(0, 1), 2.0);
        assert_eq!(converted_csr.at(2, 0), 1.0);
        assert_eq!(converted_csr.at(2, 3), 2.0);
        assert_eq!(converted_csr.at(2, 2), 1.0);
        assert_eq!(converted_csr.nnz(), 5);
    }

    #[test]
    fn csr_from_coo_with_duplicates_sums() {
        let coo = {
            let mut coo = CooMatrix::new(3, 4);
            coo.push(1, 3, 4.0);
            coo.push(2, 3, 2.0);
            coo.push(0, 1, 2.0);
            coo.push(2, 0, 1.0);
            coo.push(2, 3, 2.0);
            coo.push(0, 1, 3.0);
            coo.push(2, 2, 1.0);
            coo
        };

        let converted = convert_coo_csr(coo);
        assert_eq!(converted.at(0, 1), 5.0);
        assert_eq!(converted.at(2, 3), 4.0);
    }

    #[test]
    fn to_csr_reuse_mem_matches_fresh_conversion() {
        let mut coo_a = CooMatrix::new(3, 4);
        let mut coo_b = CooMatrix::new(3, 4);
        for &(i, j, v) in &[(1usize, 3usize, 4.0), (2, 3, 2.0), (0, 1, 2.0), (2, 0, 1.0), (2, 3, 2.0)] {
            coo_a.push(i, j, v);
            coo_b.push(i, j, v);
        }

        let fresh = convert_coo_csr(coo_a);
        let reused = to_csr_reuse_mem(coo_b);
        assert_eq!(fresh.to_dense(), reused.to_dense());
    }

    #[test]
    fn csr_to_csc_reformats_rather_than_transposes() {
        // [[0, 4], [5, 0]] in CSR: row 0 has col 1 -> 4.0, row 1 has col 0 -> 5.0.
        let csr = CsrMatrix::try_from_parts(2, 2, vec![0, 1, 2], vec![1, 0], vec![4.0, 5.0]).unwrap();

        let csc = convert_csr_csc(&csr);
        // CSC major lines are columns: column 0 holds row 1 (5.0), column 1
        // holds row 0 (4.0) — the same matrix, not its transpose.
        assert_eq!(csc.major_offsets(), &[0, 1, 2]);
        assert_eq!(csc.minor_indices(), &[1, 0]);
        assert_eq!(csc.values(), &[5.0, 4.0]);
        assert_eq!(csc.to_dense(), csr.to_dense());
    }

    #[test]
    fn csr_csc_csr_round_trip_preserves_dense() {
        let csr = CsrMatrix::try_from_parts(
            3,
            4,
            vec![0, 1, 2, 5],
            vec![1, 3, 0, 2, 3],
            vec![5.0, 4.0, 1.0, 1.0, 4.0],
        )
        .unwrap();

        let csc = convert_csr_csc(&csr);
        let back = convert_csc_csr(&csc);
        assert_eq!(csr.to_dense(), back.to_dense());
    }

    #[test]
    fn csr_dense_conversion_is_reflective() {
        let csr = CsrMatrix::try_from_parts(
            3,
            4,
            vec![0, 3, 4, 6],
            vec![1, 2, 3, 0, 1, 3],
            vec![5.0, 3.0, 2.0, 2.0, 1.0, 4.0],
        )
        .unwrap();

        #[rustfmt::skip]
        let dense = DMatrix::<f64>::from_row_slice(3, 4, &[
            0.0, 5.0, 3.0, 2.0,
            2.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 4.0,
        ]);

        assert_eq!(convert_csr_dense(&csr), dense);
        let final_csr = convert_dense_csr(&dense);
        assert_eq!(csr.to_dense(), final_csr.to_dense());
    }
}
