//! The shared compressed-sparse core behind [`csr::CsrMatrix`] and
//! [`csc::CscMatrix`].
//!
//! Both formats are the same data structure — an `indptr`/`indices`/`data`
//! triplet (see `SPEC_FULL.md` §3) — differing only in which axis is
//! "major". [`CsMatrix`] carries that difference as a zero-sized
//! [`Compression`] marker type parameter, so the two formats share every
//! algorithm in this module and only diverge where the spec says they
//! must (row vs. column views, `T()`).
//!
//! [`CsMatrix`] is additionally generic over its backing storage (`MO`,
//! `MI`, `D`, all `Borrow<[_]>`), so that a matrix can either own its
//! arrays (`Vec<usize>`/`Vec<f64>`) or borrow caller-provided ones
//! (`&[usize]`/`&[f64]`), per the "shared-storage constructors" design
//! note in `SPEC_FULL.md` §9.

pub mod csc;
pub mod csr;

use std::borrow::Borrow;
use std::marker::PhantomData;

use nalgebra::DMatrix;

use crate::vector::SparseVector;

mod private {
    pub trait Sealed {}
}

/// Marks which axis (row or column) is the "major" axis of a compressed
/// format. Sealed: the only implementors are [`CompressedRowStorage`] and
/// [`CompressedColumnStorage`].
pub trait Compression: private::Sealed + Copy + Clone + std::fmt::Debug + PartialEq + Eq {
    /// The sibling compression that a structural transpose produces.
    type Transpose: Compression<Transpose = Self>;

    /// Number of major lines for a matrix of shape `(rows, cols)`.
    fn nmajor(rows: usize, cols: usize) -> usize;
    /// Number of minor positions per major line for shape `(rows, cols)`.
    fn nminor(rows: usize, cols: usize) -> usize;
    /// Maps `(row, col)` to `(major, minor)`.
    fn major_minor(row: usize, col: usize) -> (usize, usize);
    /// Maps `(major, minor)` back to `(row, col)`.
    fn row_col(major: usize, minor: usize) -> (usize, usize);
}

/// Row-major compression: CSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedRowStorage;

/// Column-major compression: CSC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedColumnStorage;

impl private::Sealed for CompressedRowStorage {}
impl private::Sealed for CompressedColumnStorage {}

impl Compression for CompressedRowStorage {
    type Transpose = CompressedColumnStorage;

    fn nmajor(rows: usize, _cols: usize) -> usize {
        rows
    }

    fn nminor(_rows: usize, cols: usize) -> usize {
        cols
    }

    fn major_minor(row: usize, col: usize) -> (usize, usize) {
        (row, col)
    }

    fn row_col(major: usize, minor: usize) -> (usize, usize) {
        (major, minor)
    }
}

impl Compression for CompressedColumnStorage {
    type Transpose = CompressedRowStorage;

    fn nmajor(_rows: usize, cols: usize) -> usize {
        cols
    }

    fn nminor(rows: usize, _cols: usize) -> usize {
        rows
    }

    fn major_minor(row: usize, col: usize) -> (usize, usize) {
        (col, row)
    }

    fn row_col(major: usize, minor: usize) -> (usize, usize) {
        (minor, major)
    }
}

/// The shared compressed-sparse representation behind CSR and CSC.
///
/// `MO` holds the `major + 1`-length offsets array ("indptr"), `MI` holds
/// the minor indices, and `D` holds the values, each possibly owned
/// (`Vec<_>`) or borrowed (`&[_]`).
#[derive(Debug, Clone, PartialEq)]
pub struct CsMatrix<MO, MI, D, C: Compression> {
    nrows: usize,
    ncols: usize,
    major_offsets: MO,
    minor_indices: MI,
    data: D,
    _compression: PhantomData<C>,
}

impl<MO, MI, D, C> CsMatrix<MO, MI, D, C>
where
    MO: Borrow<[usize]>,
    MI: Borrow<[usize]>,
    D: Borrow<[f64]>,
    C: Compression,
{
    /// Assembles a matrix from already-validated parts without checking
    /// the structural invariants (non-decreasing offsets, sorted minor
    /// indices). In debug builds the invariants are checked anyway via
    /// `debug_assert!`; in release builds violating them is a logic
    /// error that will surface as incorrect results, not memory unsafety
    /// — despite the name, this does not require `unsafe` in this crate's
    /// all-safe-Rust realization, but is named and marked `unsafe` to
    /// keep it visibly a "trust me" constructor, matching the teacher's
    /// own convention.
    ///
    /// # Safety
    ///
    /// The caller must ensure `major_offsets` has `nmajor + 1` entries,
    /// is non-decreasing, starts at `0`, and ends at `data.len()`; and
    /// that within each major line, `minor_indices` is strictly
    /// increasing.
    pub unsafe fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        major_offsets: MO,
        minor_indices: MI,
        data: D,
    ) -> Self {
        let nmajor = C::nmajor(nrows, ncols);
        debug_assert_eq!(major_offsets.borrow().len(), nmajor + 1);
        debug_assert_eq!(major_offsets.borrow()[0], 0);
        debug_assert_eq!(*major_offsets.borrow().last().unwrap(), data.borrow().len());
        debug_assert!(major_offsets.borrow().windows(2).all(|w| w[0] <= w[1]));
        debug_assert_eq!(minor_indices.borrow().len(), data.borrow().len());
        debug_assert!(major_offsets.borrow().windows(2).all(|w| {
            minor_indices.borrow()[w[0]..w[1]].windows(2).all(|mw| mw[0] < mw[1])
        }));
        Self {
            nrows,
            ncols,
            major_offsets,
            minor_indices,
            data,
            _compression: PhantomData,
        }
    }

    /// The matrix shape, `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.data.borrow().len()
    }

    /// The `nmajor + 1`-length offsets array.
    pub fn major_offsets(&self) -> &[usize] {
        self.major_offsets.borrow()
    }

    /// The minor-index array, concatenated across all major lines.
    pub fn minor_indices(&self) -> &[usize] {
        self.minor_indices.borrow()
    }

    /// The stored values, concatenated across all major lines.
    pub fn values(&self) -> &[f64] {
        self.data.borrow()
    }

    fn nmajor(&self) -> usize {
        C::nmajor(self.nrows, self.ncols)
    }

    /// The value at `(row, col)`, found via binary search over the
    /// sorted minor indices of the relevant major line. Returns `0.0` if
    /// not stored.
    ///
    /// # Panics
    ///
    /// Panics if `row >= nrows` or `col >= ncols`.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        let (major, minor) = C::major_minor(row, col);
        let offsets = self.major_offsets.borrow();
        let lane = &self.minor_indices.borrow()[offsets[major]..offsets[major + 1]];
        match lane.binary_search(&minor) {
            Ok(k) => self.data.borrow()[offsets[major] + k],
            Err(_) => 0.0,
        }
    }

    /// Calls `f(row, col, value)` for every stored entry, in
    /// major-then-minor order.
    pub fn do_non_zero(&self, mut f: impl FnMut(usize, usize, f64)) {
        let offsets = self.major_offsets.borrow();
        let indices = self.minor_indices.borrow();
        let data = self.data.borrow();
        for major in 0..self.nmajor() {
            for k in offsets[major]..offsets[major + 1] {
                let (row, col) = C::row_col(major, indices[k]);
                f(row, col, data[k]);
            }
        }
    }

    /// Calls `f(row, col, value)` for every stored entry of a single
    /// major line (a row of CSR, or a column of CSC).
    pub fn do_major_non_zero(&self, major: usize, mut f: impl FnMut(usize, usize, f64)) {
        let offsets = self.major_offsets.borrow();
        let indices = self.minor_indices.borrow();
        let data = self.data.borrow();
        for k in offsets[major]..offsets[major + 1] {
            let (row, col) = C::row_col(major, indices[k]);
            f(row, col, data[k]);
        }
    }

    /// Iterates `(row, col, &value)` triples in major-then-minor order.
    pub fn triplet_iter(&self) -> TripletIter<'_, C> {
        TripletIter {
            offsets: self.major_offsets.borrow(),
            indices: self.minor_indices.borrow(),
            data: self.data.borrow(),
            major: 0,
            k: 0,
            _compression: PhantomData::<C>,
        }
    }

    /// Iterates over each major line as an iterator of `(minor, &value)`.
    pub fn minor_lane_iter(&self) -> impl Iterator<Item = impl Iterator<Item = (usize, &f64)>> {
        let offsets = self.major_offsets.borrow();
        let indices = self.minor_indices.borrow();
        let data = self.data.borrow();
        (0..self.nmajor()).map(move |major| {
            let lo = offsets[major];
            let hi = offsets[major + 1];
            indices[lo..hi].iter().copied().zip(data[lo..hi].iter())
        })
    }

    /// A read-only view of major line `i` that borrows directly from
    /// `self`'s backing storage rather than copying it — the Rust
    /// realization of the spec's "native-axis slice shares storage with
    /// the matrix": Rust's borrow checker makes a *mutable* shared view
    /// unsound without `unsafe`, so this crate offers the read-only
    /// subset of [`SparseVector`]'s API as a zero-copy [`LaneView`]
    /// instead (see `DESIGN.md`).
    pub fn major_lane_view(&self, i: usize) -> LaneView<'_> {
        let offsets = self.major_offsets.borrow();
        let lo = offsets[i];
        let hi = offsets[i + 1];
        LaneView {
            len: C::nminor(self.nrows, self.ncols),
            ind: &self.minor_indices.borrow()[lo..hi],
            data: &self.data.borrow()[lo..hi],
        }
    }

    /// The stored entries of major line `i` as a fresh, owned
    /// [`SparseVector`], sharing no storage with `self`.
    pub fn major_lane_vector(&self, i: usize) -> SparseVector {
        let offsets = self.major_offsets.borrow();
        let nminor = C::nminor(self.nrows, self.ncols);
        let lo = offsets[i];
        let hi = offsets[i + 1];
        SparseVector::from_sorted_parts(
            nminor,
            self.minor_indices.borrow()[lo..hi].to_vec(),
            self.data.borrow()[lo..hi].to_vec(),
        )
    }

    /// A dense copy of major line `i`.
    pub fn raw_major_view(&self, i: usize) -> Vec<f64> {
        let nminor = C::nminor(self.nrows, self.ncols);
        let mut out = vec![0.0; nminor];
        self.do_major_non_zero(i, |row, col, v| {
            let (_, minor) = C::major_minor(row, col);
            out[minor] = v;
        });
        out
    }

    /// A fresh, owned deep copy.
    pub fn to_owned_cs(&self) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C> {
        CsMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            major_offsets: self.major_offsets.borrow().to_vec(),
            minor_indices: self.minor_indices.borrow().to_vec(),
            data: self.data.borrow().to_vec(),
            _compression: PhantomData,
        }
    }

    /// A dense rendering of this matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut out = DMatrix::<f64>::zeros(self.nrows, self.ncols);
        self.do_non_zero(|i, j, v| out[(i, j)] += v);
        out
    }

    /// Removes every stored entry with `|value| < eps`, compacting the
    /// arrays in a single pass. Requires owned storage.
    pub fn cull(&mut self, eps: f64)
    where
        MO: AsMut<Vec<usize>> + Borrow<[usize]>,
        MI: AsMut<Vec<usize>>,
        D: AsMut<Vec<f64>>,
    {
        let nmajor = self.nmajor();
        let old_offsets: Vec<usize> = self.major_offsets.borrow().to_vec();
        let indices = self.minor_indices.as_mut();
        let data = self.data.as_mut();

        let mut write = 0usize;
        let mut new_offsets = Vec::with_capacity(nmajor + 1);
        new_offsets.push(0);
        for major in 0..nmajor {
            for read in old_offsets[major]..old_offsets[major + 1] {
                if data[read].abs() >= eps {
                    indices[write] = indices[read];
                    data[write] = data[read];
                    write += 1;
                }
            }
            new_offsets.push(write);
        }
        indices.truncate(write);
        data.truncate(write);
        *self.major_offsets.as_mut() = new_offsets;
    }

    /// Consumes the matrix, returning its raw `(major_offsets,
    /// minor_indices, data)` arrays.
    pub fn disassemble(self) -> (MO, MI, D) {
        (self.major_offsets, self.minor_indices, self.data)
    }

    /// A zero-copy structural transpose: reinterprets the same
    /// `major_offsets`/`minor_indices`/`data` arrays as the sibling
    /// compression, with `(rows, cols)` swapped. This is what makes
    /// `CsrMatrix::T()` return (the equivalent of) a `CscMatrix` without
    /// touching the backing storage.
    pub fn transpose(self) -> CsMatrix<MO, MI, D, C::Transpose> {
        CsMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            major_offsets: self.major_offsets,
            minor_indices: self.minor_indices,
            data: self.data,
            _compression: PhantomData,
        }
    }
}

impl<C: Compression> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C> {
    /// Validating constructor: checks that `major_offsets` has the right
    /// length, starts at zero, ends at `data.len()`, is non-decreasing,
    /// and that minor indices are sorted and in-bounds within each major
    /// line.
    pub fn try_from_parts(
        nrows: usize,
        ncols: usize,
        major_offsets: Vec<usize>,
        minor_indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, String> {
        let nmajor = C::nmajor(nrows, ncols);
        let nminor = C::nminor(nrows, ncols);
        if major_offsets.len() != nmajor + 1 {
            return Err(format!(
                "expected {} major offsets, got {}",
                nmajor + 1,
                major_offsets.len()
            ));
        }
        if major_offsets[0] != 0 {
            return Err("major offsets must start at 0".into());
        }
        if *major_offsets.last().unwrap() != data.len() {
            return Err("last major offset must equal data length".into());
        }
        if minor_indices.len() != data.len() {
            return Err("minor index and data arrays must have equal length".into());
        }
        if !major_offsets.windows(2).all(|w| w[0] <= w[1]) {
            return Err("major offsets must be non-decreasing".into());
        }
        for w in major_offsets.windows(2) {
            let lane = &minor_indices[w[0]..w[1]];
            if !lane.windows(2).all(|mw| mw[0] < mw[1]) {
                return Err("minor indices must be strictly sorted within each major line".into());
            }
            if lane.last().map_or(false, |&m| m >= nminor) {
                return Err("minor index out of range".into());
            }
        }
        Ok(Self {
            nrows,
            ncols,
            major_offsets,
            minor_indices,
            data,
            _compression: PhantomData,
        })
    }

    /// An `nrows` by `ncols` matrix with no stored entries.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        let nmajor = C::nmajor(nrows, ncols);
        Self {
            nrows,
            ncols,
            major_offsets: vec![0; nmajor + 1],
            minor_indices: Vec::new(),
            data: Vec::new(),
            _compression: PhantomData,
        }
    }

    /// A zero-copy structural transpose that materializes an owned copy,
    /// for call sites that need an owned `CsMatrix` back (e.g. after
    /// combining it with `transpose()` on a borrowed view).
    pub fn transpose_owned(self) -> CsMatrix<Vec<usize>, Vec<usize>, Vec<f64>, C::Transpose> {
        self.transpose()
    }

    /// Updates `(row, col)` to `v`. If absent and `v == 0.0`, does
    /// nothing. If present, updates the value in place (no structural
    /// change). If absent and `v != 0.0`, inserts at the correct sorted
    /// position within the major line, shifting the tail of the index
    /// and data arrays and bumping every subsequent offset.
    ///
    /// # Panics
    ///
    /// Panics if `row >= nrows` or `col >= ncols`.
    pub fn set(&mut self, row: usize, col: usize, v: f64) {
        assert!(row < self.nrows && col < self.ncols, "index ({row}, {col}) out of range");
        let (major, minor) = C::major_minor(row, col);
        let lo = self.major_offsets[major];
        let hi = self.major_offsets[major + 1];
        match self.minor_indices[lo..hi].binary_search(&minor) {
            Ok(k) => {
                if v == 0.0 {
                    self.minor_indices.remove(lo + k);
                    self.data.remove(lo + k);
                    for off in &mut self.major_offsets[major + 1..] {
                        *off -= 1;
                    }
                } else {
                    self.data[lo + k] = v;
                }
            }
            Err(k) => {
                if v != 0.0 {
                    self.minor_indices.insert(lo + k, minor);
                    self.data.insert(lo + k, v);
                    for off in &mut self.major_offsets[major + 1..] {
                        *off += 1;
                    }
                }
            }
        }
    }
}

/// A read-only, zero-copy view of one major line (a CSR row or a CSC
/// column), borrowing its index and value slices straight out of the
/// owning matrix.
#[derive(Debug, Clone, Copy)]
pub struct LaneView<'a> {
    len: usize,
    ind: &'a [usize],
    data: &'a [f64],
}

impl<'a> LaneView<'a> {
    /// The logical length of the lane (the matrix's minor dimension).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the lane has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of explicitly stored entries in this lane.
    pub fn nnz(&self) -> usize {
        self.ind.len()
    }

    /// The sorted minor indices stored in this lane.
    pub fn indices(&self) -> &'a [usize] {
        self.ind
    }

    /// The values parallel to [`LaneView::indices`].
    pub fn values(&self) -> &'a [f64] {
        self.data
    }

    /// The value at minor position `minor`, or `0.0` if not stored.
    pub fn at(&self, minor: usize) -> f64 {
        assert!(minor < self.len, "minor index {minor} out of range");
        match self.ind.binary_search(&minor) {
            Ok(k) => self.data[k],
            Err(_) => 0.0,
        }
    }

    /// A dense rendering of this lane.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len];
        for (&i, &v) in self.ind.iter().zip(self.data) {
            out[i] = v;
        }
        out
    }
}

/// Iterator over `(row, col, &value)` triples of a [`CsMatrix`], in
/// major-then-minor order.
pub struct TripletIter<'a, C> {
    offsets: &'a [usize],
    indices: &'a [usize],
    data: &'a [f64],
    major: usize,
    k: usize,
    _compression: PhantomData<C>,
}

impl<'a, C: Compression> Iterator for TripletIter<'a, C> {
    type Item = (usize, usize, &'a f64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.major + 1 >= self.offsets.len() {
                return None;
            }
            if self.k >= self.offsets[self.major + 1] {
                self.major += 1;
                continue;
            }
            let k = self.k;
            self.k += 1;
            let (row, col) = C::row_col(self.major, self.indices[k]);
            return Some((row, col, &self.data[k]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csr::CsrMatrix;

    #[test]
    fn set_inserts_sorted() {
        let mut m = CsrMatrix::zeros(3, 3);
        m.set(1, 2, 5.0);
        m.set(1, 0, 3.0);
        assert_eq!(m.at(1, 2), 5.0);
        assert_eq!(m.at(1, 0), 3.0);
        assert_eq!(m.minor_indices(), &[0, 2]);
    }

    #[test]
    fn set_then_at_round_trips() {
        let mut m = CsrMatrix::zeros(2, 2);
        m.set(0, 0, 1.0);
        m.set(0, 1, 2.0);
        m.set(0, 0, 0.0);
        assert_eq!(m.at(0, 0), 0.0);
        assert_eq!(m.at(0, 1), 2.0);
    }

    #[test]
    fn transpose_shares_arrays_swaps_shape() {
        let m = CsrMatrix::try_from_parts(2, 3, vec![0, 1, 2], vec![2, 0], vec![1.0, 2.0]).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.at(2, 0), 1.0);
        assert_eq!(t.at(0, 1), 2.0);
    }

    #[test]
    fn cull_removes_small_entries() {
        let mut m =
            CsrMatrix::try_from_parts(1, 3, vec![0, 3], vec![0, 1, 2], vec![1e-20, 1.0, 2.0])
                .unwrap();
        m.cull(1e-9);
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.at(0, 0), 0.0);
        assert_eq!(m.at(0, 1), 1.0);
    }
}
