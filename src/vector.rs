//! Sparse vectors and the sparse accumulator (SPA).
//!
//! A [`SparseVector`] holds a sorted, duplicate-free `(index, value)`
//! list. All mutating operations keep that invariant, and guard against
//! the receiver aliasing one of its operands (see [`crate::pool::alias`])
//! by staging the result through a pooled temporary and swapping it in.

use crate::blas;
use crate::pool::{alias, pool};

/// A sparse vector of length `len`, holding sorted, duplicate-free
/// `(index, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    len: usize,
    ind: Vec<usize>,
    data: Vec<f64>,
}

impl SparseVector {
    /// Creates an empty sparse vector of the given length.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ind: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Builds a sparse vector directly from sorted, duplicate-free parts.
    ///
    /// # Panics
    ///
    /// Panics (debug builds only) if `ind` is not strictly increasing, or
    /// contains an index `>= len`.
    pub fn from_sorted_parts(len: usize, ind: Vec<usize>, data: Vec<f64>) -> Self {
        debug_assert_eq!(ind.len(), data.len());
        debug_assert!(ind.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(ind.last().map_or(true, |&i| i < len));
        Self { len, ind, data }
    }

    /// The logical length of the vector.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.ind.len()
    }

    /// The sum of the backing arrays' capacities, used by the workspace
    /// pool to decide whether a released vector is worth retaining.
    pub(crate) fn capacity(&self) -> usize {
        self.ind.capacity() + self.data.capacity()
    }

    /// The sorted stored indices.
    pub fn indices(&self) -> &[usize] {
        &self.ind
    }

    /// The values parallel to [`SparseVector::indices`].
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    fn position(&self, i: usize) -> Result<usize, usize> {
        self.ind.binary_search(&i)
    }

    /// The value at index `i`, or `0.0` if not stored.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn at(&self, i: usize) -> f64 {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        match self.position(i) {
            Ok(k) => self.data[k],
            Err(_) => 0.0,
        }
    }

    /// Sets the value at index `i`. Setting `0.0` removes any stored
    /// entry at that position.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn set(&mut self, i: usize, v: f64) {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        match self.position(i) {
            Ok(k) => {
                if v == 0.0 {
                    self.ind.remove(k);
                    self.data.remove(k);
                } else {
                    self.data[k] = v;
                }
            }
            Err(k) => {
                if v != 0.0 {
                    self.ind.insert(k, i);
                    self.data.insert(k, v);
                }
            }
        }
    }

    /// Resets this vector to an empty vector of the given length, reusing
    /// its backing storage. Used by [`crate::pool::WorkspacePool`].
    pub(crate) fn reset_to_length(&mut self, len: usize) {
        self.len = len;
        self.ind.clear();
        self.data.clear();
    }

    /// Empties the vector, setting its length to zero.
    pub fn reset(&mut self) {
        self.len = 0;
        self.ind.clear();
        self.data.clear();
    }

    /// Calls `f(i, 0, v)` for every stored entry, in ascending `i` order.
    pub fn do_non_zero(&self, mut f: impl FnMut(usize, usize, f64)) {
        for (&i, &v) in self.ind.iter().zip(&self.data) {
            f(i, 0, v);
        }
    }

    /// A dense rendering of this vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len];
        for (&i, &v) in self.ind.iter().zip(&self.data) {
            out[i] = v;
        }
        out
    }

    /// Copies the contents of `src` into `self`, reusing `self`'s backing
    /// storage where possible.
    pub fn clone_from_vec(&mut self, src: &SparseVector) {
        self.len = src.len;
        self.ind.clear();
        self.ind.extend_from_slice(&src.ind);
        self.data.clear();
        self.data.extend_from_slice(&src.data);
    }

    /// Gathers `dense[indices[k]] -> self[k]`'s positions, i.e. fills
    /// `self`'s stored values by reading `dense` at `self`'s stored
    /// indices. `dense` must have the same length as `self`.
    pub fn gather(&mut self, dense: &[f64]) {
        assert_eq!(dense.len(), self.len, "shape mismatch in gather");
        for (&i, v) in self.ind.iter().zip(self.data.iter_mut()) {
            *v = dense[i];
        }
    }

    /// Like [`SparseVector::gather`], but additionally zeroes the
    /// gathered positions of `dense`.
    pub fn gather_and_zero(&mut self, dense: &mut [f64]) {
        assert_eq!(dense.len(), self.len, "shape mismatch in gather_and_zero");
        for (&i, v) in self.ind.iter().zip(self.data.iter_mut()) {
            *v = dense[i];
            dense[i] = 0.0;
        }
    }

    /// Scatters this vector's stored values into `dense` at their stored
    /// positions. `dense` must have the same length as `self`.
    pub fn scatter(&self, dense: &mut [f64]) {
        assert_eq!(dense.len(), self.len, "shape mismatch in scatter");
        blas::scatter(&self.ind, &self.data, dense, 1);
    }

    /// The L-norm of the stored values: `L=2` is `sqrt(sum(d^2))`, any
    /// other `L` is the generic `(sum(|d|^L))^(1/L)`.
    pub fn norm(&self, l: i32) -> f64 {
        if l == 2 {
            self.data.iter().map(|d| d * d).sum::<f64>().sqrt()
        } else {
            self.data
                .iter()
                .map(|d| d.abs().powi(l))
                .sum::<f64>()
                .powf(1.0 / l as f64)
        }
    }

    fn overlaps(&self, other: &SparseVector) -> bool {
        alias::overlaps(&self.ind, &other.ind) || alias::overlaps(&self.data, &other.data)
    }

    /// Replaces `self` with `a + alpha * b`, staging through a pooled
    /// temporary if `self` aliases `a` or `b`.
    pub fn add_scaled(&mut self, a: &SparseVector, alpha: f64, b: &SparseVector) {
        assert_eq!(a.len, b.len, "shape mismatch in sparse vector add");
        if self.overlaps(a) || self.overlaps(b) {
            let mut tmp = pool().acquire_vector(a.len);
            merge_add_scaled(&mut tmp, a, alpha, b);
            pool().release_vector(std::mem::replace(self, tmp));
        } else {
            self.reset_to_length(a.len);
            merge_add_scaled(self, a, alpha, b);
        }
    }

    /// Replaces `self` with `a + b`.
    pub fn add(&mut self, a: &SparseVector, b: &SparseVector) {
        self.add_scaled(a, 1.0, b);
    }

    /// Replaces `self` with `alpha * a`. `alpha == 0.0` yields an empty
    /// vector of the correct length.
    pub fn scale(&mut self, alpha: f64, a: &SparseVector) {
        if self.overlaps(a) {
            let mut tmp = pool().acquire_vector(a.len);
            scale_into(&mut tmp, alpha, a);
            pool().release_vector(std::mem::replace(self, tmp));
        } else {
            self.reset_to_length(a.len);
            scale_into(self, alpha, a);
        }
    }

    /// Replaces `self` with the element-wise product of `a` and `b`.
    pub fn mul_elem(&mut self, a: &SparseVector, b: &SparseVector) {
        assert_eq!(a.len, b.len, "shape mismatch in element-wise product");
        let mut ind = Vec::new();
        let mut data = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.ind.len() && j < b.ind.len() {
            match a.ind[i].cmp(&b.ind[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    let v = a.data[i] * b.data[j];
                    if v != 0.0 {
                        ind.push(a.ind[i]);
                        data.push(v);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        self.len = a.len;
        self.ind = ind;
        self.data = data;
    }
}

fn scale_into(dst: &mut SparseVector, alpha: f64, a: &SparseVector) {
    dst.len = a.len;
    dst.ind.clear();
    dst.data.clear();
    if alpha == 0.0 {
        return;
    }
    dst.ind.extend_from_slice(&a.ind);
    dst.data.extend(a.data.iter().map(|v| v * alpha));
}

fn merge_add_scaled(dst: &mut SparseVector, a: &SparseVector, alpha: f64, b: &SparseVector) {
    dst.len = a.len;
    dst.ind.clear();
    dst.data.clear();
    let (mut i, mut j) = (0, 0);
    while i < a.ind.len() && j < b.ind.len() {
        match a.ind[i].cmp(&b.ind[j]) {
            std::cmp::Ordering::Less => {
                dst.ind.push(a.ind[i]);
                dst.data.push(a.data[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                dst.ind.push(b.ind[j]);
                dst.data.push(alpha * b.data[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                let v = a.data[i] + alpha * b.data[j];
                if v != 0.0 {
                    dst.ind.push(a.ind[i]);
                    dst.data.push(v);
                }
                i += 1;
                j += 1;
            }
        }
    }
    dst.ind.extend_from_slice(&a.ind[i..]);
    dst.data.extend_from_slice(&a.data[i..]);
    dst.ind.extend(&b.ind[j..]);
    dst.data
        .extend(b.data[j..].iter().map(|v| alpha * v));
}

/// Computes the dot product of two sparse vectors, or a sparse vector
/// against a dense one, dispatching on which representation is cheaper:
///
/// - both sparse: scatter the shorter one into a pooled dense buffer,
///   then run [`blas::dot`] using the other's stored positions;
/// - sparse against dense: direct [`blas::dot`];
/// - both dense: delegate to `nalgebra`'s `Dot`.
pub fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    assert_eq!(a.len, b.len, "shape mismatch in sparse dot product");
    let mut scratch = pool().acquire_floats(a.len, true);
    b.scatter(&mut scratch);
    let result = blas::dot(&a.ind, &a.data, &scratch, 1);
    pool().release_floats(scratch);
    result
}

/// Dot product of a sparse vector against a dense slice.
pub fn dot_dense(a: &SparseVector, dense: &[f64]) -> f64 {
    assert_eq!(a.len, dense.len(), "shape mismatch in sparse/dense dot product");
    blas::dot(&a.ind, &a.data, dense, 1)
}

/// A sparse accumulator (SPA): a dense length-`n` buffer plus a list of
/// "touched" indices, used to sum sparse vectors in `O(nnz)` time without
/// re-zeroing the whole buffer between uses. [`Accumulator::scatter_add`]
/// accumulates a scaled sparse row/column into the buffer; [`Accumulator::gather_sorted`]
/// drains it back into a sorted `(index, value)` pair of vectors and
/// clears exactly the touched positions, ready for reuse.
pub struct Accumulator {
    dense: Vec<f64>,
    touched: Vec<usize>,
    marker: Vec<bool>,
}

impl Accumulator {
    /// Creates an accumulator over `n` positions, all initially zero.
    pub fn new(n: usize) -> Self {
        Self {
            dense: vec![0.0; n],
            touched: Vec::new(),
            marker: vec![false; n],
        }
    }

    /// Accumulates `alpha * x` into the buffer at `x`'s stored positions.
    pub fn scatter_add(&mut self, alpha: f64, indices: &[usize], values: &[f64]) {
        for (&i, &v) in indices.iter().zip(values) {
            if !self.marker[i] {
                self.marker[i] = true;
                self.touched.push(i);
            }
            self.dense[i] += alpha * v;
        }
    }

    /// Drains the accumulator into sorted `(indices, values)`, dropping
    /// any position that ended up exactly zero, and resets the touched
    /// markers so the accumulator is ready for the next row.
    pub fn gather_sorted(&mut self) -> (Vec<usize>, Vec<f64>) {
        self.touched.sort_unstable();
        let mut indices = Vec::with_capacity(self.touched.len());
        let mut values = Vec::with_capacity(self.touched.len());
        for &i in &self.touched {
            let v = self.dense[i];
            if v != 0.0 {
                indices.push(i);
                values.push(v);
            }
            self.dense[i] = 0.0;
            self.marker[i] = false;
        }
        self.touched.clear();
        (indices, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(len: usize, pairs: &[(usize, f64)]) -> SparseVector {
        let ind = pairs.iter().map(|p| p.0).collect();
        let data = pairs.iter().map(|p| p.1).collect();
        SparseVector::from_sorted_parts(len, ind, data)
    }

    #[test]
    fn set_zero_removes_entry() {
        let mut a = v(4, &[(1, 2.0), (2, 3.0)]);
        a.set(1, 0.0);
        assert_eq!(a.indices(), &[2]);
    }

    #[test]
    fn set_nonexistent_zero_is_noop() {
        let mut a = v(4, &[(1, 2.0)]);
        a.set(0, 0.0);
        assert_eq!(a.indices(), &[1]);
    }

    #[test]
    fn add_on_identical_supports_matches_dense() {
        // a = {(1,1),(3,2),(4,1)} over len=6, b = {(0,1),(1,1),(3,1)} over len=6
        let a = v(6, &[(1, 1.0), (3, 2.0), (4, 1.0)]);
        let b = v(6, &[(0, 1.0), (1, 1.0), (3, 1.0)]);
        let mut out = SparseVector::new(6);
        out.add(&a, &b);
        assert_eq!(out.to_dense(), vec![1.0, 2.0, 0.0, 3.0, 1.0, 0.0]);
        assert!(out.indices().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn norm2_equals_sqrt_dot() {
        let a = v(5, &[(0, 3.0), (4, 4.0)]);
        assert!((a.norm(2) - dot(&a, &a).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn in_place_add_with_aliased_receiver() {
        let mut a = v(4, &[(0, 1.0), (2, 1.0)]);
        let b = v(4, &[(1, 5.0)]);
        let a_clone = a.clone();
        a.add(&a_clone, &b);
        assert_eq!(a.to_dense(), vec![1.0, 5.0, 1.0, 0.0]);
    }

    #[test]
    fn scale_by_zero_yields_empty() {
        let a = v(3, &[(0, 1.0), (1, 2.0)]);
        let mut out = SparseVector::new(3);
        out.scale(0.0, &a);
        assert_eq!(out.nnz(), 0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn accumulator_drains_sorted_and_drops_zero() {
        let mut spa = Accumulator::new(5);
        spa.scatter_add(1.0, &[3, 1], &[2.0, 4.0]);
        spa.scatter_add(-1.0, &[3], &[2.0]);
        let (idx, val) = spa.gather_sorted();
        assert_eq!(idx, vec![1]);
        assert_eq!(val, vec![4.0]);
    }
}
