//! Process-wide workspace pool.
//!
//! Sparse arithmetic in a hot loop allocates scratch buffers constantly:
//! an index array here, a dense accumulator there, a header for an
//! intermediate matrix. [`WorkspacePool`] hands out and reclaims exactly
//! those four kinds of scratch so that repeated calls to e.g.
//! [`crate::ops::serial::spmul`] don't pay for an allocation on every
//! row. It is a performance optimisation, never a correctness
//! requirement — every acquire path has a plain-allocation fallback.

use std::sync::{Mutex, OnceLock};

use crate::vector::SparseVector;

/// Buffers shorter than this are simply dropped on release rather than
/// pooled, so that a flood of tiny scratch allocations doesn't leave the
/// pool holding thousands of near-useless buffers.
pub const MIN_POOL_CAPACITY: usize = 200;

/// A process-wide, thread-safe free-list of reusable scratch buffers.
///
/// Obtain the shared instance with [`pool`]. [`WorkspacePool::new`] is
/// exposed for tests and for embedding a private pool.
pub struct WorkspacePool {
    #[allow(dead_code)]
    ints: Mutex<Vec<Vec<usize>>>,
    floats: Mutex<Vec<Vec<f64>>>,
    vectors: Mutex<Vec<SparseVector>>,
}

impl WorkspacePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            ints: Mutex::new(Vec::new()),
            floats: Mutex::new(Vec::new()),
            vectors: Mutex::new(Vec::new()),
        }
    }

    /// Returns an integer buffer of at least `len` capacity, zeroed to
    /// `len` entries if `zeroed` is set, otherwise of length `len` with
    /// unspecified contents recycled from a previous release.
    #[allow(dead_code)]
    pub fn acquire_ints(&self, len: usize, zeroed: bool) -> Vec<usize> {
        let mut buf = {
            let mut free = self.ints.lock().unwrap();
            free.pop().unwrap_or_default()
        };
        buf.clear();
        if zeroed {
            buf.resize(len, 0);
        } else {
            buf.reserve(len);
        }
        log::trace!("pool: acquired int buffer, len={len}, zeroed={zeroed}");
        buf
    }

    /// Returns a float buffer, see [`WorkspacePool::acquire_ints`].
    pub fn acquire_floats(&self, len: usize, zeroed: bool) -> Vec<f64> {
        let mut buf = {
            let mut free = self.floats.lock().unwrap();
            free.pop().unwrap_or_default()
        };
        buf.clear();
        if zeroed {
            buf.resize(len, 0.0);
        } else {
            buf.reserve(len);
        }
        log::trace!("pool: acquired float buffer, len={len}, zeroed={zeroed}");
        buf
    }

    /// Returns a sparse-vector header of at least `len` length.
    pub fn acquire_vector(&self, len: usize) -> SparseVector {
        let mut v = {
            let mut free = self.vectors.lock().unwrap();
            free.pop().unwrap_or_else(|| SparseVector::new(0))
        };
        v.reset_to_length(len);
        v
    }

    /// Releases an integer buffer back to the pool. Buffers under
    /// [`MIN_POOL_CAPACITY`] are dropped instead, to avoid the pool
    /// filling up with buffers too small to be worth reusing.
    ///
    /// The caller must not retain `buf` after this call.
    #[allow(dead_code)]
    pub fn release_ints(&self, buf: Vec<usize>) {
        if buf.capacity() < MIN_POOL_CAPACITY {
            return;
        }
        self.ints.lock().unwrap().push(buf);
    }

    /// Releases a float buffer, see [`WorkspacePool::release_ints`].
    pub fn release_floats(&self, buf: Vec<f64>) {
        if buf.capacity() < MIN_POOL_CAPACITY {
            return;
        }
        self.floats.lock().unwrap().push(buf);
    }

    /// Releases a sparse-vector header.
    pub fn release_vector(&self, v: SparseVector) {
        if v.capacity() < MIN_POOL_CAPACITY {
            return;
        }
        self.vectors.lock().unwrap().push(v);
    }
}

impl Default for WorkspacePool {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<WorkspacePool> = OnceLock::new();

/// The process-wide workspace pool shared by every sparse arithmetic
/// routine in this crate.
pub fn pool() -> &'static WorkspacePool {
    GLOBAL.get_or_init(WorkspacePool::new)
}

/// Aliasing-detection helpers: answer whether two slices share any
/// backing storage, used to decide whether a mutating operation's
/// receiver overlaps one of its operands and must therefore be staged
/// through a temporary workspace.
pub mod alias {
    /// Returns whether `a` and `b` overlap in memory.
    pub fn overlaps<T>(a: &[T], b: &[T]) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        let a_start = a.as_ptr() as usize;
        let a_end = a_start + a.len() * std::mem::size_of::<T>();
        let b_start = b.as_ptr() as usize;
        let b_end = b_start + b.len() * std::mem::size_of::<T>();
        a_start < b_end && b_start < a_end
    }
}
