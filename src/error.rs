//! Error types returned by fallible operations.
//!
//! Contract violations (out-of-range indices, malformed permutations, bit
//! slices wider than a platform word) are not represented here: those fail
//! immediately via `panic!`/`assert!`, because they indicate a caller bug
//! rather than a recoverable condition. The types in this module cover the
//! two categories of error that *are* recoverable: shape/pattern mismatches
//! surfaced by arithmetic operations, and malformed input encountered while
//! decoding a binary-serialized matrix.

use std::error::Error;
use std::fmt;

/// The kind of problem that caused an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationErrorKind {
    /// The operands do not have compatible shapes (e.g. `A * B` with
    /// `cols(A) != rows(B)`, or `A + B` with `dims(A) != dims(B)`).
    InvalidPattern,
    /// A numerical degeneracy was hit during Cholesky factorization or
    /// triangular solve: a diagonal pivot was zero or produced a
    /// non-finite value.
    NonPositiveDefinite,
}

/// An error produced by a sparse arithmetic operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    kind: OperationErrorKind,
    message: String,
}

impl OperationError {
    /// Builds an [`OperationError`] from its kind and a human-readable message.
    pub fn from_kind_and_message(kind: OperationErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    /// The kind of problem that occurred.
    pub fn kind(&self) -> OperationErrorKind {
        self.kind
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for OperationError {}

/// An error produced while decoding a binary-serialized matrix or vector.
///
/// Unlike [`OperationError`], constructing one never has side effects on a
/// partially-built receiver: decoding either succeeds and returns a fully
/// formed value, or fails and returns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The byte buffer ended before the declared header or payload did.
    UnexpectedEof,
    /// A length field in the header exceeds what this platform can
    /// allocate into a single `Vec`.
    LengthOverflow,
    /// The header's declared dimensions are inconsistent with the
    /// declared element counts (e.g. `len(indptr) != rows + 1`).
    InconsistentHeader(&'static str),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::UnexpectedEof => write!(f, "buffer ended before declared payload"),
            IoError::LengthOverflow => {
                write!(f, "declared length exceeds the platform's maximum slice length")
            }
            IoError::InconsistentHeader(what) => {
                write!(f, "inconsistent header: {what}")
            }
        }
    }
}

impl Error for IoError {}
