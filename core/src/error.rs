//! Error types for the mapping core.
//!
//! Configuration-time failures ([`MapError`]) indicate caller mistakes and
//! propagate unhandled to the mapping-configuration layer; the core performs
//! no local recovery. Evaluation failures ([`ExecError`]) belong to the
//! execution seam and are not part of the configuration contract.

use thiserror::Error;

use crate::ty::Ty;

/// Configuration-time errors raised while resolving types or validating
/// member selectors. Not retryable: they reflect a type-system mismatch the
/// caller must fix.
//
// `Display`/`Error` are implemented by hand because thiserror's derive
// infers any field named `source` as the error source, and `Ty` is not an
// error type; the spec fixes the field name, so the derive cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The type exposes no recognizable element-type shape: not an array,
    /// generic sequence, keyed pair sequence, or legacy sequence.
    ElementTypeResolution { ty: Ty },

    /// A user-supplied selector expression is not a pure member-access
    /// chain.
    InvalidMemberPath { argument: String, expr: String },

    /// No registered strategy accepts the requested type pair.
    MissingStrategy { source: Ty, dest: Ty },
}

impl core::fmt::Display for MapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ElementTypeResolution { ty } => {
                write!(f, "unable to find the element type for type `{ty}`")
            }
            Self::InvalidMemberPath { argument, expr } => {
                write!(f, "only member accesses are allowed for `{argument}`: {expr}")
            }
            Self::MissingStrategy { source, dest } => {
                write!(f, "no mapping strategy matches `{source}` -> `{dest}`")
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Runtime errors raised while executing an emitted expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("null value dereferenced while reading `{member}`")]
    NullDereference { member: String },

    #[error("cannot cast value of type `{from}` to `{to}`")]
    InvalidCast { from: Ty, to: Ty },

    #[error("parameter `{name}` is not bound in this scope")]
    UnboundParameter { name: String },

    #[error("array index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("expression is not assignable: {expr}")]
    NotAssignable { expr: String },

    #[error("no runtime support for calling `{method}`")]
    UnsupportedCall { method: String },

    #[error("enumerator used after dispose")]
    Disposed,

    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch { expected: Ty, found: Ty },

    #[error("internal error: {0}")]
    Internal(String),
}
