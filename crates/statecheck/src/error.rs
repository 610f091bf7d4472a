//! Error types for the testing engine
//!
//! Test outcomes (pass/fail/unresolved) are values, not errors; see
//! [`crate::minimize::Verdict`] and [`crate::trace::StepStatus`]. The
//! variants here are configuration and misuse errors: they terminate the
//! run instead of flowing through the algorithms.

use crate::value::ValueKind;
use thiserror::Error;

/// Fatal configuration or misuse errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A step names an operation the model's capability table does not provide
    #[error("Model has no operation named '{op}'")]
    UnknownOperation { op: String },

    /// Two operations in the capability table share a name
    #[error("Duplicate operation '{op}' in model capability table")]
    DuplicateOperation { op: String },

    /// A step carries the wrong number of arguments for its operation
    #[error("Arity mismatch for '{op}': expected {expected} arguments, got {got}")]
    ArityMismatch {
        op: String,
        expected: usize,
        got: usize,
    },

    /// A step argument does not match the operation's declared schema
    #[error("Argument {index} of '{op}': expected {expected}, got {got}")]
    ArgumentType {
        op: String,
        index: usize,
        expected: ValueKind,
        got: &'static str,
    },

    /// The argument oracle cannot produce a value of a declared kind
    #[error("Cannot generate a value of kind {kind}")]
    CannotGenerate { kind: ValueKind },

    /// The caller asked to minimize a sequence that does not fail
    #[error("Minimize requires a failing sequence; the full input replayed as {verdict}")]
    MinimizeOnPassing { verdict: &'static str },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
