//! Stack operation error codes.
//!
//! Grounded in `original_source/lib/qdrt/include/qdrt/stack.h`'s
//! `qd_stack_error` enum — spec §9's Open Question names this header tree
//! as the authoritative one (the richer variant, with error-taint, clone
//! and deep string ownership), over the two other parallel/earlier stack
//! headers in the retrieved pack. Every public `Stack` operation returns a
//! `Result<_, StackError>` instead of the original's out-parameter + error
//! code pair (spec §4.5, §7: "Runtime stack operations never abort; they
//! return a code").

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("invalid capacity")]
    InvalidCapacity,
    #[error("stack overflow")]
    Overflow,
    #[error("stack underflow")]
    Underflow,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("null argument")]
    NullArgument,
    #[error("allocation failure")]
    AllocationFailure,
}

impl StackError {
    /// Mirrors `qd_stack_error_string` for diagnostics that want the exact
    /// original wording.
    pub fn as_str(self) -> &'static str {
        match self {
            StackError::InvalidCapacity => "invalid capacity",
            StackError::Overflow => "stack overflow",
            StackError::Underflow => "stack underflow",
            StackError::TypeMismatch => "type mismatch",
            StackError::NullArgument => "null argument",
            StackError::AllocationFailure => "allocation failure",
        }
    }
}
