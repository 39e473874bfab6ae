//! Typed runtime stack for the Quadrate programming language (spec §4.5).
//!
//! This is the data model every compiled or embedded Quadrate program
//! targets: a bounded, type-tagged stack owning its own string storage and
//! carrying a per-slot error-taint bit. It has no dependency on
//! `quad_core` — the stack's contract stands on its own, independent of how
//! the program that drives it was parsed.

pub mod element;
pub mod error;
pub mod stack;

pub use element::{Element, ElementType, ElementValue};
pub use error::StackError;
pub use stack::{CheckStackFailure, Stack};
