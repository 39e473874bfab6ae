//! A single stack element: a type-tagged value plus an error-taint bit.
//!
//! Grounded in `qd_stack_element_t` / `qd_stack_type` from
//! `original_source/lib/qdrt/include/qdrt/stack.h`. The C union becomes a
//! Rust enum carrying its payload directly (spec §9: "keep the
//! tagged-variant shape; storing owned strings as heap handles... preserves
//! the semantics"); `String` is Rust's heap handle for the owned-string
//! case.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int,
    Float,
    Ptr,
    Str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Int(i64),
    /// `f64` has no total order, so `Element` cannot derive `Eq`; this is
    /// otherwise unremarkable.
    Float(f64),
    Ptr(usize),
    /// Owned string storage. Per spec §3, popping transfers ownership to
    /// the caller; dropping an `Element` holding this variant frees the
    /// string, same as `qd_stack_destroy` freeing unconsumed string slots.
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub value: ElementValue,
    pub is_error_tainted: bool,
}

impl Element {
    pub fn int(value: i64) -> Self {
        Element {
            value: ElementValue::Int(value),
            is_error_tainted: false,
        }
    }

    pub fn float(value: f64) -> Self {
        Element {
            value: ElementValue::Float(value),
            is_error_tainted: false,
        }
    }

    pub fn ptr(value: usize) -> Self {
        Element {
            value: ElementValue::Ptr(value),
            is_error_tainted: false,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Element {
            value: ElementValue::Str(value.into()),
            is_error_tainted: false,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match &self.value {
            ElementValue::Int(_) => ElementType::Int,
            ElementValue::Float(_) => ElementType::Float,
            ElementValue::Ptr(_) => ElementType::Ptr,
            ElementValue::Str(_) => ElementType::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            ElementValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            ElementValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<usize> {
        match self.value {
            ElementValue::Ptr(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ElementValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
