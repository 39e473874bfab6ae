//! Bounded, type-tagged runtime stack with string ownership and error
//! taint (spec §4.5).
//!
//! Grounded in `original_source/lib/qdrt/include/qdrt/stack.h`'s `qd_stack`
//! opaque-pointer C API, adapted idiomatically: capacity is fixed at
//! construction (spec §3 "Capacity is fixed at creation"), every operation
//! that the header documents as returning `qd_stack_error` returns
//! `Result<_, StackError>` here, and the implementation style (inline
//! methods, `#[repr]`-free plain struct) follows the teacher's
//! `crates/core/src/tagged_stack.rs`. Unlike the teacher's `TaggedStack`,
//! this stack never grows and never panics on misuse — every public
//! operation is infallible-looking but `Result`-returning, per spec §7
//! ("Runtime stack operations never abort; they return a code").

use crate::element::{Element, ElementType, ElementValue};
use crate::error::StackError;

/// A bounded, type-tagged, single-threaded runtime stack.
///
/// `Clone` performs the deep copy `qd_stack_clone` describes, since every
/// `Element` variant is itself an owned value (`String` included).
#[derive(Debug, Clone)]
pub struct Stack {
    capacity: usize,
    elements: Vec<Element>,
}

impl Stack {
    /// `qd_stack_init`. `capacity == 0` fails with `InvalidCapacity`.
    pub fn init(capacity: usize) -> Result<Self, StackError> {
        if capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }
        Ok(Stack {
            capacity,
            elements: Vec::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.elements.len() == self.capacity
    }

    fn push(&mut self, element: Element) -> Result<(), StackError> {
        if self.is_full() {
            return Err(StackError::Overflow);
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn push_int(&mut self, value: i64) -> Result<(), StackError> {
        self.push(Element::int(value))
    }

    pub fn push_float(&mut self, value: f64) -> Result<(), StackError> {
        self.push(Element::float(value))
    }

    pub fn push_ptr(&mut self, value: usize) -> Result<(), StackError> {
        self.push(Element::ptr(value))
    }

    /// Copies `value` into stack-owned storage (spec §4.5 `push_str`).
    pub fn push_str(&mut self, value: &str) -> Result<(), StackError> {
        self.push(Element::str(value))
    }

    /// Returns a copy of the top element without removing it.
    pub fn peek(&self) -> Result<Element, StackError> {
        self.elements.last().cloned().ok_or(StackError::Underflow)
    }

    /// 0 = bottom, matching `qd_stack_element`.
    pub fn element(&self, index: usize) -> Result<Element, StackError> {
        self.elements.get(index).cloned().ok_or(StackError::Underflow)
    }

    /// Removes and returns the top element; ownership of any owned string
    /// payload transfers to the caller with the returned value (spec §4.5,
    /// §5 "ownership transfer on pop is mandatory").
    pub fn pop(&mut self) -> Result<Element, StackError> {
        self.elements.pop().ok_or(StackError::Underflow)
    }

    /// A typed pop: fails with `TypeMismatch` (stack unchanged) when the
    /// top element's tag does not match `expected`, per spec §4.5's type
    /// discipline.
    pub fn pop_typed(&mut self, expected: ElementType) -> Result<Element, StackError> {
        match self.elements.last() {
            None => Err(StackError::Underflow),
            Some(top) if top.element_type() == expected => Ok(self.elements.pop().unwrap()),
            Some(_) => Err(StackError::TypeMismatch),
        }
    }

    pub fn pop_int(&mut self) -> Result<i64, StackError> {
        self.pop_typed(ElementType::Int).map(|e| match e.value {
            ElementValue::Int(v) => v,
            _ => unreachable!(),
        })
    }

    pub fn pop_float(&mut self) -> Result<f64, StackError> {
        self.pop_typed(ElementType::Float).map(|e| match e.value {
            ElementValue::Float(v) => v,
            _ => unreachable!(),
        })
    }

    pub fn pop_ptr(&mut self) -> Result<usize, StackError> {
        self.pop_typed(ElementType::Ptr).map(|e| match e.value {
            ElementValue::Ptr(v) => v,
            _ => unreachable!(),
        })
    }

    pub fn pop_str(&mut self) -> Result<String, StackError> {
        self.pop_typed(ElementType::Str).map(|e| match e.value {
            ElementValue::Str(v) => v,
            _ => unreachable!(),
        })
    }

    pub fn is_top_tainted(&self) -> bool {
        self.elements.last().is_some_and(|e| e.is_error_tainted)
    }

    pub fn mark_top_tainted(&mut self) {
        if let Some(top) = self.elements.last_mut() {
            top.is_error_tainted = true;
        }
    }

    pub fn clear_top_taint(&mut self) {
        if let Some(top) = self.elements.last_mut() {
            top.is_error_tainted = false;
        }
    }

    /// Inspects the top `count` elements against `expected_types` (`None`
    /// in a slot means "any", mirroring the pointer-tag "any" convention in
    /// spec §4.5). Returns a `CheckStackFailure` describing the mismatch on
    /// failure; the caller decides whether to abort (spec §4.5's
    /// `check_stack` aborts the *process* in the original design — here the
    /// decision to abort is left to the caller, e.g. the compiled-code
    /// entry gate, so this crate never calls `process::exit` itself).
    pub fn check_stack(
        &self,
        function_name: &str,
        expected_types: &[Option<ElementType>],
    ) -> Result<(), CheckStackFailure> {
        let count = expected_types.len();
        if self.elements.len() < count {
            return Err(CheckStackFailure {
                function_name: function_name.to_string(),
                expected: expected_types.to_vec(),
                actual: self.elements.iter().map(|e| e.element_type()).collect(),
            });
        }
        let top = &self.elements[self.elements.len() - count..];
        let matches = top
            .iter()
            .zip(expected_types.iter())
            .all(|(elem, expected)| expected.is_none_or(|t| elem.element_type() == t));
        if matches {
            Ok(())
        } else {
            Err(CheckStackFailure {
                function_name: function_name.to_string(),
                expected: expected_types.to_vec(),
                actual: top.iter().map(|e| e.element_type()).collect(),
            })
        }
    }
}

/// Describes a `check_stack` guard violation: the calling function's name,
/// the expected type signature, and what was actually found (spec §7
/// "prints the function name, the expected-vs-actual counts/types").
#[derive(Debug, Clone, PartialEq)]
pub struct CheckStackFailure {
    pub function_name: String,
    pub expected: Vec<Option<ElementType>>,
    pub actual: Vec<ElementType>,
}

impl std::fmt::Display for CheckStackFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: stack check failed: expected {} value(s), found {:?}",
            self.function_name,
            self.expected.len(),
            self.actual
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rejects_zero_capacity() {
        assert_eq!(Stack::init(0).unwrap_err(), StackError::InvalidCapacity);
    }

    #[test]
    fn s4_stack_overflow() {
        let mut stack = Stack::init(2).unwrap();
        assert!(stack.push_int(1).is_ok());
        assert!(stack.push_int(2).is_ok());
        assert_eq!(stack.push_int(3).unwrap_err(), StackError::Overflow);
        assert_eq!(stack.size(), 2);
    }

    #[test]
    fn underflow_on_empty_pop_and_peek() {
        let mut stack = Stack::init(4).unwrap();
        assert_eq!(stack.pop().unwrap_err(), StackError::Underflow);
        assert_eq!(stack.peek().unwrap_err(), StackError::Underflow);
    }

    #[test]
    fn property5_push_int_then_peek_and_typed_pop_mismatch() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_int(7).unwrap();
        assert_eq!(stack.peek().unwrap().element_type(), ElementType::Int);
        assert_eq!(stack.pop_float().unwrap_err(), StackError::TypeMismatch);
        assert_eq!(stack.size(), 1, "a type mismatch must not modify the stack");
    }

    #[test]
    fn s5_typed_pop_mismatch_leaves_float_on_top() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_float(1.5).unwrap();
        assert_eq!(stack.pop_int().unwrap_err(), StackError::TypeMismatch);
        assert_eq!(stack.size(), 1);
        assert_eq!(stack.peek().unwrap().as_float(), Some(1.5));
    }

    #[test]
    fn property6_string_round_trips_and_is_freed_on_drop() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_str("hello").unwrap();
        let popped = stack.pop_str().unwrap();
        assert_eq!(popped, "hello");
        assert!(stack.is_empty());
        // `stack` drops here; any remaining string slot would be freed by
        // `Vec<Element>`'s own drop glue, same as `qd_stack_destroy`.
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_str("owned").unwrap();
        let mut cloned = stack.clone();
        cloned.pop_str().unwrap();
        assert!(cloned.is_empty());
        assert_eq!(stack.size(), 1, "cloning must not alias the original's storage");
    }

    #[test]
    fn error_taint_accessors_round_trip() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_int(0).unwrap();
        assert!(!stack.is_top_tainted());
        stack.mark_top_tainted();
        assert!(stack.is_top_tainted());
        stack.clear_top_taint();
        assert!(!stack.is_top_tainted());
    }

    #[test]
    fn check_stack_accepts_matching_signature_with_any_slot() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_int(1).unwrap();
        stack.push_ptr(0).unwrap();
        assert!(stack
            .check_stack("add", &[Some(ElementType::Int), None])
            .is_ok());
    }

    #[test]
    fn check_stack_reports_mismatch_with_function_name() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_float(1.0).unwrap();
        let err = stack
            .check_stack("add", &[Some(ElementType::Int)])
            .unwrap_err();
        assert_eq!(err.function_name, "add");
        assert_eq!(err.actual, vec![ElementType::Float]);
    }

    #[test]
    fn element_zero_is_bottom() {
        let mut stack = Stack::init(4).unwrap();
        stack.push_int(10).unwrap();
        stack.push_int(20).unwrap();
        assert_eq!(stack.element(0).unwrap().as_int(), Some(10));
        assert_eq!(stack.element(1).unwrap().as_int(), Some(20));
    }
}
