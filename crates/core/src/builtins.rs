//! Closed lists of built-in instruction names.
//!
//! Grounded verbatim in `original_source/lib/qc/include/qc/instructions.h`:
//! the original keeps two lists, one the parser uses to decide whether a
//! bare identifier-shaped token is an `Instruction` node rather than a plain
//! `Identifier` (`BUILTIN_INSTRUCTIONS`), and a superset used only when
//! validating the standard library's own modules, so that stdlib source
//! calling another stdlib primitive (`sqrt`, `pow`, ...) is never flagged as
//! an undefined function (`VALIDATOR_INSTRUCTIONS`). The concrete semantics
//! of every name here belong to the stdlib and backend (out of scope per
//! spec §1) — this module only needs the closed set of *names*.

/// Names the parser recognizes as `Instruction` rather than `Identifier`
/// (spec §4.3 "Instruction vs identifier", ≈70 names per spec §6).
pub const BUILTIN_INSTRUCTIONS: &[&str] = &[
    // comparison
    "!=", "<", "<=", "==", ">", ">=",
    // arithmetic operators
    "%", "*", "+", "-", ".", "/",
    // arithmetic instructions
    "add", "dec", "div", "inc", "mod", "mul", "neg", "sub",
    // logical operations
    "eq", "gt", "gte", "lt", "lte", "neq", "within",
    // stack operations
    "call", "clear", "depth", "drop", "drop2", "dup", "dup2", "dupd", "nip", "nipd", "over",
    "over2", "overd", "pick", "roll", "rot", "swap", "swap2", "swapd", "tuck",
    // type casting
    "castf", "casti", "casts",
    // I/O
    "nl", "print", "prints", "printsv", "printv", "read",
    // threading
    "detach", "spawn", "wait",
    // error handling
    "error",
];

/// Superset used only when validating standard-library modules themselves
/// (spec §4.4 note: "`ScopedIdentifier` names are considered pre-validated";
/// this list instead covers bare names inside the stdlib's own source).
pub const VALIDATOR_INSTRUCTIONS: &[&str] = &[
    "!=", "%", "*", "+", "-", ".", "/", "<", "<=", "==", ">", ">=", "add", "dec", "div", "eq",
    "gt", "gte", "inc", "lt", "lte", "mod", "mul", "neg", "neq", "sub", "within",
    // math library functions imported by stdlib modules
    "abs", "acos", "asin", "atan", "cb", "cbrt", "ceil", "cos", "fac", "floor", "inv", "ln",
    "log10", "max", "min", "pow", "round", "sin", "sq", "sqrt", "tan",
    // logical/bitwise operations
    "and", "lshift", "not", "or", "rshift", "xor",
    // stack operations
    "call", "clear", "depth", "drop", "drop2", "dup", "dup2", "dupd", "nip", "nipd", "over",
    "over2", "overd", "pick", "roll", "rot", "swap", "swap2", "swapd", "tuck",
    // type casting
    "castf", "casti", "casts",
    // I/O
    "nl", "print", "prints", "printsv", "printv", "read",
    // threading
    "detach", "spawn", "wait",
    // error handling
    "error",
];

pub fn is_builtin_instruction(name: &str) -> bool {
    BUILTIN_INSTRUCTIONS.contains(&name)
}

/// `validating_stdlib` selects the superset list used while validating the
/// standard library's own source (spec §4.4 / §4.6).
pub fn is_known_instruction(name: &str, validating_stdlib: bool) -> bool {
    if validating_stdlib {
        VALIDATOR_INSTRUCTIONS.contains(&name)
    } else {
        BUILTIN_INSTRUCTIONS.contains(&name)
    }
}
