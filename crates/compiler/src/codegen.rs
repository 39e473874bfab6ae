//! Code-gen interface: the adapter boundary between the core toolchain and
//! an external backend (spec §4.7).
//!
//! The concrete backend — LLVM IR emission or C source emission — is
//! explicitly out of scope (spec §1); this module only specifies the
//! *contract* a consumer must satisfy: it receives the main AST and the
//! ordered `(module-name, Ast)` list produced by [`crate::orchestrator`],
//! and it reports a generation error without mutating either. Grounded in
//! the teacher's `CodeGen` struct (`examples/navicore-cem3/crates/compiler/src/codegen.rs`)
//! for the error-type shape (`CodeGenError` wrapping a logic message), with
//! the ~5,600-line IR-emitting body itself deliberately not reproduced.

use std::fmt;

use quad_core::Ast;

/// A logical failure reported by a [`CodeGenSink`] consumer. The core never
/// inspects the failure beyond displaying it; it does not retry or mutate
/// the ASTs that were handed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenError(String);

impl CodeGenError {
    pub fn new(message: impl Into<String>) -> Self {
        CodeGenError(message.into())
    }
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code generation failed: {}", self.0)
    }
}

impl std::error::Error for CodeGenError {}

/// The contract every backend consumer implements (spec §4.7): given the
/// main AST and the dependency-ordered module list from
/// [`crate::orchestrator::orchestrate`], consume them in that order and
/// report any failure. Implementors may write artefacts as a side effect;
/// from the core's perspective the only contract is "consume in order,
/// don't mutate, report errors instead of panicking".
pub trait CodeGenSink {
    fn emit(&mut self, main: &Ast, modules: &[(String, Ast)]) -> Result<(), CodeGenError>;
}

/// A sink that discards everything. Used by `quadc check` (which never
/// reaches code generation) and as the default for `quadc build` until a
/// real backend is wired in, since the backend itself is out of scope here.
#[derive(Debug, Default)]
pub struct NullCodeGen;

impl CodeGenSink for NullCodeGen {
    fn emit(&mut self, _main: &Ast, _modules: &[(String, Ast)]) -> Result<(), CodeGenError> {
        Ok(())
    }
}

/// A test double that records the module names it was invoked with, in the
/// order `emit` observed them — used to assert spec §8 properties 7/8
/// (dependency ordering, no duplicate module entries) from the code-gen
/// side of the boundary rather than only from the orchestrator's own return
/// value.
#[derive(Debug, Default)]
pub struct RecordingCodeGen {
    pub invoked_module_names: Vec<String>,
    pub main_seen: bool,
}

impl CodeGenSink for RecordingCodeGen {
    fn emit(&mut self, _main: &Ast, modules: &[(String, Ast)]) -> Result<(), CodeGenError> {
        self.main_seen = true;
        self.invoked_module_names
            .extend(modules.iter().map(|(name, _)| name.clone()));
        Ok(())
    }
}
