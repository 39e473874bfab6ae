//! Module orchestrator, code-gen interface and CLI for the Quadrate
//! language.
//!
//! This crate covers components F and G of the toolchain (§2): resolving a
//! main program's `use` graph into a dependency-ordered module list
//! (`orchestrator`), and the adapter boundary that hands that list to an
//! external backend (`codegen`). `quad_core` does the actual parsing and
//! validation; this crate only adds module resolution and orchestration on
//! top.

pub mod codegen;
pub mod config;
pub mod loader;
pub mod orchestrator;

use std::path::Path;

use quad_core::{parse, Ast, Diagnostic, ParseResult, Severity};
use tracing::{info, instrument};

use crate::codegen::{CodeGenSink, CodeGenError};
use crate::config::{ProjectConfig, SearchPath};
use crate::loader::LoaderError;
use crate::orchestrator::orchestrate;

/// The result of `check`: the parsed main AST plus every diagnostic
/// collected from lexing, parsing and validation, in source order.
pub struct CheckOutcome {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Parse and validate `source` (spec §4.3, §4.4). Never fails outright —
/// a `Program` root is always produced; callers inspect `diagnostics` for
/// errors, matching the parser's own "always returns a tree" contract.
#[instrument(skip(source))]
pub fn check_source(source: &str) -> CheckOutcome {
    let ParseResult { ast, mut diagnostics } = parse(source);
    let validation_diagnostics = quad_core::validator::validate(&ast, false);
    diagnostics.extend(validation_diagnostics);
    info!(diagnostic_count = diagnostics.len(), "checked source");
    CheckOutcome { ast, diagnostics }
}

/// Read and check a source file (spec §4.3's "optional filename for
/// diagnostics" — the filename itself is only used by the caller when
/// formatting diagnostics, not by `check_source`).
pub fn check_file(path: &Path) -> Result<CheckOutcome, std::io::Error> {
    let source = std::fs::read_to_string(path)?;
    Ok(check_source(&source))
}

/// Errors that can abort a `build`: either the check phase found errors, a
/// loader failure occurred during module resolution, or the code-gen sink
/// reported a failure. Distinct from `CheckOutcome`, which never fails —
/// `build` is where spec §7's "orchestrator stops at the first loader
/// failure" and the code-gen contract actually bite.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0} diagnostic(s) reported during check")]
    CheckFailed(usize),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    CodeGen(#[from] CodeGenError),
    #[error("failed to read '{0}': {1}")]
    Io(std::path::PathBuf, std::io::Error),
}

/// Check `path`, resolve its module graph, and hand the ordered ASTs to
/// `sink` (spec §4.6 → §4.7). This is the full pipeline A→G minus the
/// concrete backend, which `sink` stands in for.
#[instrument(skip(sink))]
pub fn build_file(
    path: &Path,
    project_config: &ProjectConfig,
    source_suffix: &str,
    sink: &mut dyn CodeGenSink,
) -> Result<Vec<(String, Ast)>, BuildError> {
    let source = std::fs::read_to_string(path).map_err(|e| BuildError::Io(path.to_path_buf(), e))?;
    let outcome = check_source(&source);
    if outcome.has_errors() {
        return Err(BuildError::CheckFailed(outcome.diagnostics.len()));
    }

    let main_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let search_path = SearchPath::resolve(project_config);
    let modules = orchestrate(&outcome.ast, &main_dir, &search_path, source_suffix)?;
    info!(module_count = modules.len(), "resolved module graph");

    sink.emit(&outcome.ast, &modules)?;
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::NullCodeGen;

    #[test]
    fn s1_check_source_reports_no_diagnostics() {
        let outcome = check_source("fn main( -- ) { 42 . nl }");
        assert!(outcome.diagnostics.is_empty());
        assert!(!outcome.has_errors());
    }

    #[test]
    fn s2_check_source_reports_undefined_function() {
        let outcome = check_source("fn main( -- ) { doesnotexist }");
        assert!(outcome.has_errors());
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn build_file_stops_before_orchestration_on_check_failure() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.q");
        std::fs::write(&main, "fn main( -- ) { doesnotexist }").unwrap();

        let mut sink = NullCodeGen;
        let err = build_file(&main, &ProjectConfig::default(), "q", &mut sink).unwrap_err();
        assert!(matches!(err, BuildError::CheckFailed(1)));
    }

    #[test]
    #[serial_test::serial]
    fn build_file_resolves_modules_and_invokes_sink() {
        use crate::codegen::RecordingCodeGen;

        let dir = tempfile::tempdir().unwrap();
        let math_dir = dir.path().join("math");
        std::fs::create_dir_all(&math_dir).unwrap();
        std::fs::write(math_dir.join("module.q"), "fn sqrt(x:f64 -- r:f64) { x }\n").unwrap();

        let main = dir.path().join("main.q");
        std::fs::write(&main, "use math\nfn main( -- ) { 9 math::sqrt . nl }\n").unwrap();

        std::env::set_var("QUADRATE_ROOT", dir.path());
        let mut sink = RecordingCodeGen::default();
        let modules = build_file(&main, &ProjectConfig::default(), "q", &mut sink).unwrap();
        std::env::remove_var("QUADRATE_ROOT");

        assert_eq!(modules.len(), 1);
        assert!(sink.main_seen);
        assert_eq!(sink.invoked_module_names, vec!["math".to_string()]);
    }
}
