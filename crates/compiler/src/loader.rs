//! Filesystem access for the module orchestrator: manifest lookup, source
//! reading, and sibling-file resolution with a containment check.
//!
//! Grounded in the teacher's `crates/compiler/src/resolver.rs`
//! (`resolve_relative_path`): resolved sibling paths are canonicalized and
//! checked to stay within the owning module's directory, the same
//! defense-in-depth the teacher applies against `..`/symlink escapes, even
//! though spec §4.6 doesn't call it out by name. `LoaderError` corresponds
//! 1:1 with spec §4.6's three named failure modes plus the filesystem I/O
//! case the original README of contract didn't need to name explicitly.

use std::path::{Path, PathBuf};

use quad_core::Diagnostic;
use thiserror::Error;

use crate::config::SearchPath;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("module '{0}' not found in any search path")]
    ModuleNotFound(String),

    #[error("failed to parse manifest for module '{module}'")]
    ModuleParseFailed {
        module: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("sibling file '{sibling}' referenced by module '{module}' not found")]
    SiblingMissing { module: String, sibling: String },

    #[error("sibling path '{sibling}' of module '{module}' escapes its module directory")]
    PathEscapesModuleDirectory { module: String, sibling: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Locate `module_name`'s manifest by probing `search_path` in order
/// (spec §6's fixed precedence).
pub fn find_manifest(
    search_path: &SearchPath,
    module_name: &str,
    source_suffix: &str,
) -> Result<PathBuf, LoaderError> {
    search_path
        .manifest_candidates(module_name, source_suffix)
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| LoaderError::ModuleNotFound(module_name.to_string()))
}

pub fn read_source(path: &Path) -> Result<String, LoaderError> {
    std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a sibling file reference (e.g. `helpers.q`) relative to
/// `module_dir`, the directory containing the referring module's manifest.
/// The resolved path must stay within `module_dir`.
pub fn resolve_sibling_path(
    module_dir: &Path,
    module_name: &str,
    sibling_ref: &str,
) -> Result<PathBuf, LoaderError> {
    let candidate = module_dir.join(sibling_ref);
    if !candidate.is_file() {
        return Err(LoaderError::SiblingMissing {
            module: module_name.to_string(),
            sibling: sibling_ref.to_string(),
        });
    }

    let canonical_candidate = candidate.canonicalize().map_err(|source| LoaderError::Io {
        path: candidate.clone(),
        source,
    })?;
    let canonical_dir = module_dir.canonicalize().map_err(|source| LoaderError::Io {
        path: module_dir.to_path_buf(),
        source,
    })?;

    if !canonical_candidate.starts_with(&canonical_dir) {
        return Err(LoaderError::PathEscapesModuleDirectory {
            module: module_name.to_string(),
            sibling: sibling_ref.to_string(),
        });
    }

    Ok(canonical_candidate)
}
