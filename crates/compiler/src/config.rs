//! Module search path resolution and project configuration.
//!
//! Grounded in spec §6's fixed search-path order and in the teacher's
//! `crates/compiler/src/lint.rs` `LintConfig`, which parses a TOML file
//! with `serde`/`toml` into a typed struct (`LintConfig::from_toml`) rather
//! than hand-rolling a parser. A project-level `quadrate.toml` (optional)
//! lets a project override the two repo-conventional fallback directories
//! spec §6 mentions without touching environment variables.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Project-level configuration, normally loaded from `quadrate.toml` at the
/// project root. Every field is optional: an absent file behaves exactly
/// like `ProjectConfig::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Extra module search directories, consulted after the two
    /// repo-conventional fallbacks (spec §6 item 5).
    #[serde(default)]
    pub extra_search_paths: Vec<PathBuf>,
}

impl ProjectConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse quadrate.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The fixed module search-path order from spec §6, plus a project's
/// `extra_search_paths`. Each entry is a directory; the orchestrator joins
/// `<dir>/<module-name>/module.<suffix>` to form a manifest path.
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Builds the search path in spec §6 order:
    /// 1. `QUADRATE_ROOT` env var, if set.
    /// 2. `${HOME}/quadrate`.
    /// 3. `/usr/share/quadrate`.
    /// 4. The current working directory.
    /// 5. Two repo-conventional fallback directories: `./modules` and
    ///    `./vendor/quadrate`, plus any `extra_search_paths` from a loaded
    ///    `ProjectConfig`.
    pub fn resolve(project_config: &ProjectConfig) -> Self {
        let mut roots = Vec::new();

        if let Some(root) = env::var_os("QUADRATE_ROOT") {
            roots.push(PathBuf::from(root));
        }
        if let Some(home) = env::var_os("HOME") {
            roots.push(PathBuf::from(home).join("quadrate"));
        }
        roots.push(PathBuf::from("/usr/share/quadrate"));
        if let Ok(cwd) = env::current_dir() {
            roots.push(cwd);
        }
        roots.push(PathBuf::from("modules"));
        roots.push(PathBuf::from("vendor/quadrate"));
        roots.extend(project_config.extra_search_paths.iter().cloned());

        SearchPath { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The manifest path for `module_name` under each search root, in
    /// order, for the caller to probe with `Path::is_file`.
    pub fn manifest_candidates<'a>(
        &'a self,
        module_name: &'a str,
        source_suffix: &'a str,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        self.roots
            .iter()
            .map(move |root| manifest_path(root, module_name, source_suffix))
    }
}

pub fn manifest_path(root: &Path, module_name: &str, source_suffix: &str) -> PathBuf {
    root.join(module_name).join(format!("module.{source_suffix}"))
}
