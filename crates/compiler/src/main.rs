//! Quadrate Compiler CLI
//!
//! Command-line front-end over `quadc`'s check/build pipeline. Per the
//! specification this CLI is a thin, informative wrapper (the concrete
//! backend is out of scope); it exists to drive `check_source`/`build_file`
//! and render their diagnostics the way spec §6 requires.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use quad_core::diagnostics::{format_diagnostics, ColorMode};
use quadc::codegen::NullCodeGen;
use quadc::config::ProjectConfig;

#[derive(ClapParser)]
#[command(name = "quadc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Quadrate compiler front-end: parse, validate and resolve modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a source file; print diagnostics and exit
    /// non-zero on any error.
    Check {
        /// Input source file.
        input: PathBuf,
    },

    /// Check a source file, resolve its module graph, and hand the
    /// ordered ASTs to a code-gen sink (a no-op sink by default, since the
    /// concrete backend is out of scope).
    Build {
        /// Input source file.
        input: PathBuf,

        /// Extension used for sibling-file `use` references (spec §6).
        #[arg(long, default_value = "q")]
        suffix: String,

        /// Path to a `quadrate.toml` project configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "quadc=info"
                    .parse()
                    .expect("static directive always parses"),
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { input } => run_check(&input),
        Commands::Build { input, suffix, config } => run_build(&input, &suffix, config.as_deref()),
    }
}

fn color_mode() -> ColorMode {
    if std::io::stderr().is_terminal() {
        ColorMode::Always
    } else {
        ColorMode::Never
    }
}

fn run_check(input: &PathBuf) -> ExitCode {
    let outcome = match quadc::check_file(input) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("quadc: {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };

    let file = input.display().to_string();
    if !outcome.diagnostics.is_empty() {
        println!(
            "{}",
            format_diagnostics("quadc", &file, &outcome.diagnostics, color_mode())
        );
    }

    if outcome.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_build(input: &PathBuf, suffix: &str, config_path: Option<&std::path::Path>) -> ExitCode {
    let project_config = match config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(contents) => match ProjectConfig::from_toml(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("quadc: {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => {
                eprintln!("quadc: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ProjectConfig::default(),
    };

    let mut sink = NullCodeGen;
    match quadc::build_file(input, &project_config, suffix, &mut sink) {
        Ok(modules) => {
            println!(
                "Resolved {} module(s) for {}",
                modules.len(),
                input.display()
            );
            ExitCode::SUCCESS
        }
        Err(quadc::BuildError::CheckFailed(count)) => {
            // Re-run check to print the diagnostics themselves; build's
            // own error only carries the count.
            let outcome = quadc::check_file(input).expect("file was just read successfully");
            let file = input.display().to_string();
            println!(
                "{}",
                format_diagnostics("quadc", &file, &outcome.diagnostics, color_mode())
            );
            eprintln!("quadc: {count} diagnostic(s) reported during check");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("quadc: {e}");
            ExitCode::FAILURE
        }
    }
}
