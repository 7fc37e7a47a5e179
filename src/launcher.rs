//! # Launcher Workflow
//!
//! Locates the most recently built artifact and runs it on the operator's
//! console. The canonical output directory always wins over a same-directory
//! copy; if neither location has an artifact, the diagnostic names both so
//! the operator knows exactly what was checked.
//!
//! The launcher never parses or interprets the application's output. Its own
//! exit status mirrors whatever the child produced.

use std::path::{Path, PathBuf};
use anyhow::{Result, bail};
use log::{info, warn};

use crate::config::WorkflowConfig;
use crate::invariant::assert_invariant;
use crate::system::SystemOps;

/// Finds the artifact: canonical location first, then the same-directory
/// fallback, even when both exist.
pub fn resolve_artifact(
    system: &impl SystemOps,
    config: &WorkflowConfig,
    cwd: &Path,
) -> Result<PathBuf> {
    let canonical = config.canonical_artifact(cwd);
    if system.path_exists(&canonical) {
        return Ok(canonical);
    }
    let fallback = config.fallback_artifact(cwd);
    if system.path_exists(&fallback) {
        info!("Canonical artifact absent, using {}", fallback.display());
        return Ok(fallback);
    }
    bail!(
        "no build artifact found.\n  checked: {}\n  checked: {}\nRun 'packmule build' first.",
        canonical.display(),
        fallback.display()
    );
}

/// Runs the launch workflow against `cwd` and returns the child's exit code.
pub fn run_launch(system: &impl SystemOps, config: &WorkflowConfig, cwd: &Path) -> Result<i32> {
    let artifact = resolve_artifact(system, config, cwd)?;
    assert_invariant(
        true,
        "artifact resolved before execution",
        Some("Launcher"),
    );

    // Advisory only: a bundled build carries the asset inside the executable,
    // so an unbundled copy is not expected to be present.
    let unbundled = config.asset_path(cwd);
    if !system.path_exists(&unbundled) {
        info!(
            "Data asset not present at {} (normal for a bundled build)",
            unbundled.display()
        );
    }

    info!("Launching {}", artifact.display());
    let outcome = system.run_command(&artifact, &[])?;
    if !outcome.success {
        warn!(
            "Application exited with {}",
            outcome
                .code
                .map(|c| format!("code {}", c))
                .unwrap_or_else(|| "a signal".to_string())
        );
    }
    Ok(outcome.code.unwrap_or(if outcome.success { 0 } else { 1 }))
}
