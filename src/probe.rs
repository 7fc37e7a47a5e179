//! # Probe Module
//!
//! This module answers "what is present in the working directory?" for both
//! workflows. It probes the ordered list of virtual-environment candidates,
//! checks that the winning environment is actually usable, and locates the
//! packaging inputs.
//!
//! ## Probing Strategy
//!
//! 1.  **Environment**: walk the candidate names in order; the first
//!     directory that exists is *the* environment. A missing interpreter in
//!     that directory is its own failure, not a reason to try the next name.
//! 2.  **Inputs**: the entry script and the data asset at their fixed,
//!     layout-dependent relative paths.
//!
//! Nothing here mutates the file system.

use std::path::{Path, PathBuf};
use log::debug;

use crate::config::{AssetLayout, WorkflowConfig};
use crate::system::SystemOps;

/// A usable virtual environment: its root and the interpreter inside it.
#[derive(Debug, Clone)]
pub struct Environment {
    pub root: PathBuf,
    pub interpreter: PathBuf,
}

/// Result of the environment probe. The two failure shapes carry enough to
/// print a diagnostic with the exact paths that were expected.
#[derive(Debug)]
pub enum EnvProbe {
    Usable(Environment),
    /// A candidate directory exists but has no interpreter inside.
    MissingInterpreter { root: PathBuf, expected: PathBuf },
    /// No candidate directory exists at all.
    NotFound,
}

/// Location of the interpreter inside a virtual environment.
///
/// Windows venvs keep it under `Scripts\`, everything else under `bin/`.
pub fn interpreter_path(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

/// Probes `candidates` in order under `cwd`.
pub fn find_environment(
    system: &impl SystemOps,
    cwd: &Path,
    candidates: &[String],
) -> EnvProbe {
    for name in candidates {
        let root = cwd.join(name);
        if !system.path_exists(&root) {
            debug!("environment candidate not present: {}", root.display());
            continue;
        }
        let expected = interpreter_path(&root);
        if system.path_exists(&expected) {
            debug!("environment found: {}", root.display());
            return EnvProbe::Usable(Environment {
                root,
                interpreter: expected,
            });
        }
        // First existing candidate decides; a broken one is reported as
        // broken rather than skipped.
        return EnvProbe::MissingInterpreter { root, expected };
    }
    EnvProbe::NotFound
}

/// Prints a read-only health report covering every precondition of the build
/// workflow and both launch locations. Reports, never mutates, never fails.
pub fn report(system: &impl SystemOps, config: &WorkflowConfig, cwd: &Path) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                  Workflow Health Report");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    // 1. Environment
    println!("1. VIRTUAL ENVIRONMENT (candidates: {})", config.env_candidates.join(", "));
    match find_environment(system, cwd, &config.env_candidates) {
        EnvProbe::Usable(env) => {
            println!("   ✓ Usable at {}", env.root.display());
        }
        EnvProbe::MissingInterpreter { root, expected } => {
            println!("   ⚠ Found {} but it has no interpreter", root.display());
            println!("     Expected: {}", expected.display());
        }
        EnvProbe::NotFound => {
            println!("   ✕ None of the candidate directories exist");
        }
    }

    // 2. Packaging inputs
    let entry = cwd.join(&config.entry_script);
    let asset = config.asset_path(cwd);
    let layout = match config.layout {
        AssetLayout::Root => "root",
        AssetLayout::Subdir => "subdir",
    };
    println!();
    println!("2. PACKAGING INPUTS (asset layout: {})", layout);
    print_check("entry script", &entry, system.path_exists(&entry));
    print_check("data asset", &asset, system.path_exists(&asset));
    let requirements = cwd.join(&config.requirements);
    print_check("requirements", &requirements, system.path_exists(&requirements));

    // 3. Artifact
    let canonical = config.canonical_artifact(cwd);
    let fallback = config.fallback_artifact(cwd);
    println!();
    println!("3. BUILD ARTIFACT");
    print_check("canonical", &canonical, system.path_exists(&canonical));
    print_check("fallback", &fallback, system.path_exists(&fallback));

    let stale = system.find_spec_metadata(cwd);
    if !stale.is_empty() {
        println!();
        println!("   ⚠ {} leftover packaging metadata file(s):", stale.len());
        for spec in &stale {
            println!("     - {}", spec.display());
        }
        println!("     The next build removes these.");
    }

    // Summary
    println!();
    println!("───────────────────────────────────────────────────────────────");
    println!();
    if system.path_exists(&canonical) || system.path_exists(&fallback) {
        println!("✓ An artifact is present. 'packmule launch' will run it.");
    } else {
        println!("No artifact yet. Run 'packmule build' to produce one.");
    }
    println!();
}

fn print_check(label: &str, path: &Path, present: bool) {
    let mark = if present { "✓" } else { "✕" };
    println!("   {} {:<12} {}", mark, label, path.display());
}
