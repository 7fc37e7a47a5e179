//! # Builder Workflow
//!
//! This module contains the build half of the workflow. It is responsible for:
//! 1. Verifying every packaging precondition, in order, before any side effect.
//! 2. Preparing the virtual environment (pip upgrade, dependency manifest,
//!    packaging tool install).
//! 3. Clearing stale output from previous builds.
//! 4. Invoking the packaging tool to produce one self-contained executable
//!    with the data asset embedded inside it.
//!
//! Every failure is fatal and terminal for the invocation: no retries, no
//! partial cleanup, no rollback of dependencies that were already installed.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result, bail};
use log::info;

use crate::config::WorkflowConfig;
use crate::invariant::assert_invariant;
use crate::probe::{self, EnvProbe, Environment};
use crate::system::SystemOps;

/// Runs the full build workflow against `cwd`.
///
/// Decoupled from the concrete system for testing. Returns the canonical
/// artifact path on success.
pub fn run_build(system: &impl SystemOps, config: &WorkflowConfig, cwd: &Path) -> Result<PathBuf> {
    let env = check_preconditions(system, config, cwd)?;
    info!("Using environment at {}", env.root.display());

    run_step(
        system,
        &env.interpreter,
        &["-m", "pip", "install", "--upgrade", "pip"],
        "upgrade pip",
    )?;
    run_step(
        system,
        &env.interpreter,
        &["-m", "pip", "install", "-r", &config.requirements],
        "install dependencies",
    )?;
    run_step(
        system,
        &env.interpreter,
        &["-m", "pip", "install", "pyinstaller"],
        "install packaging tool",
    )?;

    clean_stale_output(system, config, cwd)?;

    let add_data = config.add_data_directive();
    run_step(
        system,
        &env.interpreter,
        &[
            "-m",
            "PyInstaller",
            "--onefile",
            "--name",
            &config.app_name,
            "--distpath",
            &config.dist_dir,
            "--workpath",
            &config.build_dir,
            "--add-data",
            &add_data,
            &config.entry_script,
        ],
        "package application",
    )?;

    let artifact = config.canonical_artifact(cwd);
    if !system.path_exists(&artifact) {
        bail!(
            "packaging reported success but no artifact at {}",
            artifact.display()
        );
    }
    assert_invariant(
        true,
        "artifact exists at the canonical output path",
        Some("Builder"),
    );
    Ok(artifact)
}

/// Verifies the four preconditions in their fixed order. Each failure is a
/// hard stop with the exact path that was expected.
fn check_preconditions(
    system: &impl SystemOps,
    config: &WorkflowConfig,
    cwd: &Path,
) -> Result<Environment> {
    let env = match probe::find_environment(system, cwd, &config.env_candidates) {
        EnvProbe::Usable(env) => env,
        EnvProbe::MissingInterpreter { root, expected } => bail!(
            "virtual environment at {} is not usable: no interpreter at {}",
            root.display(),
            expected.display()
        ),
        EnvProbe::NotFound => bail!(
            "no virtual environment found under {} (looked for: {})",
            cwd.display(),
            config.env_candidates.join(", ")
        ),
    };

    let entry = cwd.join(&config.entry_script);
    if !system.path_exists(&entry) {
        bail!("entry script not found at {}", entry.display());
    }

    let asset = config.asset_path(cwd);
    if !system.path_exists(&asset) {
        bail!("data asset not found at {}", asset.display());
    }

    assert_invariant(
        true,
        "all packaging preconditions verified before any side effect",
        Some("Builder"),
    );
    Ok(env)
}

/// Removes output and metadata from previous builds so artifacts from
/// different source states never mix.
fn clean_stale_output(system: &impl SystemOps, config: &WorkflowConfig, cwd: &Path) -> Result<()> {
    for dir in [&config.build_dir, &config.dist_dir] {
        let path = cwd.join(dir);
        if system.path_exists(&path) {
            info!("Removing stale {}", path.display());
            system.remove_dir_all(&path)?;
        }
    }

    for spec in system.find_spec_metadata(cwd) {
        info!("Removing stale packaging metadata {}", spec.display());
        system.remove_file(&spec)?;
    }

    assert_invariant(
        system.find_spec_metadata(cwd).is_empty(),
        "no stale packaging metadata remains before packaging",
        Some("Builder"),
    );
    Ok(())
}

/// Runs one external step, surfacing the tool's failure indication verbatim.
fn run_step(system: &impl SystemOps, interpreter: &Path, args: &[&str], label: &str) -> Result<()> {
    info!("Step: {}", label);
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let outcome = system
        .run_command(interpreter, &args)
        .with_context(|| format!("step '{}' could not start", label))?;
    if !outcome.success {
        match outcome.code {
            Some(code) => bail!("step '{}' failed (exit code {})", label, code),
            None => bail!("step '{}' was terminated before completing", label),
        }
    }
    Ok(())
}
