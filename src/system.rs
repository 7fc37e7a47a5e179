use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Outcome of a blocking external process invocation.
///
/// `code` is `None` when the process was terminated by a signal
/// (possible on non-Windows hosts).
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

/// Abstraction for host interactions (file system, child processes, console).
/// This allows us to mock the destructive and slow parts (deleting build
/// output, running installers and the packaging tool) for testing.
pub trait SystemOps {
    /// Check if a file or directory exists on the file system.
    fn path_exists(&self, path: &Path) -> bool;

    /// Remove a directory tree (stale build output).
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a single file (stale packaging metadata).
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// List packaging metadata files (`*.spec`) directly inside `dir`.
    /// Shallow on purpose: metadata is only ever written at the root.
    fn find_spec_metadata(&self, dir: &Path) -> Vec<PathBuf>;

    /// Run a program to completion with the console inherited, so the
    /// operator sees installer/tool output live. Blocks until exit.
    fn run_command(&self, program: &Path, args: &[String]) -> Result<RunOutcome>;

    /// Block until the operator acknowledges (keeps the console open so
    /// diagnostics and crash output stay visible).
    fn await_operator_ack(&self);
}

/// The real host implementation (production).
pub struct RealSystem;

impl SystemOps for RealSystem {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory {}", path.display()))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove file {}", path.display()))
    }

    fn find_spec_metadata(&self, dir: &Path) -> Vec<PathBuf> {
        // Only go 1 level deep: subdirectories (dist, build, the venv itself)
        // are not scanned.
        WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == "spec")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect()
    }

    fn run_command(&self, program: &Path, args: &[String]) -> Result<RunOutcome> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to start {}", program.display()))?;
        Ok(RunOutcome {
            success: status.success(),
            code: status.code(),
        })
    }

    fn await_operator_ack(&self) {
        print!("Press Enter to close... ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}

/// A mock host for testing.
///
/// The file system is a flat list of paths; a path "exists" if it or one of
/// its descendants was inserted. Commands are recorded instead of spawned,
/// and their outcomes are scripted per test via substring matches.
#[derive(Debug, Default)]
pub struct MockSystem {
    pub file_system: std::sync::Mutex<Vec<PathBuf>>,
    /// Every invocation, flattened to "program arg arg ...".
    pub commands_run: std::sync::Mutex<Vec<String>>,
    /// Commands whose flattened form contains the substring exit non-zero.
    pub failing: std::sync::Mutex<Vec<(String, i32)>>,
    /// Commands whose flattened form contains the substring fail to spawn.
    pub unspawnable: std::sync::Mutex<Vec<String>>,
    /// Paths that appear after a successful command containing the substring
    /// (simulates the packaging tool dropping its artifact).
    pub created_on_run: std::sync::Mutex<Vec<(String, PathBuf)>>,
    pub acks_requested: std::sync::Mutex<u32>,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose file system already contains `paths`.
    pub fn with_files(paths: &[&Path]) -> Self {
        let system = Self::default();
        {
            let mut fs = system.file_system.lock().unwrap();
            for p in paths {
                fs.push(p.to_path_buf());
            }
        }
        system
    }

    pub fn add_file(&self, path: &Path) {
        self.file_system.lock().unwrap().push(path.to_path_buf());
    }

    pub fn command_log(&self) -> Vec<String> {
        self.commands_run.lock().unwrap().clone()
    }
}

impl SystemOps for MockSystem {
    fn path_exists(&self, path: &Path) -> bool {
        let fs = self.file_system.lock().unwrap();
        fs.iter().any(|p| p == path || p.starts_with(path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut fs = self.file_system.lock().unwrap();
        fs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut fs = self.file_system.lock().unwrap();
        fs.retain(|p| p != path);
        Ok(())
    }

    fn find_spec_metadata(&self, dir: &Path) -> Vec<PathBuf> {
        let fs = self.file_system.lock().unwrap();
        fs.iter()
            .filter(|p| p.parent() == Some(dir))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == "spec")
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn run_command(&self, program: &Path, args: &[String]) -> Result<RunOutcome> {
        let flat = std::iter::once(program.to_string_lossy().to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.commands_run.lock().unwrap().push(flat.clone());

        if self
            .unspawnable
            .lock()
            .unwrap()
            .iter()
            .any(|needle| flat.contains(needle))
        {
            anyhow::bail!("mock refused to spawn: {}", flat);
        }

        if let Some((_, code)) = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| flat.contains(needle))
        {
            return Ok(RunOutcome {
                success: false,
                code: Some(*code),
            });
        }

        for (needle, path) in self.created_on_run.lock().unwrap().iter() {
            if flat.contains(needle) {
                self.file_system.lock().unwrap().push(path.clone());
            }
        }

        Ok(RunOutcome {
            success: true,
            code: Some(0),
        })
    }

    fn await_operator_ack(&self) {
        *self.acks_requested.lock().unwrap() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_fs_treats_inserted_paths_as_existing_with_ancestors() {
        let system = MockSystem::with_files(&[Path::new("/work/dist/App.exe")]);
        assert!(system.path_exists(Path::new("/work/dist/App.exe")));
        assert!(system.path_exists(Path::new("/work/dist")));
        assert!(!system.path_exists(Path::new("/work/build")));
    }

    #[test]
    fn mock_remove_dir_all_drops_the_whole_subtree() {
        let system = MockSystem::with_files(&[
            Path::new("/work/build/lib/app.pyc"),
            Path::new("/work/main.py"),
        ]);
        system.remove_dir_all(Path::new("/work/build")).unwrap();
        assert!(!system.path_exists(Path::new("/work/build")));
        assert!(system.path_exists(Path::new("/work/main.py")));
    }

    #[test]
    fn mock_scripted_failure_and_ack_recording() {
        let system = MockSystem::new();
        system.failing.lock().unwrap().push(("pip".to_string(), 2));

        let outcome = system
            .run_command(Path::new("python"), &["-m".into(), "pip".into()])
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(2));

        system.await_operator_ack();
        assert_eq!(*system.acks_requested.lock().unwrap(), 1);
    }

    #[test]
    fn real_system_spec_metadata_scan_is_shallow() {
        use std::fs;
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("App.spec"), "# pyinstaller").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("Other.spec"), "x").unwrap();

        let found = RealSystem.find_spec_metadata(dir.path());
        assert_eq!(found, vec![dir.path().join("App.spec")]);
    }

    #[test]
    fn real_system_removals() {
        use std::fs;
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("lib")).unwrap();
        let spec = dir.path().join("App.spec");
        fs::write(&spec, "x").unwrap();

        RealSystem.remove_dir_all(&build).unwrap();
        RealSystem.remove_file(&spec).unwrap();
        assert!(!build.exists());
        assert!(!spec.exists());

        // Removing what is already gone is an error the caller surfaces.
        assert!(RealSystem.remove_file(&spec).is_err());
    }
}
