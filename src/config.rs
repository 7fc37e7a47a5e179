//! # Workflow Configuration
//!
//! Defaults describe the stock report application this tool was built around;
//! a `packmule.json` next to the entry script overrides any of them.
//!
//! The one setting that is never guessed is `layout`: whether the data asset
//! lives (and gets embedded) at the working-directory root or under a fixed
//! subfolder. The two layouts produce incompatible bundles, so the choice is
//! explicit configuration rather than a silent default baked into the code.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Optional override file, read from the working directory.
pub const CONFIG_FILE: &str = "packmule.json";

/// Separator in the packaging tool's embed directive (`--add-data SRC<sep>DEST`).
#[cfg(windows)]
pub const ADD_DATA_SEP: char = ';';
#[cfg(not(windows))]
pub const ADD_DATA_SEP: char = ':';

/// Where the data asset lives relative to the working directory, and where it
/// is embedded inside the artifact. A bundle built with one layout is not
/// found by the other layout's checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetLayout {
    /// Asset sits directly in the working directory and is embedded at the
    /// bundle root.
    Root,
    /// Asset sits under `asset_dir` and is embedded under that same name.
    Subdir,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Base name of the build artifact (platform exe suffix is appended).
    pub app_name: String,
    /// Entry script handed to the packaging tool.
    pub entry_script: String,
    /// File name of the spreadsheet checklist the application needs at runtime.
    pub data_asset: String,
    /// Subfolder holding the asset when `layout` is `subdir`.
    pub asset_dir: String,
    pub layout: AssetLayout,
    /// Dependency manifest installed into the environment before packaging.
    pub requirements: String,
    /// Ordered candidate names for the virtual environment directory.
    /// The first one that exists is the environment; there is no second guess.
    pub env_candidates: Vec<String>,
    /// Canonical output directory of the packaging tool.
    pub dist_dir: String,
    /// Scratch directory of the packaging tool, cleared before each build.
    pub build_dir: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            app_name: "StockReportApp".to_string(),
            entry_script: "main.py".to_string(),
            data_asset: "Fundamental_Checklist_v3_value_matrix_fixed.xlsx".to_string(),
            asset_dir: "Checklist".to_string(),
            layout: AssetLayout::Subdir,
            requirements: "requirements.txt".to_string(),
            env_candidates: vec!["venv".to_string(), ".venv".to_string()],
            dist_dir: "dist".to_string(),
            build_dir: "build".to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Loads the config from `dir`, falling back to defaults when no override
    /// file is present. A present-but-invalid file is an error, not a silent
    /// fallback.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid {}", path.display()))
    }

    /// Artifact file name with the host's executable suffix.
    pub fn artifact_file_name(&self) -> String {
        format!("{}{}", self.app_name, std::env::consts::EXE_SUFFIX)
    }

    /// Canonical output location: `<dist_dir>/<name><suffix>`.
    pub fn canonical_artifact(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.dist_dir).join(self.artifact_file_name())
    }

    /// Same-directory fallback the launcher accepts when the canonical
    /// location is empty.
    pub fn fallback_artifact(&self, cwd: &Path) -> PathBuf {
        cwd.join(self.artifact_file_name())
    }

    /// Asset location relative to the working directory, per the layout.
    pub fn asset_relative(&self) -> PathBuf {
        match self.layout {
            AssetLayout::Root => PathBuf::from(&self.data_asset),
            AssetLayout::Subdir => Path::new(&self.asset_dir).join(&self.data_asset),
        }
    }

    pub fn asset_path(&self, cwd: &Path) -> PathBuf {
        cwd.join(self.asset_relative())
    }

    /// Destination path of the asset inside the artifact.
    pub fn embed_destination(&self) -> &str {
        match self.layout {
            AssetLayout::Root => ".",
            AssetLayout::Subdir => &self.asset_dir,
        }
    }

    /// The full `--add-data` directive value, `SRC<sep>DEST`.
    pub fn add_data_directive(&self) -> String {
        format!(
            "{}{}{}",
            self.asset_relative().display(),
            ADD_DATA_SEP,
            self.embed_destination()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_subdir_layout() {
        let config = WorkflowConfig::default();
        assert_eq!(config.layout, AssetLayout::Subdir);
        assert_eq!(
            config.asset_relative(),
            Path::new("Checklist").join("Fundamental_Checklist_v3_value_matrix_fixed.xlsx")
        );
        assert_eq!(config.embed_destination(), "Checklist");
        assert_eq!(config.env_candidates, vec!["venv", ".venv"]);
    }

    #[test]
    fn root_layout_embeds_at_bundle_root() {
        let config = WorkflowConfig {
            layout: AssetLayout::Root,
            ..Default::default()
        };
        assert_eq!(
            config.asset_relative(),
            Path::new("Fundamental_Checklist_v3_value_matrix_fixed.xlsx")
        );
        assert_eq!(config.embed_destination(), ".");
        assert!(config.add_data_directive().ends_with(&format!("{}.", ADD_DATA_SEP)));
    }

    #[test]
    fn artifact_paths_use_dist_then_cwd() {
        let config = WorkflowConfig::default();
        let cwd = Path::new("/work");
        assert_eq!(
            config.canonical_artifact(cwd),
            Path::new("/work").join("dist").join(config.artifact_file_name())
        );
        assert_eq!(
            config.fallback_artifact(cwd),
            Path::new("/work").join(config.artifact_file_name())
        );
    }

    #[test]
    fn load_without_override_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkflowConfig::load(dir.path()).unwrap();
        assert_eq!(config.app_name, WorkflowConfig::default().app_name);
    }

    #[test]
    fn load_merges_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "app_name": "Reporter", "layout": "root" }"#,
        )
        .unwrap();
        let config = WorkflowConfig::load(dir.path()).unwrap();
        assert_eq!(config.app_name, "Reporter");
        assert_eq!(config.layout, AssetLayout::Root);
        // Untouched fields keep their defaults.
        assert_eq!(config.entry_script, "main.py");
    }

    #[test]
    fn load_rejects_malformed_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let err = WorkflowConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
