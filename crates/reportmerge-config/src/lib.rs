//! Configuration management and loading for reportmerge.

use anyhow::Context;
use reportmerge_archive::ArchiveConfig;
use reportmerge_output_layout::{DEFAULT_OUTPUT_FOLDER, resolve_output_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration format types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    /// Format implied by a file extension; unknown extensions read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Settings for one merge run.
///
/// Keys also accept the camelCase spelling used by the JavaScript merger
/// (`outputFolderName`, `outputBasePath`, `overwriteExisting`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Name of the output directory, created under `output_base_path`.
    #[serde(default = "default_output_folder_name", alias = "outputFolderName")]
    pub output_folder_name: String,

    #[serde(default = "default_output_base_path", alias = "outputBasePath")]
    pub output_base_path: PathBuf,

    /// Replace an existing output directory instead of failing.
    #[serde(default, alias = "overwriteExisting")]
    pub overwrite_existing: bool,

    /// Debug logging, including a dump of the merged aggregate.
    #[serde(default)]
    pub debug: bool,

    /// How the merged archive is written.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

fn default_output_folder_name() -> String {
    DEFAULT_OUTPUT_FOLDER.to_string()
}

fn default_output_base_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_folder_name: default_output_folder_name(),
            output_base_path: default_output_base_path(),
            overwrite_existing: false,
            debug: false,
            archive: ArchiveConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Directory the merged report is written to.
    pub fn output_dir(&self) -> PathBuf {
        resolve_output_dir(&self.output_base_path, &self.output_folder_name)
    }
}

/// Load configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<MergeConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;

    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON config {}", path.display())),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config {}", path.display())),
    }
}
