//! Configuration management for asset-refs
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (asset-refs.toml)
//! - Environment variables (ASSET_REFS__*)
//!
//! ## Example config file (asset-refs.toml):
//! ```toml
//! [locator]
//! project_root = "."
//! content_dir = "Assets"
//! script_extensions = ["cs"]
//!
//! [output]
//! format = "text"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::locate::FsScriptStore;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Script lookup settings
    #[serde(default)]
    pub locator: LocatorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where and how owner scripts are searched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Project root; reported script paths are relative to it
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Content folder under the project root that is searched
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// File extensions treated as scripts
    #[serde(default = "default_script_extensions")]
    pub script_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_content_dir() -> String {
    "Assets".to_string()
}

fn default_script_extensions() -> Vec<String> {
    vec!["cs".to_string()]
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            content_dir: default_content_dir(),
            script_extensions: default_script_extensions(),
        }
    }
}

impl FinderConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "asset-refs.toml",
            ".asset-refs.toml",
            "config/asset-refs.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "asset-refs") {
            let xdg_config = config_dir.config_dir().join("asset-refs.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ASSET_REFS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("locator.script_extensions")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Project root with relative paths resolved against the current directory
    pub fn project_root(&self) -> PathBuf {
        if self.locator.project_root.is_absolute() {
            self.locator.project_root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.locator.project_root)
        }
    }

    /// Script store over the resolved content root
    pub fn script_store(&self) -> FsScriptStore {
        FsScriptStore::new(
            self.project_root(),
            self.locator.content_dir.clone(),
            self.locator.script_extensions.clone(),
        )
    }
}
