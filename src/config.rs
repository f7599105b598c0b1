use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReftreeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Declaration extraction settings
    pub parsing: ParsingConfig,

    /// Reference collection settings
    pub collection: CollectionConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Root directory to analyze
    pub root: PathBuf,

    /// File extension to collect (without the leading dot)
    pub extension: String,

    /// Directory names pruned from discovery and from recorded edges
    pub exclude_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Languages the syntax symbol provider may use
    pub languages: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Files collected concurrently
    pub concurrency: usize,

    /// Upper bound for a single symbol or reference lookup
    pub provider_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (text, json)
    pub format: String,

    /// Print full paths next to file names
    pub show_full_paths: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Unnamed Project".to_string(),
            root: PathBuf::from("."),
            extension: "ts".to_string(),
            exclude_dirs: vec!["node_modules".to_string(), ".git".to_string()],
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            languages: vec![
                "rust".to_string(),
                "typescript".to_string(),
                "javascript".to_string(),
                "python".to_string(),
                "java".to_string(),
                "csharp".to_string(),
            ],
            max_file_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            provider_timeout_ms: 5_000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            show_full_paths: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ReftreeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReftreeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Err(ReftreeError::Config(format!(
                        "configuration file {} not found",
                        p.as_ref().display()
                    )))
                }
            }
            None => {
                // Try common config file locations
                let candidates = ["Reftree.toml", "reftree.toml", ".reftree.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.collection.concurrency == 0 {
            return Err(ReftreeError::Config(
                "collection.concurrency must be at least 1".to_string(),
            ));
        }
        if self.collection.provider_timeout_ms == 0 {
            return Err(ReftreeError::Config(
                "collection.provider_timeout_ms must be at least 1".to_string(),
            ));
        }

        let extension = self.project.extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ReftreeError::Config("project.extension must not be empty".to_string()));
        }
        if !extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(ReftreeError::Config(format!(
                "project.extension '{}' contains unsupported characters",
                self.project.extension
            )));
        }

        if self.project.exclude_dirs.iter().any(|d| d.is_empty() || d.contains('/') || d.contains('\\')) {
            return Err(ReftreeError::Config(
                "project.exclude_dirs entries must be single directory names".to_string(),
            ));
        }

        Ok(())
    }
}
