//! Pipeline policy: the immutable description of what a run produces.
//!
//! The policy is loaded from `config.toml` with the stock listing-photo
//! settings as defaults, validated once, and then shared read-only
//! (`Arc<Policy>`) by the analyzer, the processor and the batch runner.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Output sizes, rendered in this order
    pub sizes: Vec<SizePreset>,

    /// Color correction
    pub color: ColorConfig,

    /// Encoder settings
    pub codec: CodecConfig,

    /// Crop window selection
    pub crop: CropConfig,

    /// Quality analyzer thresholds
    pub quality: QualityThresholds,

    /// Input/output locations
    pub paths: PathsConfig,

    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            color: ColorConfig::default(),
            codec: CodecConfig::default(),
            crop: CropConfig::default(),
            quality: QualityThresholds::default(),
            paths: PathsConfig::default(),
            processing: ProcessingConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Policy {
    /// Load configuration from the default location.
    ///
    /// Returns the default policy if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let policy: Policy = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.pupline.pupline/config.toml
    /// - Linux: ~/.config/pupline/config.toml
    ///
    /// Falls back to ~/.pupline/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "pupline", "pupline")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pupline").join("config.toml")
            })
    }

    /// Input root with `~` expanded.
    pub fn input_root(&self) -> PathBuf {
        expand(&self.paths.input_root)
    }

    /// Output root with `~` expanded.
    pub fn output_root(&self) -> PathBuf {
        expand(&self.paths.output_root)
    }

    /// Directory holding every derivative of one item.
    pub fn item_dir(&self, slug: &str) -> PathBuf {
        self.output_root().join(slug)
    }

    /// Public URL of a derivative file.
    pub fn public_url(&self, slug: &str, file_name: &str) -> String {
        let base = self.paths.public_base_url.trim_end_matches('/');
        format!("{base}/{slug}/{file_name}")
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
