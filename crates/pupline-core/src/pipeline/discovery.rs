//! Source discovery: one subfolder per item, images directly inside.
//!
//! Folder names follow `{breed}-{color}-{sex}` (e.g. `spitz-branco-macho`).
//! The whole folder name becomes the slug; the second and third segments
//! supply the color and sex.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::PipelineError;
use crate::types::{ItemIdentity, Sex};

use super::naming::sanitize;

/// A source image paired with the item it belongs to.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub identity: ItemIdentity,
}

/// Discovers source images under an input root.
pub struct SourceDiscovery {
    extensions: Vec<String>,
}

impl SourceDiscovery {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            extensions: config
                .supported_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    /// Find every supported image in the immediate subfolders of `root`.
    ///
    /// Files directly in `root` and deeper nesting are ignored. Results are
    /// sorted by path.
    pub fn discover(&self, root: &Path) -> Result<Vec<SourceImage>, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::SourceRootMissing(root.to_path_buf()));
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_supported(path) {
                continue;
            }

            let Some(folder) = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
            else {
                continue;
            };

            match identity_from_folder(folder) {
                Ok(identity) => images.push(SourceImage {
                    path: path.to_path_buf(),
                    identity,
                }),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        images.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(images)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Derive an item identity from a folder name.
pub fn identity_from_folder(name: &str) -> Result<ItemIdentity, PipelineError> {
    let parts: Vec<&str> = name.split('-').collect();
    let mut identity = ItemIdentity::new(sanitize(name))?;
    if let Some(color) = parts.get(1) {
        identity = identity.with_color(*color);
    }
    if let Some(sex) = parts.get(2) {
        identity = identity.with_sex(Sex::from_token(sex));
    }
    Ok(identity)
}
