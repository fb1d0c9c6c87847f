//! Object store trait and upload result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::types::Derivative;

/// Outcome of uploading one derivative. Failures are values, never `Err`,
/// so one bad upload cannot abort the rest of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResult {
    Uploaded { key: String, url: String },
    Failed { key: String, error: String },
}

impl UploadResult {
    pub fn key(&self) -> &str {
        match self {
            UploadResult::Uploaded { key, .. } | UploadResult::Failed { key, .. } => key,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadResult::Uploaded { .. })
    }
}

/// Storage key of a derivative: `{item_id}/{size}.{ext}`.
pub fn object_key(item_id: &str, derivative: &Derivative) -> String {
    format!(
        "{}/{}.{}",
        item_id,
        derivative.size,
        derivative.format.extension()
    )
}

/// Trait that all object store backends implement.
///
/// Uses `async_trait` so stores can be shared as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging (e.g., "supabase").
    fn name(&self) -> &str;

    /// Check whether the store is reachable and the bucket exists.
    async fn is_available(&self) -> bool;

    /// Upload (upsert) one derivative under `{item_id}/{size}.{ext}`.
    async fn upload(&self, derivative: &Derivative, item_id: &str) -> UploadResult;

    /// Public URL for a stored key.
    fn public_url(&self, key: &str) -> String;

    /// Remove every object stored for an item. Returns how many were removed.
    async fn delete_all(&self, item_id: &str) -> Result<usize, StorageError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
