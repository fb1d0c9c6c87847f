//! Supabase Storage backend over its REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::{object_key, resolve_env_var, ObjectStore, UploadResult};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::types::Derivative;

/// Page size used when listing an item's objects.
const LIST_LIMIT: u32 = 1000;

/// Supabase Storage bucket client.
pub struct SupabaseStore {
    endpoint: String,
    api_key: String,
    bucket: String,
    cache_control_secs: u64,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        bucket: &str,
        cache_control_secs: u64,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Request {
                message: format!("Failed to build HTTP client: {e}"),
                status_code: None,
            })?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
            cache_control_secs,
            client,
        })
    }

    /// Build a store from the `[storage]` config section, resolving
    /// `${ENV_VAR}` references.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let endpoint = resolve_env_var(&config.endpoint).ok_or_else(|| {
            StorageError::NotConfigured(
                "storage endpoint not set. Set SUPABASE_URL or storage.endpoint.".to_string(),
            )
        })?;
        let api_key = resolve_env_var(&config.api_key).ok_or_else(|| {
            StorageError::NotConfigured(
                "storage API key not set. Set SUPABASE_SERVICE_ROLE_KEY or storage.api_key."
                    .to_string(),
            )
        })?;
        if config.bucket.trim().is_empty() {
            return Err(StorageError::NotConfigured("storage.bucket is empty".into()));
        }
        Self::new(
            &endpoint,
            &api_key,
            &config.bucket,
            config.cache_control_secs,
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.endpoint, self.bucket, key)
    }

    fn bucket_object_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.endpoint, self.bucket)
    }

    fn list_url(&self) -> String {
        format!("{}/storage/v1/object/list/{}", self.endpoint, self.bucket)
    }

    fn buckets_url(&self) -> String {
        format!("{}/storage/v1/bucket", self.endpoint)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }

    async fn put_object(&self, derivative: &Derivative, key: &str) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(&derivative.file_path)
            .await
            .map_err(|e| StorageError::Read {
                path: derivative.file_path.clone(),
                message: e.to_string(),
            })?;

        let resp = self
            .authorized(self.client.post(self.object_url(key)))
            .header("content-type", derivative.format.mime_type())
            .header("cache-control", format!("max-age={}", self.cache_control_secs))
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                message: format!("upload request failed: {e}"),
                status_code: None,
            })?;

        check_status(resp).await.map(|_| ())
    }

    async fn list_names(&self, item_id: &str) -> Result<Vec<String>, StorageError> {
        let body = ListRequest {
            prefix: item_id.to_string(),
            limit: LIST_LIMIT,
            offset: 0,
        };
        let resp = self
            .authorized(self.client.post(self.list_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| StorageError::Request {
                message: format!("list request failed: {e}"),
                status_code: None,
            })?;

        let entries: Vec<ObjectEntry> =
            check_status(resp)
                .await?
                .json()
                .await
                .map_err(|e| StorageError::Request {
                    message: format!("failed to parse list response: {e}"),
                    status_code: None,
                })?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }
}

// --- Request/response types ---

#[derive(Serialize)]
struct ListRequest {
    prefix: String,
    limit: u32,
    offset: u32,
}

#[derive(Serialize)]
struct DeleteRequest {
    prefixes: Vec<String>,
}

#[derive(Deserialize)]
struct ObjectEntry {
    name: String,
}

#[derive(Deserialize)]
struct BucketEntry {
    name: String,
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(StorageError::Request {
        message: format!("HTTP {status}: {text}"),
        status_code: Some(status.as_u16()),
    })
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn is_available(&self) -> bool {
        let resp = match self
            .authorized(self.client.get(self.buckets_url()))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Supabase connection failed: {e}");
                return false;
            }
        };
        let resp = match check_status(resp).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Supabase bucket listing failed: {e}");
                return false;
            }
        };
        match resp.json::<Vec<BucketEntry>>().await {
            Ok(buckets) => {
                let found = buckets.iter().any(|b| b.name == self.bucket);
                if !found {
                    tracing::warn!("Bucket '{}' not found", self.bucket);
                }
                found
            }
            Err(e) => {
                tracing::warn!("Failed to parse bucket list: {e}");
                false
            }
        }
    }

    async fn upload(&self, derivative: &Derivative, item_id: &str) -> UploadResult {
        let key = object_key(item_id, derivative);
        match self.put_object(derivative, &key).await {
            Ok(()) => {
                tracing::debug!("Uploaded {key}");
                UploadResult::Uploaded {
                    url: self.public_url(&key),
                    key,
                }
            }
            Err(e) => {
                tracing::warn!("Upload of {key} failed: {e}");
                UploadResult::Failed {
                    key,
                    error: e.to_string(),
                }
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.endpoint, self.bucket, key
        )
    }

    async fn delete_all(&self, item_id: &str) -> Result<usize, StorageError> {
        let names = self.list_names(item_id).await?;
        if names.is_empty() {
            return Ok(0);
        }

        let prefixes: Vec<String> = names
            .iter()
            .map(|name| format!("{item_id}/{name}"))
            .collect();
        let count = prefixes.len();
        let resp = self
            .authorized(self.client.delete(self.bucket_object_url()))
            .json(&DeleteRequest { prefixes })
            .send()
            .await
            .map_err(|e| StorageError::Request {
                message: format!("delete request failed: {e}"),
                status_code: None,
            })?;
        check_status(resp).await?;

        tracing::debug!("Deleted {count} object(s) under {item_id}/");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutputFormat, SizeName};
    use std::path::PathBuf;

    fn store() -> SupabaseStore {
        SupabaseStore::new(
            "https://proj.supabase.co/",
            "service-key",
            "puppies",
            31_536_000,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let s = store();
        assert_eq!(
            s.object_url("abc/card.webp"),
            "https://proj.supabase.co/storage/v1/object/puppies/abc/card.webp"
        );
        assert_eq!(
            s.public_url("abc/card.webp"),
            "https://proj.supabase.co/storage/v1/object/public/puppies/abc/card.webp"
        );
        assert_eq!(
            s.list_url(),
            "https://proj.supabase.co/storage/v1/object/list/puppies"
        );
        assert_eq!(s.buckets_url(), "https://proj.supabase.co/storage/v1/bucket");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = StorageConfig {
            endpoint: "https://proj.supabase.co".into(),
            api_key: "${DEFINITELY_NOT_SET_PUPLINE_KEY}".into(),
            ..StorageConfig::default()
        };
        let err = SupabaseStore::from_config(&config).err().unwrap();
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }

    #[test]
    fn test_from_config_with_literal_values() {
        let config = StorageConfig {
            endpoint: "https://proj.supabase.co".into(),
            api_key: "literal-key".into(),
            ..StorageConfig::default()
        };
        let s = SupabaseStore::from_config(&config).unwrap();
        assert_eq!(s.name(), "supabase");
        assert_eq!(s.bucket, "puppies");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_failed_value() {
        let derivative = Derivative {
            size: SizeName::Card,
            format: OutputFormat::WebP,
            file_path: PathBuf::from("/nonexistent/card.webp"),
            public_url: "/puppies/x/card.webp".into(),
            width: 600,
            height: 600,
            byte_size: 0,
        };
        let result = store().upload(&derivative, "item-1").await;
        match result {
            UploadResult::Failed { key, error } => {
                assert_eq!(key, "item-1/card.webp");
                assert!(error.contains("Failed to read"));
            }
            UploadResult::Uploaded { .. } => panic!("expected failure"),
        }
    }
}
