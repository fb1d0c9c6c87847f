//! Stand-in store used when uploads are requested but storage is not
//! configured.

use async_trait::async_trait;

use super::provider::{object_key, ObjectStore, UploadResult};
use crate::error::StorageError;
use crate::types::Derivative;

/// Store that rejects every upload with the configuration problem, so a
/// batch still reports each derivative as `Failed` instead of aborting.
pub struct DisabledStore {
    reason: String,
}

impl DisabledStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for DisabledStore {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn upload(&self, derivative: &Derivative, item_id: &str) -> UploadResult {
        UploadResult::Failed {
            key: object_key(item_id, derivative),
            error: self.reason.clone(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        key.to_string()
    }

    async fn delete_all(&self, _item_id: &str) -> Result<usize, StorageError> {
        Err(StorageError::NotConfigured(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutputFormat, SizeName};
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_uploads_fail_with_reason() {
        let store = DisabledStore::new("storage API key not set");
        let derivative = Derivative {
            size: SizeName::Hero,
            format: OutputFormat::Jpeg,
            file_path: PathBuf::from("/out/hero.jpg"),
            public_url: "/puppies/x/hero.jpg".into(),
            width: 1200,
            height: 900,
            byte_size: 10,
        };

        assert!(!store.is_available().await);
        assert_eq!(
            store.upload(&derivative, "x").await,
            UploadResult::Failed {
                key: "x/hero.jpg".into(),
                error: "storage API key not set".into(),
            }
        );
        assert!(store.delete_all("x").await.is_err());
    }
}
