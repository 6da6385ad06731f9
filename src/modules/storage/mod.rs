//! Evidence file storage.
//!
//! Photos are written under a relative key such as
//! `evidence/20240131120000_photo.jpg`. The key is what gets persisted on the
//! photo row; the backend decides where the bytes live.

mod local;
mod minio;

pub use local::LocalFileStore;
pub use minio::S3FileStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::config::{FileStorageBackend, FileStorageConfig};
use crate::core::error::Result;
use crate::shared::constants::EVIDENCE_PATH_PREFIX;
use crate::shared::validation::sanitize_filename;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `data` under `key` and return the stored key
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Storage key for an uploaded evidence file
pub fn evidence_path(now: DateTime<Utc>, original_name: &str) -> String {
    format!(
        "{}/{}_{}",
        EVIDENCE_PATH_PREFIX,
        now.format("%Y%m%d%H%M%S"),
        sanitize_filename(original_name)
    )
}

/// Build the configured backend
pub async fn build_file_store(config: &FileStorageConfig) -> Result<Arc<dyn FileStore>> {
    match config.backend {
        FileStorageBackend::Local => Ok(Arc::new(LocalFileStore::new(&config.local_dir))),
        FileStorageBackend::S3 => Ok(Arc::new(S3FileStore::new(config.minio.clone()).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_evidence_path_is_timestamped_and_sanitized() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 5).unwrap();
        let path = evidence_path(now, "../jalan rusak.jpg");
        assert!(path.starts_with("evidence/20240131120005_"));
        assert!(!path.contains(".."));
        assert!(!path.contains(' '));
    }
}
