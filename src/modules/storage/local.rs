use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::FileStore;
use crate::core::error::{AppError, Result};

/// Writes files below a root directory on the local disk
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(AppError::BadRequest(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::FileStorage(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(&path, &data).await.map_err(|e| {
            AppError::FileStorage(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        debug!("Stored {} bytes at '{}'", data.len(), path.display());
        Ok(key.to_string())
    }
}
