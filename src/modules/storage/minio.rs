//! MinIO/S3-compatible evidence storage backed by the rust-s3 crate.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::FileStore;
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

pub struct S3FileStore {
    bucket: Box<Bucket>,
}

impl S3FileStore {
    /// Connect to the bucket, creating it when missing
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // MinIO wants http://endpoint/bucket rather than http://bucket.endpoint
        bucket.set_path_style();

        match Bucket::create_with_path_style(
            &config.bucket,
            region,
            credentials,
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => info!("Bucket '{}' created", config.bucket),
            Err(e) => {
                let message = e.to_string();
                if message.contains("BucketAlreadyOwnedByYou")
                    || message.contains("BucketAlreadyExists")
                {
                    debug!("Bucket '{}' already exists", config.bucket);
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        config.bucket, e
                    );
                }
            }
        }

        info!(
            "S3 file store initialized for endpoint: {}, bucket: {}",
            config.endpoint, config.bucket
        );

        Ok(Self { bucket })
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::FileStorage(format!("Failed to upload '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(key.to_string())
    }
}
