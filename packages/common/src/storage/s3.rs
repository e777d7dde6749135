use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::traits::{ObjectStore, UploadStream, validate_key};
use crate::config::StorageConfig;

/// S3-compatible object store.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
}

impl S3ObjectStore {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Backend("storage.bucket is not set".into()));
        }

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(backend)?;
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_url: config.public_url.trim_end_matches('/').to_string(),
        })
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Backend(format!(
            "{op} {key} returned HTTP {status}"
        )))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        size_hint: Option<u64>,
        reader: UploadStream<'_>,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let mut reader = reader;
        let response = self
            .bucket
            .put_object_stream(&mut reader, key)
            .await
            .map_err(|e| match e {
                S3Error::Io(io) => StorageError::from(io),
                other => backend(other),
            })?;
        check_status("PUT", key, response.status_code())?;

        debug!(
            key,
            size_hint,
            uploaded = response.uploaded_bytes(),
            "Stored object in S3"
        );
        Ok(format!("{}/{key}", self.public_url))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let response = self.bucket.delete_object(key).await.map_err(backend)?;
        match response.status_code() {
            404 => Ok(()),
            status => check_status("DELETE", key, status),
        }
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        let secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_get(key, secs, None)
            .await
            .map_err(backend)
    }
}
