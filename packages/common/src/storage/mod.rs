mod error;
mod hash;
mod hashing;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::path::PathBuf;
use std::sync::Arc;

pub use error::StorageError;
pub use hash::{ContentHash, ContentHasher};
pub use hashing::HashingReader;
pub use traits::{ObjectStore, UploadStream};

use crate::config::{StorageBackend, StorageConfig};

/// Open the object store selected by `config.backend`.
pub async fn open_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = filesystem::FilesystemObjectStore::new(
                PathBuf::from(&config.data_dir),
                config.public_url.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => Ok(Arc::new(s3::S3ObjectStore::from_config(config)?)),
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "S3 backend requires the `object-storage` feature".into(),
        )),
    }
}
