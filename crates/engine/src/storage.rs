//! Object-storage client port.

use async_trait::async_trait;
use std::sync::Arc;

use crate::Result;
use crate::config::StorageConfig;
use crate::stream::BoxByteSource;

/// A readable object.
pub struct StoredObject {
    /// Object body.
    pub body: BoxByteSource,
    /// Size reported by the store, if known.
    pub content_length: Option<u64>,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Operations the engine needs from a connected object store.
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// Whether `bucket` exists and is visible to these credentials.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Open `key` in `bucket`; `None` when the object does not exist.
    async fn object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>>;
}

/// Builds [`ObjectStorageClient`]s for a region.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    /// Connect to `region`. Empty credentials in `config` mean ambient credentials.
    async fn connect(
        &self,
        config: &StorageConfig,
        region: &str,
    ) -> Result<Arc<dyn ObjectStorageClient>>;
}
