//! Access to the object storage under test.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::StorageError;

pub mod in_memory;
mod s3_compatible;

pub use in_memory::InMemoryStorage;
pub use s3_compatible::{S3CompatibleConfig, S3CompatibleStorage};

/// A shared, type-erased [`ObjectStorage`] instance.
pub type BoxedStorage = Arc<dyn ObjectStorage>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// An object returned from a bucket listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListedObject {
    /// The object key.
    pub name: String,
    /// The object size in bytes, as reported by the listing.
    pub size: u64,
}

/// The operations a benchmark needs from an object storage backend.
///
/// Backend failures are returned, never swallowed.
#[async_trait::async_trait]
pub trait ObjectStorage: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns whether the bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    /// Creates the bucket.
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Writes `payload` under `name`.
    async fn put(&self, bucket: &str, name: &str, payload: Bytes) -> StorageResult<()>;

    /// Reads the full contents of the object.
    ///
    /// The body is drained completely before this returns.
    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes>;

    /// Lists up to `max_keys` objects in the bucket, in backend order.
    async fn list(&self, bucket: &str, max_keys: usize) -> StorageResult<Vec<ListedObject>>;
}
