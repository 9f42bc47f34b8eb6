use anyhow::Result;
use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::config::Config;
use crate::types::{BucketEntry, ListPage};

pub mod s3;

/// Type alias for a boxed Storage trait object.
pub type Storage = Box<dyn StorageTrait + Send + Sync>;

/// Object-storage capabilities the browser needs.
///
/// Any store exposing list-with-continuation, delete-key, delete-container and
/// get-region satisfies the contract. Failures are returned as `anyhow::Error`
/// with an [`S3treeError`](crate::types::error::S3treeError) root so callers can
/// tell access-denied apart from other failures.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// Fetch one page of keys under `prefix`.
    ///
    /// With `delimiter`, keys containing the delimiter after the prefix are
    /// grouped into `common_prefixes`. `max_keys` bounds the page size; `None`
    /// leaves it to the store's default.
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> Result<ListPage>;

    /// Delete a single key. Deleting a missing key succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete a bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Raw location constraint of a bucket; `None` or empty for the default region.
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>>;

    /// All buckets visible to the configured credentials.
    async fn list_buckets(&self) -> Result<Vec<BucketEntry>>;
}

dyn_clone::clone_trait_object!(StorageTrait);

/// Create the S3-backed storage for the given configuration.
///
/// Without a client configuration the storage still builds, but every call
/// fails with `S3treeError::Unavailable` before reaching the network.
pub async fn create_storage(config: &Config) -> Storage {
    s3::S3Storage::create(config.target_client_config.as_ref()).await
}
