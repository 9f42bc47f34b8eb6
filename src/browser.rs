use anyhow::Result;
use tracing::debug;

use crate::aggregate::AggregateCalculator;
use crate::catalog::BucketCatalog;
use crate::config::{Command, Config};
use crate::hierarchy::HierarchyResolver;
use crate::region::BucketRegionResolver;
use crate::response::{
    BucketResponse, CommandResponse, ListingResponse, MutationResponse, RegionResponse,
    StatsResponse,
};
use crate::safety::{DeletionGuard, normalize_folder_prefix};
use crate::storage::{Storage, create_storage};
use crate::types::{AggregateStats, BucketSummary, DeleteOutcome, OneLevelListing};

/// Folder/file view of an S3 account with guarded deletes.
///
/// Every call reads the store afresh; nothing is cached between calls.
///
/// # Example
///
/// ```no_run
/// use s3tree_rs::{Config, ObjectBrowser};
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = Config::from_environment();
/// let browser = ObjectBrowser::create(&config).await;
///
/// let listing = browser.list_objects("demo", "docs/").await?;
/// for folder in &listing.folders {
///     println!("{} ({})", folder.name, folder.stats.item_count);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ObjectBrowser {
    hierarchy_resolver: HierarchyResolver,
    aggregate_calculator: AggregateCalculator,
    region_resolver: BucketRegionResolver,
    bucket_catalog: BucketCatalog,
    deletion_guard: DeletionGuard,
}

impl ObjectBrowser {
    pub fn new(config: &Config, storage: Storage) -> Self {
        Self {
            hierarchy_resolver: HierarchyResolver::new(
                storage.clone(),
                &config.delimiter,
                config.max_keys,
            ),
            aggregate_calculator: AggregateCalculator::new(storage.clone()),
            region_resolver: BucketRegionResolver::new(storage.clone()),
            bucket_catalog: BucketCatalog::new(storage.clone()),
            deletion_guard: DeletionGuard::new(storage, &config.delimiter),
        }
    }

    /// Build a browser backed by S3 as described by `config`.
    pub async fn create(config: &Config) -> Self {
        let storage = create_storage(config).await;
        Self::new(config, storage)
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        self.bucket_catalog.list_buckets().await
    }

    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<OneLevelListing> {
        self.hierarchy_resolver.list_one_level(bucket, prefix).await
    }

    pub async fn folder_stats(&self, bucket: &str, prefix: &str) -> Result<AggregateStats> {
        self.aggregate_calculator.aggregate(bucket, prefix).await
    }

    pub async fn bucket_region(&self, bucket: &str) -> String {
        self.region_resolver.resolve_region(bucket).await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutcome> {
        self.deletion_guard.delete_object(bucket, key).await
    }

    pub async fn delete_folder(&self, bucket: &str, prefix: &str) -> Result<DeleteOutcome> {
        self.deletion_guard.delete_folder(bucket, prefix).await
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<DeleteOutcome> {
        self.deletion_guard.delete_bucket(bucket).await
    }

    /// Run one command and shape its result for output.
    ///
    /// A refused deletion is a response, not an error; see
    /// [`CommandResponse::exit_code`].
    pub async fn execute(&self, command: &Command) -> Result<CommandResponse> {
        debug!(command = ?command, "executing command.");

        let response = match command {
            Command::ListBuckets => {
                let summaries = self.list_buckets().await?;
                CommandResponse::Buckets(summaries.iter().map(BucketResponse::from).collect())
            }
            Command::List { bucket, prefix } => {
                let listing = self.list_objects(bucket, prefix).await?;
                CommandResponse::Listing(ListingResponse::from(&listing))
            }
            Command::Stats { bucket, prefix } => {
                let stats = self.folder_stats(bucket, prefix).await?;
                CommandResponse::Stats(StatsResponse::new(bucket, prefix, &stats))
            }
            Command::Region { bucket } => CommandResponse::Region(RegionResponse {
                bucket: bucket.clone(),
                region: self.bucket_region(bucket).await,
            }),
            Command::DeleteObject { bucket, key } => {
                self.delete_object(bucket, key).await?;
                CommandResponse::Mutation(MutationResponse::object_deleted(key))
            }
            Command::DeleteFolder { bucket, prefix } => {
                let outcome = self.delete_folder(bucket, prefix).await?;
                let prefix = normalize_folder_prefix(prefix, self.deletion_guard.delimiter());
                CommandResponse::Mutation(MutationResponse::for_folder(&prefix, outcome))
            }
            Command::DeleteBucket { bucket } => {
                let outcome = self.delete_bucket(bucket).await?;
                CommandResponse::Mutation(MutationResponse::for_bucket(bucket, outcome))
            }
        };

        Ok(response)
    }
}
