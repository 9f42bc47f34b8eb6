use anyhow::Result;
use tracing::{debug, warn};

use crate::aggregate::AggregateCalculator;
use crate::region::BucketRegionResolver;
use crate::storage::Storage;
use crate::types::{AggregateStats, BucketSummary};

/// Lists buckets with their region and whole-bucket totals.
#[derive(Clone)]
pub struct BucketCatalog {
    storage: Storage,
    region_resolver: BucketRegionResolver,
    aggregate_calculator: AggregateCalculator,
}

impl BucketCatalog {
    pub fn new(storage: Storage) -> Self {
        Self {
            region_resolver: BucketRegionResolver::new(storage.clone()),
            aggregate_calculator: AggregateCalculator::new(storage.clone()),
            storage,
        }
    }

    /// Summaries of every visible bucket, in the order the store lists them.
    ///
    /// A failure to list buckets is an error. Per bucket, a failed region
    /// lookup is `"Unknown"` and any failure while totalling the bucket gives
    /// `NotAccessible` totals; neither stops the other buckets.
    pub async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let buckets = self.storage.list_buckets().await?;
        debug!(buckets = buckets.len(), "listed buckets.");

        let mut summaries = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let region = self.region_resolver.resolve_region(&bucket.name).await;
            let stats = match self.aggregate_calculator.aggregate(&bucket.name, "").await {
                Ok(stats) => stats,
                Err(e) => {
                    warn!(bucket = bucket.name.as_str(), "failed to total bucket: {:#}", e);
                    AggregateStats::not_accessible()
                }
            };

            summaries.push(BucketSummary {
                name: bucket.name,
                creation_date: bucket.creation_date,
                region,
                stats,
            });
        }

        Ok(summaries)
    }
}
