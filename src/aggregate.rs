use anyhow::Result;
use tracing::{debug, warn};

use crate::enumerator::{KeyEnumerator, WalkStep};
use crate::storage::Storage;
use crate::types::{AggregateStats, ItemCount};

/// Recursive item count and byte total for a prefix.
#[derive(Clone)]
pub struct AggregateCalculator {
    storage: Storage,
}

impl AggregateCalculator {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Walk every key under `prefix` without a delimiter and total them.
    ///
    /// The key equal to `prefix` (the folder marker) is neither counted nor
    /// sized. An empty prefix totals the whole bucket. A permission failure
    /// anywhere in the walk yields [`AggregateStats::not_accessible`]; other
    /// failures are returned as errors.
    pub async fn aggregate(&self, bucket: &str, prefix: &str) -> Result<AggregateStats> {
        let mut enumerator = KeyEnumerator::new(&self.storage, bucket, prefix);
        let mut item_count: u64 = 0;
        let mut total_bytes: u64 = 0;

        loop {
            match enumerator.next_step().await? {
                WalkStep::Page(page) => {
                    for entry in page.entries.iter().filter(|entry| entry.key != prefix) {
                        item_count += 1;
                        total_bytes = total_bytes.saturating_add(entry.size);
                    }
                }
                WalkStep::Completed => break,
                WalkStep::NotAccessible => {
                    warn!(
                        bucket = bucket,
                        prefix = prefix,
                        "aggregate is not accessible."
                    );
                    return Ok(AggregateStats::not_accessible());
                }
            }
        }

        debug!(
            bucket = bucket,
            prefix = prefix,
            item_count = item_count,
            total_bytes = total_bytes,
            "aggregate completed."
        );

        Ok(AggregateStats {
            item_count: ItemCount::Known(item_count),
            total_bytes,
        })
    }
}
