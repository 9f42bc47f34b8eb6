use anyhow::{Result, anyhow};
use tracing::debug;

use crate::aggregate::AggregateCalculator;
use crate::enumerator::{KeyEnumerator, Page, WalkStep};
use crate::storage::Storage;
use crate::types::error::S3treeError;
use crate::types::{FileEntry, Folder, OneLevelListing};

/// Display name of a folder: the common prefix with trailing delimiters
/// stripped, last segment. `None` when that leaves nothing.
pub fn folder_display_name(common_prefix: &str, delimiter: &str) -> Option<String> {
    common_prefix
        .trim_end_matches(delimiter)
        .rsplit(delimiter)
        .next()
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// Display name of a file: last delimiter-separated segment of its key.
pub fn file_display_name(key: &str, delimiter: &str) -> Option<String> {
    key.rsplit(delimiter)
        .next()
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// Builds the one-level folder/file view of a prefix.
#[derive(Clone)]
pub struct HierarchyResolver {
    storage: Storage,
    delimiter: String,
    max_keys: i32,
    aggregate_calculator: AggregateCalculator,
}

impl HierarchyResolver {
    pub fn new(storage: Storage, delimiter: &str, max_keys: i32) -> Self {
        Self {
            aggregate_calculator: AggregateCalculator::new(storage.clone()),
            storage,
            delimiter: delimiter.to_string(),
            max_keys,
        }
    }

    /// List the folders and files directly under `prefix`.
    ///
    /// Only the first page (up to `max_keys`) is read. Every folder found is
    /// then walked in full to attach its stats, one folder after another; an
    /// inaccessible folder gets the `NotAccessible` sentinel and the others
    /// are unaffected. Access denied on the listing itself is an error.
    pub async fn list_one_level(&self, bucket: &str, prefix: &str) -> Result<OneLevelListing> {
        let page = self.first_page(bucket, prefix).await?;

        let mut folders = Vec::with_capacity(page.common_prefixes.len());
        for common_prefix in page.common_prefixes {
            let Some(name) = folder_display_name(&common_prefix, &self.delimiter) else {
                continue;
            };
            let stats = self
                .aggregate_calculator
                .aggregate(bucket, &common_prefix)
                .await?;
            folders.push(Folder {
                name,
                prefix: common_prefix,
                stats,
            });
        }

        let files = page
            .entries
            .into_iter()
            .filter(|entry| entry.key != prefix)
            .filter_map(|entry| {
                let name = file_display_name(&entry.key, &self.delimiter)?;
                Some(FileEntry {
                    name,
                    key: entry.key,
                    size: entry.size,
                    last_modified: entry.last_modified,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            bucket = bucket,
            prefix = prefix,
            folders = folders.len(),
            files = files.len(),
            "one-level listing completed."
        );

        Ok(OneLevelListing {
            prefix: prefix.to_string(),
            folders,
            files,
        })
    }

    async fn first_page(&self, bucket: &str, prefix: &str) -> Result<Page> {
        let mut enumerator = KeyEnumerator::new(&self.storage, bucket, prefix)
            .delimiter(&self.delimiter)
            .page_limit(self.max_keys);

        match enumerator.next_step().await? {
            WalkStep::Page(page) => Ok(page),
            WalkStep::Completed => Ok(Page::default()),
            WalkStep::NotAccessible => Err(anyhow!(S3treeError::AccessDenied(format!(
                "s3://{bucket}/{prefix}"
            )))
            .context("one-level listing failed.")),
        }
    }
}
