//! Guarded deletion over the virtual hierarchy.
//!
//! Folder and bucket deletes probe the store with a one-key listing before
//! acting, so a non-empty folder or bucket is reported as
//! [`DeleteOutcome::NotEmpty`] instead of being deleted.
//!
//! The probe and the delete are separate calls against an eventually
//! consistent store. A concurrent writer can slip in between them: the guard
//! may then report a stale conflict, or delete a marker whose folder gained
//! content after the probe. This race is accepted.


use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::enumerator::{KeyEnumerator, Page, WalkStep};
use crate::storage::Storage;
use crate::types::DeleteOutcome;
use crate::types::error::S3treeError;

const PROBE_PAGE_LIMIT: i32 = 1;

/// What a one-key probe says about a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// No key starts with the prefix.
    Empty,
    /// The only key is the prefix itself.
    MarkerOnly,
    /// Some other key exists.
    Occupied,
}

/// Classify a probe page taken with a page limit of one.
///
/// A lone marker only counts as `MarkerOnly` when the page is also the last
/// one; otherwise more keys follow it.
pub fn classify_probe(page: &Page, prefix: &str) -> ProbeVerdict {
    match page.entries.as_slice() {
        [] => ProbeVerdict::Empty,
        [only] if only.key == prefix && page.is_last => ProbeVerdict::MarkerOnly,
        _ => ProbeVerdict::Occupied,
    }
}

/// Append `delimiter` to `prefix` unless it already ends with it.
pub fn normalize_folder_prefix(prefix: &str, delimiter: &str) -> String {
    if prefix.ends_with(delimiter) {
        prefix.to_string()
    } else {
        format!("{prefix}{delimiter}")
    }
}

#[derive(Clone)]
pub struct DeletionGuard {
    storage: Storage,
    delimiter: String,
}

impl DeletionGuard {
    pub fn new(storage: Storage, delimiter: &str) -> Self {
        Self {
            storage,
            delimiter: delimiter.to_string(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Delete one key. Deleting a key that does not exist succeeds.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutcome> {
        self.storage.delete_object(bucket, key).await?;

        info!(bucket = bucket, key = key, "object deleted.");
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete a folder if it is empty or holds only its marker object.
    pub async fn delete_folder(&self, bucket: &str, prefix: &str) -> Result<DeleteOutcome> {
        let prefix = normalize_folder_prefix(prefix, &self.delimiter);
        let page = self.probe(bucket, &prefix).await?;

        match classify_probe(&page, &prefix) {
            ProbeVerdict::Empty => {
                debug!(bucket = bucket, prefix = prefix, "folder already absent.");
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            ProbeVerdict::MarkerOnly => {
                self.storage.delete_object(bucket, &prefix).await?;

                info!(bucket = bucket, prefix = prefix, "folder marker deleted.");
                Ok(DeleteOutcome::Deleted)
            }
            ProbeVerdict::Occupied => {
                info!(bucket = bucket, prefix = prefix, "folder is not empty.");
                Ok(DeleteOutcome::NotEmpty)
            }
        }
    }

    /// Delete a bucket if it holds no keys at all.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<DeleteOutcome> {
        let page = self.probe(bucket, "").await?;

        if !page.entries.is_empty() {
            info!(bucket = bucket, "bucket is not empty.");
            return Ok(DeleteOutcome::NotEmpty);
        }

        self.storage.delete_bucket(bucket).await?;

        info!(bucket = bucket, "bucket deleted.");
        Ok(DeleteOutcome::Deleted)
    }

    async fn probe(&self, bucket: &str, prefix: &str) -> Result<Page> {
        let mut enumerator =
            KeyEnumerator::new(&self.storage, bucket, prefix).page_limit(PROBE_PAGE_LIMIT);

        match enumerator.next_step().await? {
            WalkStep::Page(page) => Ok(page),
            WalkStep::Completed => Ok(Page::default()),
            WalkStep::NotAccessible => Err(anyhow!(S3treeError::AccessDenied(format!(
                "s3://{bucket}/{prefix}"
            )))
            .context("deletion probe failed.")),
        }
    }
}
