//! Shared test utilities for the s3tree library crate.
//!
//! Provides the dummy tracing subscriber, a default test [`Config`] and an
//! in-memory [`StorageTrait`] implementation that mimics S3 listing semantics
//! (prefix filter, delimiter grouping, `max_keys` pagination with continuation
//! tokens) with switches for injecting failures.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::primitives::DateTime;

use crate::config::Config;
use crate::storage::{Storage, StorageTrait};
use crate::types::error::S3treeError;
use crate::types::{BucketEntry, ListPage, ObjectEntry};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Default [`Config`] for unit tests: no client, `/` delimiter, 1000 keys per page.
pub(crate) fn make_test_config() -> Config {
    Config::default()
}

/// Store call recorded by [`InMemoryStorage`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StorageCall {
    ListObjects {
        bucket: String,
        prefix: String,
        delimiter: Option<String>,
        max_keys: Option<i32>,
    },
    DeleteObject {
        bucket: String,
        key: String,
    },
    DeleteBucket {
        bucket: String,
    },
    GetBucketLocation {
        bucket: String,
    },
    ListBuckets,
}

#[derive(Debug, Clone)]
struct InMemoryBucket {
    objects: BTreeMap<String, ObjectEntry>,
    location: Option<String>,
    creation_date: DateTime,
}

#[derive(Debug, Clone)]
struct DenyRule {
    bucket: String,
    prefix: String,
    after_first_page: bool,
}

#[derive(Debug, Default)]
struct InMemoryState {
    buckets: BTreeMap<String, InMemoryBucket>,
    deny_rules: Vec<DenyRule>,
    failing_list_buckets: HashSet<String>,
    failing_location_buckets: HashSet<String>,
    calls: Vec<StorageCall>,
}

/// In-memory S3 double. Clones share state, so a test keeps one handle to
/// inspect what a component did through another.
#[derive(Clone, Default)]
pub(crate) struct InMemoryStorage {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn boxed(&self) -> Storage {
        Box::new(self.clone())
    }

    pub(crate) fn add_bucket(&self, bucket: &str, location: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        let creation_date = DateTime::from_secs(1_700_000_000 + state.buckets.len() as i64);
        state.buckets.insert(
            bucket.to_string(),
            InMemoryBucket {
                objects: BTreeMap::new(),
                location: location.map(String::from),
                creation_date,
            },
        );
    }

    pub(crate) fn put_object(&self, bucket: &str, key: &str, size: u64) {
        let mut state = self.state.lock().unwrap();
        let bucket = state
            .buckets
            .get_mut(bucket)
            .expect("bucket must be added before putting objects");
        bucket.objects.insert(
            key.to_string(),
            ObjectEntry::new(key, size, Some(DateTime::from_secs(1000))),
        );
    }

    /// Listings whose prefix starts with `prefix` fail with AccessDenied.
    pub(crate) fn deny_prefix(&self, bucket: &str, prefix: &str) {
        self.state.lock().unwrap().deny_rules.push(DenyRule {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            after_first_page: false,
        });
    }

    /// Like [`deny_prefix`](Self::deny_prefix) but the first page still succeeds.
    pub(crate) fn deny_prefix_after_first_page(&self, bucket: &str, prefix: &str) {
        self.state.lock().unwrap().deny_rules.push(DenyRule {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            after_first_page: true,
        });
    }

    /// Listings in `bucket` fail with a non-permission error.
    pub(crate) fn fail_listing(&self, bucket: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_list_buckets
            .insert(bucket.to_string());
    }

    pub(crate) fn fail_location(&self, bucket: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_location_buckets
            .insert(bucket.to_string());
    }

    pub(crate) fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    pub(crate) fn calls(&self) -> Vec<StorageCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn list_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StorageCall::ListObjects { .. }))
            .count()
    }

    pub(crate) fn delete_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    StorageCall::DeleteObject { .. } | StorageCall::DeleteBucket { .. }
                )
            })
            .count()
    }

    fn record(&self, call: StorageCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn no_such_bucket(bucket: &str) -> anyhow::Error {
    anyhow!(S3treeError::AwsSdk(format!(
        "NoSuchBucket (The specified bucket does not exist: {bucket})"
    )))
}

/// One page of S3-style listing over a sorted key map.
///
/// Entries and common prefixes together count towards `max_keys`. The
/// continuation token is the last key or common prefix returned; resumed pages
/// skip keys and common prefixes at or before it.
fn list_page(
    objects: &BTreeMap<String, ObjectEntry>,
    prefix: &str,
    delimiter: Option<&str>,
    start_after: Option<&str>,
    max_keys: usize,
) -> ListPage {
    let mut page = ListPage::default();
    let mut last_returned: Option<String> = None;

    for (key, entry) in objects.range(prefix.to_string()..) {
        if !key.starts_with(prefix) {
            break;
        }
        if start_after.is_some_and(|after| key.as_str() <= after) {
            continue;
        }

        let common_prefix = delimiter.filter(|d| !d.is_empty()).and_then(|delimiter| {
            let after_prefix = &key[prefix.len()..];
            after_prefix
                .find(delimiter)
                .map(|pos| format!("{}{}{}", prefix, &after_prefix[..pos], delimiter))
        });

        if let Some(common_prefix) = &common_prefix {
            let already_returned = start_after.is_some_and(|after| common_prefix.as_str() <= after)
                || last_returned.as_ref() == Some(common_prefix);
            if already_returned {
                continue;
            }
        }

        if page.common_prefixes.len() + page.entries.len() >= max_keys {
            page.next_continuation_token = last_returned;
            break;
        }

        match common_prefix {
            Some(common_prefix) => {
                last_returned = Some(common_prefix.clone());
                page.common_prefixes.push(common_prefix);
            }
            None => {
                last_returned = Some(key.clone());
                page.entries.push(entry.clone());
            }
        }
    }

    page
}

#[async_trait]
impl StorageTrait for InMemoryStorage {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> Result<ListPage> {
        self.record(StorageCall::ListObjects {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            delimiter: delimiter.map(String::from),
            max_keys,
        });

        let state = self.state.lock().unwrap();
        if state.failing_list_buckets.contains(bucket) {
            return Err(anyhow!(S3treeError::AwsSdk(
                "InternalError (We encountered an internal error)".to_string()
            )));
        }
        let denied = state.deny_rules.iter().any(|rule| {
            rule.bucket == bucket
                && prefix.starts_with(&rule.prefix)
                && (!rule.after_first_page || continuation_token.is_some())
        });
        if denied {
            return Err(anyhow!(S3treeError::AccessDenied(
                "AccessDenied (Access Denied)".to_string()
            )));
        }

        let objects = &state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .objects;
        let max_keys = max_keys.map_or(1000, |n| n.max(1) as usize);

        Ok(list_page(
            objects,
            prefix,
            delimiter,
            continuation_token.as_deref(),
            max_keys,
        ))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.record(StorageCall::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        let bucket = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        bucket.objects.remove(key);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.record(StorageCall::DeleteBucket {
            bucket: bucket.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        let existing = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        if !existing.objects.is_empty() {
            return Err(anyhow!(S3treeError::AwsSdk(
                "BucketNotEmpty (The bucket you tried to delete is not empty)".to_string()
            )));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        self.record(StorageCall::GetBucketLocation {
            bucket: bucket.to_string(),
        });

        let state = self.state.lock().unwrap();
        if state.failing_location_buckets.contains(bucket) {
            return Err(anyhow!(S3treeError::AccessDenied(
                "AccessDenied (Access Denied)".to_string()
            )));
        }
        Ok(state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .location
            .clone())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketEntry>> {
        self.record(StorageCall::ListBuckets);

        Ok(self
            .state
            .lock()
            .unwrap()
            .buckets
            .iter()
            .map(|(name, bucket)| BucketEntry {
                name: name.clone(),
                creation_date: Some(bucket.creation_date),
            })
            .collect())
    }
}

/// Buckets used by the scenario tests:
///
/// - `demo`: `docs/` (marker), `docs/a.txt` (100 B), `docs/sub/b.txt` (200 B)
/// - `empty-co`: only the `trash/` marker
/// - `void`: no keys
/// - `full`: `x.txt`
pub(crate) fn make_scenario_storage() -> InMemoryStorage {
    let storage = InMemoryStorage::new();

    storage.add_bucket("demo", None);
    storage.put_object("demo", "docs/", 0);
    storage.put_object("demo", "docs/a.txt", 100);
    storage.put_object("demo", "docs/sub/b.txt", 200);

    storage.add_bucket("empty-co", Some("eu-west-1"));
    storage.put_object("empty-co", "trash/", 0);

    storage.add_bucket("void", Some(""));

    storage.add_bucket("full", Some("ap-northeast-1"));
    storage.put_object("full", "x.txt", 1);

    storage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_objects(keys: &[&str]) -> BTreeMap<String, ObjectEntry> {
        keys.iter()
            .map(|key| (key.to_string(), ObjectEntry::new(key, 1, None)))
            .collect()
    }

    #[test]
    fn list_page_groups_by_delimiter() {
        let objects = make_objects(&["a.txt", "docs/", "docs/a.txt", "docs/sub/b.txt", "img/x"]);

        let page = list_page(&objects, "", Some("/"), None, 1000);
        assert_eq!(page.common_prefixes, vec!["docs/", "img/"]);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].key, "a.txt");
        assert!(page.next_continuation_token.is_none());

        let page = list_page(&objects, "docs/", Some("/"), None, 1000);
        assert_eq!(page.common_prefixes, vec!["docs/sub/"]);
        let keys: Vec<_> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["docs/", "docs/a.txt"]);
    }

    #[test]
    fn list_page_without_delimiter_descends() {
        let objects = make_objects(&["docs/", "docs/a.txt", "docs/sub/b.txt", "other"]);

        let page = list_page(&objects, "docs/", None, None, 1000);
        assert!(page.common_prefixes.is_empty());
        assert_eq!(page.entries.len(), 3);
    }

    #[test]
    fn list_page_paginates_with_token() {
        let objects = make_objects(&["k1", "k2", "k3"]);

        let first = list_page(&objects, "", None, None, 2);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.next_continuation_token.as_deref(), Some("k2"));

        let second = list_page(&objects, "", None, Some("k2"), 2);
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.entries[0].key, "k3");
        assert!(second.next_continuation_token.is_none());
    }

    #[test]
    fn list_page_counts_common_prefixes_towards_max_keys() {
        let objects = make_objects(&["a/1", "a/2", "b/1", "c.txt", "d/1", "e.txt"]);

        let first = list_page(&objects, "", Some("/"), None, 3);
        assert_eq!(first.common_prefixes, vec!["a/", "b/"]);
        let keys: Vec<_> = first.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["c.txt"]);
        assert_eq!(first.next_continuation_token.as_deref(), Some("c.txt"));

        let second = list_page(&objects, "", Some("/"), Some("c.txt"), 3);
        assert_eq!(second.common_prefixes, vec!["d/"]);
        assert_eq!(second.entries.len(), 1);
        assert!(second.next_continuation_token.is_none());
    }

    #[test]
    fn list_page_token_can_be_a_common_prefix() {
        let objects = make_objects(&["a/1", "a/2", "b/1", "b/2", "c/1"]);

        let first = list_page(&objects, "", Some("/"), None, 2);
        assert_eq!(first.common_prefixes, vec!["a/", "b/"]);
        assert_eq!(first.next_continuation_token.as_deref(), Some("b/"));

        let second = list_page(&objects, "", Some("/"), Some("b/"), 2);
        assert_eq!(second.common_prefixes, vec!["c/"]);
        assert!(second.next_continuation_token.is_none());
    }

    #[test]
    fn list_page_exact_fit_has_no_token() {
        let objects = make_objects(&["k1", "k2"]);
        let page = list_page(&objects, "", None, None, 2);
        assert!(page.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn in_memory_storage_records_calls_and_shares_state() {
        let storage = make_scenario_storage();
        let boxed = storage.boxed();

        boxed.delete_object("demo", "docs/a.txt").await.unwrap();
        boxed.delete_object("demo", "docs/a.txt").await.unwrap();

        assert_eq!(storage.keys("demo"), vec!["docs/", "docs/sub/b.txt"]);
        assert_eq!(storage.delete_call_count(), 2);
    }

    #[tokio::test]
    async fn in_memory_storage_refuses_non_empty_bucket() {
        let storage = make_scenario_storage();
        assert!(storage.boxed().delete_bucket("full").await.is_err());
        assert!(storage.has_bucket("full"));
    }
}
