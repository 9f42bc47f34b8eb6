use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use aws_sdk_s3::primitives::DateTime;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

pub mod error;

/// One stored object as reported by a listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime>,
}

impl ObjectEntry {
    pub fn new(key: &str, size: u64, last_modified: Option<DateTime>) -> Self {
        Self {
            key: key.to_string(),
            size,
            last_modified,
        }
    }
}

/// Raw result of one paginated listing request against the backing store.
///
/// `next_continuation_token` is `None` when the store reported no further pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub common_prefixes: Vec<String>,
    pub entries: Vec<ObjectEntry>,
    pub next_continuation_token: Option<String>,
}

/// A bucket as reported by the store's bucket listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketEntry {
    pub name: String,
    pub creation_date: Option<DateTime>,
}

/// Number of items under a prefix.
///
/// `NotAccessible` means the walk was aborted by a permission failure and the
/// real count is unknown. It must never be read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCount {
    Known(u64),
    NotAccessible,
}

impl ItemCount {
    pub fn is_accessible(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for ItemCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(count) => write!(f, "{count}"),
            Self::NotAccessible => write!(f, "N/A"),
        }
    }
}

/// Recursive totals for a prefix, excluding the prefix's own marker object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub item_count: ItemCount,
    pub total_bytes: u64,
}

impl AggregateStats {
    pub fn not_accessible() -> Self {
        Self {
            item_count: ItemCount::NotAccessible,
            total_bytes: 0,
        }
    }
}

/// Virtual folder derived from a common prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub prefix: String,
    pub stats: AggregateStats,
}

/// Object that sits directly under the listed prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime>,
}

/// One level of the virtual hierarchy under `prefix`.
#[derive(Debug, Clone, PartialEq)]
pub struct OneLevelListing {
    pub prefix: String,
    pub folders: Vec<Folder>,
    pub files: Vec<FileEntry>,
}

/// Per-bucket summary used by the bucket catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub name: String,
    pub creation_date: Option<DateTime>,
    pub region: String,
    pub stats: AggregateStats,
}

/// Result of a guarded deletion.
///
/// `NotEmpty` is an expected outcome, not a failure: nothing was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    NotEmpty,
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::NotEmpty)
    }
}

/// S3 storage path specification.
#[derive(Debug, Clone, PartialEq)]
pub enum StoragePath {
    S3 { bucket: String, prefix: String },
}

/// AWS configuration file locations.
#[derive(Debug, Clone)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

/// AWS credential sources.
#[derive(Debug, Clone)]
pub enum S3Credentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

/// AWS access key pair with secure zeroization.
///
/// The secret_access_key and session_token are cleared from memory
/// when this struct is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = f.debug_struct("AccessKeys");
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        keys.field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token);
        keys.finish()
    }
}
