//! JSON output shapes.
//!
//! Field names follow the browser API consumed by existing front ends, so most
//! structs serialize in `PascalCase`.

use aws_sdk_s3::primitives::DateTime;
use aws_smithy_types_convert::date_time::DateTimeExt;
use chrono::Utc;
use serde::{Serialize, Serializer};

use crate::size_format::{SizeContext, format_bytes, format_total};
use crate::types::error::S3treeError;
use crate::types::{
    AggregateStats, BucketSummary, DeleteOutcome, FileEntry, Folder, ItemCount, OneLevelListing,
};

pub const NOT_ACCESSIBLE_COUNT: &str = "N/A";
pub const EXIT_CODE_NOT_EMPTY: i32 = 3;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";
const FOLDER_TYPE: &str = "folder";
const FILE_TYPE: &str = "file";

impl Serialize for ItemCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemCount::Known(count) => serializer.serialize_u64(*count),
            ItemCount::NotAccessible => serializer.serialize_str(NOT_ACCESSIBLE_COUNT),
        }
    }
}

/// RFC 3339 with a `+00:00` offset, or `None` if the value is out of range.
pub fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    let utc: chrono::DateTime<Utc> = timestamp.to_chrono_utc().ok()?;
    Some(utc.to_rfc3339())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderResponse {
    pub name: String,
    pub full_path: String,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    pub file_count: ItemCount,
    pub size: String,
}

impl From<&Folder> for FolderResponse {
    fn from(folder: &Folder) -> Self {
        Self {
            name: folder.name.clone(),
            full_path: folder.prefix.clone(),
            kind: FOLDER_TYPE,
            file_count: folder.stats.item_count,
            size: format_total(&folder.stats, SizeContext::Folder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileResponse {
    pub name: String,
    pub full_path: String,
    pub size: String,
    pub last_modified: Option<String>,
    #[serde(rename = "Type")]
    pub kind: &'static str,
}

impl From<&FileEntry> for FileResponse {
    fn from(file: &FileEntry) -> Self {
        Self {
            name: file.name.clone(),
            full_path: file.key.clone(),
            size: format_bytes(file.size),
            last_modified: file.last_modified.as_ref().and_then(format_timestamp),
            kind: FILE_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingResponse {
    pub folders: Vec<FolderResponse>,
    pub files: Vec<FileResponse>,
    #[serde(rename = "currentPrefix")]
    pub current_prefix: String,
}

impl From<&OneLevelListing> for ListingResponse {
    fn from(listing: &OneLevelListing) -> Self {
        Self {
            folders: listing.folders.iter().map(FolderResponse::from).collect(),
            files: listing.files.iter().map(FileResponse::from).collect(),
            current_prefix: listing.prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketResponse {
    pub name: String,
    pub creation_date: Option<String>,
    pub region: String,
    pub size: String,
    pub object_count: ItemCount,
}

impl From<&BucketSummary> for BucketResponse {
    fn from(summary: &BucketSummary) -> Self {
        Self {
            name: summary.name.clone(),
            creation_date: summary.creation_date.as_ref().and_then(format_timestamp),
            region: summary.region.clone(),
            size: format_total(&summary.stats, SizeContext::Bucket),
            object_count: summary.stats.item_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsResponse {
    pub bucket: String,
    pub prefix: String,
    pub file_count: ItemCount,
    pub total_bytes: u64,
    pub size: String,
}

impl StatsResponse {
    pub fn new(bucket: &str, prefix: &str, stats: &AggregateStats) -> Self {
        let context = if prefix.is_empty() {
            SizeContext::Bucket
        } else {
            SizeContext::Folder
        };
        Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            file_count: stats.item_count,
            total_bytes: stats.total_bytes,
            size: format_total(stats, context),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionResponse {
    pub bucket: String,
    pub region: String,
}

/// Outcome of a delete, shaped as `{message, status}` or `{error, status}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MutationResponse {
    Success {
        message: String,
        status: &'static str,
    },
    Error {
        error: String,
        status: &'static str,
    },
}

impl MutationResponse {
    pub fn success(message: String) -> Self {
        MutationResponse::Success {
            message,
            status: STATUS_SUCCESS,
        }
    }

    pub fn error(error: String) -> Self {
        MutationResponse::Error {
            error,
            status: STATUS_ERROR,
        }
    }

    pub fn object_deleted(key: &str) -> Self {
        Self::success(format!("Object {key} deleted successfully"))
    }

    /// `AlreadyAbsent` reports success, like a real delete.
    pub fn for_folder(prefix: &str, outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent => {
                Self::success(format!("Folder {prefix} deleted successfully"))
            }
            DeleteOutcome::NotEmpty => {
                Self::error("Cannot delete folder: Folder is not empty".to_string())
            }
        }
    }

    pub fn for_bucket(bucket: &str, outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent => {
                Self::success(format!("Bucket {bucket} deleted successfully"))
            }
            DeleteOutcome::NotEmpty => {
                Self::error("Cannot delete bucket: Bucket is not empty".to_string())
            }
        }
    }

    /// Error body for a failed request.
    pub fn from_error(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<S3treeError>() {
            Some(S3treeError::Unavailable) => Self::error(S3treeError::Unavailable.to_string()),
            _ => Self::error(format!("AWS Error: {e:#}")),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationResponse::Success { .. })
    }
}

/// Anything a command can print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Buckets(Vec<BucketResponse>),
    Listing(ListingResponse),
    Stats(StatsResponse),
    Region(RegionResponse),
    Mutation(MutationResponse),
}

impl CommandResponse {
    /// 0, or 3 for a refused (not-empty) deletion.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandResponse::Mutation(mutation) if !mutation.is_success() => EXIT_CODE_NOT_EMPTY,
            _ => 0,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
