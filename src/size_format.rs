//! Human-readable byte totals.

use crate::types::AggregateStats;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

pub const BUCKET_EMPTY_SENTINEL: &str = "Empty";
pub const FOLDER_EMPTY_SENTINEL: &str = "—";

/// Where a total is displayed. Each context has its own empty sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeContext {
    Bucket,
    Folder,
}

impl SizeContext {
    pub fn empty_sentinel(&self) -> &'static str {
        match self {
            SizeContext::Bucket => BUCKET_EMPTY_SENTINEL,
            SizeContext::Folder => FOLDER_EMPTY_SENTINEL,
        }
    }
}

/// Format a byte count with one decimal place above 1 KB.
///
/// ```
/// use s3tree_rs::size_format::format_bytes;
///
/// assert_eq!(format_bytes(300), "300 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

/// Format an aggregate total, falling back to the context's sentinel when the
/// total is zero or unknown.
pub fn format_total(stats: &AggregateStats, context: SizeContext) -> String {
    if !stats.item_count.is_accessible() || stats.total_bytes == 0 {
        return context.empty_sentinel().to_string();
    }
    format_bytes(stats.total_bytes)
}
