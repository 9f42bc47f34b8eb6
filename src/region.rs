use tracing::warn;

use crate::storage::Storage;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const UNKNOWN_REGION: &str = "Unknown";

/// Best-effort bucket region lookup for display.
#[derive(Clone)]
pub struct BucketRegionResolver {
    storage: Storage,
}

impl BucketRegionResolver {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Region of `bucket`. An absent or empty location constraint is
    /// `us-east-1`; any lookup failure is `"Unknown"`.
    pub async fn resolve_region(&self, bucket: &str) -> String {
        match self.storage.get_bucket_location(bucket).await {
            Ok(location) => normalize_location(location.as_deref()),
            Err(e) => {
                warn!(bucket = bucket, "failed to resolve bucket region: {:#}", e);
                UNKNOWN_REGION.to_string()
            }
        }
    }
}

fn normalize_location(location: Option<&str>) -> String {
    match location {
        Some(region) if !region.is_empty() => region.to_string(),
        _ => DEFAULT_REGION.to_string(),
    }
}
