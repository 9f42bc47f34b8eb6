pub mod client_builder;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::types::{Object, RequestPayer};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::storage::{Storage, StorageTrait};
use crate::types::error::S3treeError;
use crate::types::{BucketEntry, ListPage, ObjectEntry};

const ACCESS_DENIED_ERROR_CODES: &[&str] = &["AccessDenied", "AllAccessDisabled"];
const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// Extracts the S3 error code and message from an AWS SDK error.
///
/// For service errors, returns the S3 error code (e.g. "AccessDenied") and the
/// message from the response. For other error types (network, timeout,
/// construction failure), returns "N/A" as the code and the full error
/// description as the message.
fn extract_sdk_error_details<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> (String, String) {
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        ("N/A".to_string(), e.to_string())
    }
}

/// Map an SDK error onto the crate's error taxonomy.
///
/// Permission failures (by error code or HTTP 403) become `AccessDenied`;
/// everything else is `AwsSdk`.
fn classify_sdk_error<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> S3treeError {
    let (s3_error_code, s3_error_message) = extract_sdk_error_details(e);
    let status = e.raw_response().map(|response| response.status().as_u16());
    let detail = format!("{s3_error_code} ({s3_error_message})");

    if ACCESS_DENIED_ERROR_CODES.contains(&s3_error_code.as_str())
        || status == Some(HTTP_STATUS_FORBIDDEN)
    {
        S3treeError::AccessDenied(detail)
    } else {
        S3treeError::AwsSdk(detail)
    }
}

fn to_object_entry(object: &Object) -> Option<ObjectEntry> {
    let key = object.key()?;
    let size = u64::try_from(object.size().unwrap_or_default()).unwrap_or_default();
    Some(ObjectEntry::new(key, size, object.last_modified().cloned()))
}

/// Storage backed by the AWS S3 API.
#[derive(Clone)]
pub struct S3Storage {
    client: Option<Arc<Client>>,
    request_payer: Option<RequestPayer>,
}

impl S3Storage {
    /// Build the storage. With no client configuration, every call fails with
    /// `S3treeError::Unavailable`.
    pub async fn create(client_config: Option<&ClientConfig>) -> Storage {
        let client = match client_config {
            Some(client_config) => Some(Arc::new(client_config.create_client().await)),
            None => None,
        };
        let request_payer = client_config.and_then(|c| c.request_payer.clone());

        Box::new(S3Storage {
            client,
            request_payer,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_deref()
            .ok_or_else(|| anyhow!(S3treeError::Unavailable))
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> Result<ListPage> {
        let output = self
            .client()?
            .list_objects_v2()
            .set_request_payer(self.request_payer.clone())
            .bucket(bucket)
            .prefix(prefix)
            .set_delimiter(delimiter.map(String::from))
            .set_continuation_token(continuation_token)
            .set_max_keys(max_keys)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    prefix = prefix,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectsV2 API call failed for s3://{}/{}: {} ({}).",
                    bucket,
                    prefix,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(classify_sdk_error(&e))
                    .context("aws_sdk_s3::client::list_objects_v2() failed.")
            })?;

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|common_prefix| common_prefix.prefix())
            .map(String::from)
            .collect();
        let entries = output.contents().iter().filter_map(to_object_entry).collect();
        let next_continuation_token = if output.is_truncated() == Some(true) {
            output.next_continuation_token().map(String::from)
        } else {
            None
        };

        Ok(ListPage {
            common_prefixes,
            entries,
            next_continuation_token,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client()?
            .delete_object()
            .set_request_payer(self.request_payer.clone())
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::warn!(
                    bucket = bucket,
                    key = key,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteObject API call failed for s3://{}/{}: {} ({}).",
                    bucket,
                    key,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(classify_sdk_error(&e))
                    .context("aws_sdk_s3::client::delete_object() failed.")
            })?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client()?
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteBucket API call failed for bucket '{}': {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(classify_sdk_error(&e))
                    .context("aws_sdk_s3::client::delete_bucket() failed.")
            })?;

        Ok(())
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>> {
        let output = self
            .client()?
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::debug!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 GetBucketLocation API call failed for bucket '{}'.",
                    bucket,
                );
                anyhow!(classify_sdk_error(&e))
                    .context("aws_sdk_s3::client::get_bucket_location() failed.")
            })?;

        Ok(output
            .location_constraint()
            .map(|constraint| constraint.as_str().to_string()))
    }

    async fn list_buckets(&self) -> Result<Vec<BucketEntry>> {
        let client = self.client()?;
        let mut buckets = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = client
                .list_buckets()
                .set_continuation_token(continuation_token.clone())
                .send()
                .await
                .map_err(|e| {
                    let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                    tracing::error!(
                        s3_error_code = s3_error_code,
                        s3_error_message = s3_error_message,
                        "S3 ListBuckets API call failed: {} ({}).",
                        s3_error_code,
                        s3_error_message,
                    );
                    anyhow!(classify_sdk_error(&e))
                        .context("aws_sdk_s3::client::list_buckets() failed.")
                })?;

            buckets.extend(output.buckets().iter().filter_map(|bucket| {
                Some(BucketEntry {
                    name: bucket.name()?.to_string(),
                    creation_date: bucket.creation_date().cloned(),
                })
            }));

            match output.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(buckets)
    }
}
