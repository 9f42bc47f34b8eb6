use anyhow::Error;
use thiserror::Error;

/// Application-level error types for s3tree-rs.
///
/// Library functions return `anyhow::Result`; these variants are attached as
/// the root cause so callers can branch on them via downcast.
///
/// ## Exit Codes
///
/// - 1: Store or generic failure (AwsSdk, AccessDenied)
/// - 2: No client configured (Unavailable). Argument errors also exit with 2,
///   through clap.
///
/// A not-empty conflict is not an error; see
/// [`DeleteOutcome::NotEmpty`](crate::types::DeleteOutcome::NotEmpty).
#[derive(Error, Debug, PartialEq)]
pub enum S3treeError {
    /// No S3 client is configured. Raised before any store call.
    #[error("AWS credentials not configured")]
    Unavailable,

    /// Permission failure reported by the store.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Any other AWS SDK failure (service, network, timeout).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

impl S3treeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            S3treeError::Unavailable => 2,
            S3treeError::AccessDenied(_) | S3treeError::AwsSdk(_) => 1,
        }
    }
}

/// Check if an anyhow::Error wraps an access-denied failure.
pub fn is_access_denied_error(e: &Error) -> bool {
    matches!(
        e.downcast_ref::<S3treeError>(),
        Some(S3treeError::AccessDenied(_))
    )
}

/// Check if an anyhow::Error wraps a missing-client failure.
pub fn is_unavailable_error(e: &Error) -> bool {
    matches!(e.downcast_ref::<S3treeError>(), Some(S3treeError::Unavailable))
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<S3treeError>() {
        return err.exit_code();
    }
    1
}
