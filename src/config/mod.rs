pub mod args;

use crate::types::{ClientConfigLocation, S3Credentials};
use aws_sdk_s3::types::RequestPayer;
use aws_smithy_types::checksum_config::RequestChecksumCalculation;

pub const DEFAULT_DELIMITER: &str = "/";
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// Main configuration for s3tree-rs.
///
/// Holds the command to run, the S3 client settings and the listing
/// parameters shared by every component.
///
/// # Quick Start
///
/// ```
/// use s3tree_rs::Config;
///
/// let config = Config::from_environment();
/// assert_eq!(config.delimiter, "/");
/// assert_eq!(config.max_keys, 1000);
/// assert!(config.target_client_config.is_some());
/// ```
///
/// [`Config::default()`] has no client configuration; every store call made
/// through it fails with [`S3treeError::Unavailable`](crate::S3treeError::Unavailable).
#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub delimiter: String,
    pub max_keys: i32,
    pub pretty_json: bool,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

/// Operation selected on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ListBuckets,
    List { bucket: String, prefix: String },
    Stats { bucket: String, prefix: String },
    Region { bucket: String },
    DeleteObject { bucket: String, key: String },
    DeleteFolder { bucket: String, prefix: String },
    DeleteBucket { bucket: String },
}

impl Config {
    /// Create a `Config` whose client takes credentials and region from the
    /// standard AWS environment chain.
    pub fn from_environment() -> Self {
        Config {
            target_client_config: Some(ClientConfig::default()),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            command: Command::ListBuckets,
            target_client_config: None,
            tracing_config: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_keys: DEFAULT_MAX_KEYS,
            pretty_json: false,
            auto_complete_shell: None,
        }
    }
}

/// AWS S3 client configuration.
///
/// Credential loading, region, endpoint, retry and timeout settings used by
/// [`ClientConfig::create_client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub accelerate: bool,
    pub request_payer: Option<RequestPayer>,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
    pub request_checksum_calculation: RequestChecksumCalculation,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: None,
                aws_shared_credentials_file: None,
            },
            credential: S3Credentials::FromEnvironment,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            accelerate: false,
            request_payer: None,
            retry_config: RetryConfig::default(),
            cli_timeout_config: CLITimeoutConfig::default(),
            disable_stalled_stream_protection: false,
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
        }
    }
}

/// Retry configuration for AWS SDK operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            aws_max_attempts: 10,
            initial_backoff_milliseconds: 100,
        }
    }
}

/// Timeout configuration for AWS SDK operations.
#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
