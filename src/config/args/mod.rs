use crate::config::{
    CLITimeoutConfig, ClientConfig, Command, Config, DEFAULT_DELIMITER, DEFAULT_MAX_KEYS,
    RetryConfig, TracingConfig,
};
use crate::types::{AccessKeys, ClientConfigLocation, S3Credentials, StoragePath};
use aws_sdk_s3::types::RequestPayer;
use aws_smithy_types::checksum_config::RequestChecksumCalculation;
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::PathBuf;


// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_DISABLE_STALLED_STREAM_PROTECTION: bool = false;
const DEFAULT_ACCELERATE: bool = false;
const DEFAULT_REQUEST_PAYER: bool = false;
const DEFAULT_PRETTY: bool = false;
const MAX_KEYS_LIMIT: i32 = 1000;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_INVALID_TARGET: &str =
    "Target must be an S3 path starting with 's3://' (e.g., s3://bucket/prefix).";
const ERROR_MESSAGE_COMMAND_REQUIRED: &str =
    "A command is required (buckets, ls, du, region, rm, rmdir, rb).";
const ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE: &str = "Max keys must be between 1 and 1000.";
const ERROR_MESSAGE_OBJECT_KEY_REQUIRED: &str =
    "Target must include an object key (e.g., s3://bucket/path/to/file.txt).";
const ERROR_MESSAGE_FOLDER_PREFIX_REQUIRED: &str =
    "Target must include a folder prefix (e.g., s3://bucket/path/to/folder/).";
const ERROR_MESSAGE_BUCKET_ONLY: &str =
    "Target must be a bucket without a key (e.g., s3://bucket).";

// ---------------------------------------------------------------------------
// Value parser helpers
// ---------------------------------------------------------------------------

fn check_s3_target(s: &str) -> Result<String, String> {
    if s.starts_with("s3://") && s.len() > 5 {
        Ok(s.to_string())
    } else {
        Err(ERROR_MESSAGE_INVALID_TARGET.to_string())
    }
}

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// s3tree - Browse Amazon S3 buckets as folders and files.
///
/// Lists one level of a bucket with per-folder item counts and sizes, and
/// deletes objects, folders and buckets only when it is safe to do so.
///
/// Example:
///   s3tree buckets
///   s3tree ls s3://my-bucket/docs/
///   s3tree rmdir s3://my-bucket/docs/old/
#[derive(Parser, Clone, Debug)]
#[command(name = "s3tree", version, about, long_about = None)]
pub struct CLIArgs {
    #[command(subcommand)]
    pub command: Option<SubCommand>,

    // -----------------------------------------------------------------------
    // Output options
    // -----------------------------------------------------------------------
    /// Pretty-print JSON output.
    #[arg(long, env, global = true, default_value_t = DEFAULT_PRETTY, help_heading = "Output")]
    pub pretty: bool,

    // -----------------------------------------------------------------------
    // Listing options
    // -----------------------------------------------------------------------
    /// Path delimiter used to derive folders from keys. Default: "/".
    #[arg(long, env, global = true, default_value = DEFAULT_DELIMITER,
        value_parser = NonEmptyStringValueParser::new(), help_heading = "Listing")]
    pub delimiter: String,

    /// Max keys per listing request (1-1000). Default: 1000.
    #[arg(long, env, global = true, default_value_t = DEFAULT_MAX_KEYS, help_heading = "Listing")]
    pub max_keys: i32,

    // -----------------------------------------------------------------------
    // Logging options
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (normal), -v, -vv, -vvv.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, global = true, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, global = true, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, global = true, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // Retry options
    // -----------------------------------------------------------------------
    /// Maximum retry attempts for AWS SDK operations. Default: 10.
    #[arg(long, env, global = true, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, help_heading = "Retry")]
    pub aws_max_attempts: u32,

    /// Initial backoff in milliseconds for retries. Default: 100.
    #[arg(long, env, global = true, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, help_heading = "Retry")]
    pub initial_backoff_milliseconds: u64,

    // -----------------------------------------------------------------------
    // Timeout options
    // -----------------------------------------------------------------------
    /// Overall operation timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub operation_timeout_milliseconds: Option<u64>,

    /// Per-attempt operation timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub operation_attempt_timeout_milliseconds: Option<u64>,

    /// Connection timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub connect_timeout_milliseconds: Option<u64>,

    /// Read timeout in milliseconds.
    #[arg(long, env, global = true, help_heading = "Timeout")]
    pub read_timeout_milliseconds: Option<u64>,

    // -----------------------------------------------------------------------
    // AWS configuration
    // -----------------------------------------------------------------------
    /// AWS config file path.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_config_file: Option<PathBuf>,

    /// AWS shared credentials file path.
    #[arg(long, env, global = true, help_heading = "AWS")]
    pub aws_shared_credentials_file: Option<PathBuf>,

    /// AWS profile. If not set, uses the default credential chain.
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_profile: Option<String>,

    /// AWS access key ID.
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_access_key: Option<String>,

    /// AWS secret access key.
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_secret_key: Option<String>,

    /// AWS session token.
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_session_token: Option<String>,

    /// AWS region.
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_region: Option<String>,

    /// Custom S3-compatible endpoint URL (e.g. MinIO, Wasabi).
    #[arg(long, env, global = true, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub target_endpoint_url: Option<String>,

    /// Force path-style access (required for some S3-compatible services).
    #[arg(long, env, global = true, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "AWS")]
    pub target_force_path_style: bool,

    /// Enable S3 Transfer Acceleration.
    #[arg(long, env, global = true, default_value_t = DEFAULT_ACCELERATE, help_heading = "AWS")]
    pub target_accelerate: bool,

    /// Enable requester-pays for the target bucket.
    #[arg(long, env, global = true, default_value_t = DEFAULT_REQUEST_PAYER, help_heading = "AWS")]
    pub target_request_payer: bool,

    /// Disable stalled stream protection.
    #[arg(long, env, global = true, default_value_t = DEFAULT_DISABLE_STALLED_STREAM_PROTECTION, help_heading = "AWS")]
    pub disable_stalled_stream_protection: bool,

    // -----------------------------------------------------------------------
    // Advanced options
    // -----------------------------------------------------------------------
    /// Generate shell completions.
    #[arg(long, env, help_heading = "Advanced")]
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

/// Commands understood by `s3tree`.
#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum SubCommand {
    /// List all buckets with region, object count and total size.
    Buckets,

    /// List folders and files one level under s3://<BUCKET_NAME>[/prefix].
    Ls {
        #[arg(help = "s3://<BUCKET_NAME>[/prefix]", value_parser = check_s3_target)]
        target: String,
    },

    /// Show the recursive item count and size of s3://<BUCKET_NAME>[/prefix].
    Du {
        #[arg(help = "s3://<BUCKET_NAME>[/prefix]", value_parser = check_s3_target)]
        target: String,
    },

    /// Show the region of a bucket.
    Region {
        #[arg(help = "s3://<BUCKET_NAME>", value_parser = check_s3_target)]
        target: String,
    },

    /// Delete one object. Succeeds even if the object does not exist.
    Rm {
        #[arg(help = "s3://<BUCKET_NAME>/<KEY>", value_parser = check_s3_target)]
        target: String,
    },

    /// Delete a folder, only if it is empty or holds nothing but its marker object.
    Rmdir {
        #[arg(help = "s3://<BUCKET_NAME>/<PREFIX>", value_parser = check_s3_target)]
        target: String,
    },

    /// Delete a bucket, only if it holds no objects.
    Rb {
        #[arg(help = "s3://<BUCKET_NAME>", value_parser = check_s3_target)]
        target: String,
    },
}

// ---------------------------------------------------------------------------
// parse_from_args (public API)
// ---------------------------------------------------------------------------

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use s3tree_rs::config::args::parse_from_args;
///
/// let args = vec!["s3tree", "ls", "s3://my-bucket/docs/"];
/// let cli_args = parse_from_args(args).unwrap();
/// assert!(cli_args.command.is_some());
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

// ---------------------------------------------------------------------------
// Validation and Config conversion
// ---------------------------------------------------------------------------

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_KEYS_LIMIT).contains(&self.max_keys) {
            return Err(ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE.to_string());
        }
        if self.command.is_none() && self.auto_complete_shell.is_none() {
            return Err(ERROR_MESSAGE_COMMAND_REQUIRED.to_string());
        }
        Ok(())
    }

    fn build_command(&self) -> Result<Command, String> {
        let Some(ref command) = self.command else {
            // Only reachable with --auto-complete-shell.
            return Ok(Command::ListBuckets);
        };

        let command = match command {
            SubCommand::Buckets => Command::ListBuckets,
            SubCommand::Ls { target } => {
                let (bucket, prefix) = parse_target(target)?;
                Command::List { bucket, prefix }
            }
            SubCommand::Du { target } => {
                let (bucket, prefix) = parse_target(target)?;
                Command::Stats { bucket, prefix }
            }
            SubCommand::Region { target } => Command::Region {
                bucket: parse_bucket_only(target)?,
            },
            SubCommand::Rm { target } => {
                let (bucket, key) = parse_target(target)?;
                if key.is_empty() {
                    return Err(ERROR_MESSAGE_OBJECT_KEY_REQUIRED.to_string());
                }
                Command::DeleteObject { bucket, key }
            }
            SubCommand::Rmdir { target } => {
                let (bucket, prefix) = parse_target(target)?;
                if prefix.is_empty() {
                    return Err(ERROR_MESSAGE_FOLDER_PREFIX_REQUIRED.to_string());
                }
                Command::DeleteFolder { bucket, prefix }
            }
            SubCommand::Rb { target } => Command::DeleteBucket {
                bucket: parse_bucket_only(target)?,
            },
        };

        Ok(command)
    }

    fn build_client_config(&self) -> Option<ClientConfig> {
        let credential = if let Some(ref profile) = self.target_profile {
            S3Credentials::Profile(profile.clone())
        } else if let Some(ref access_key) = self.target_access_key {
            let secret_key = self.target_secret_key.clone().unwrap_or_default();
            S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key: access_key.clone(),
                    secret_access_key: secret_key,
                    session_token: self.target_session_token.clone(),
                },
            }
        } else {
            S3Credentials::FromEnvironment
        };

        let request_payer = if self.target_request_payer {
            Some(RequestPayer::Requester)
        } else {
            None
        };

        Some(ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region: self.target_region.clone(),
            endpoint_url: self.target_endpoint_url.clone(),
            force_path_style: self.target_force_path_style,
            accelerate: self.target_accelerate,
            request_payer,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
            disable_stalled_stream_protection: self.disable_stalled_stream_protection,
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
        })
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

/// Split `s3://bucket[/prefix]` into its bucket and prefix.
pub fn parse_s3_uri(uri: &str) -> Result<StoragePath, String> {
    let (bucket, prefix) = parse_target(uri)?;
    Ok(StoragePath::S3 { bucket, prefix })
}

fn parse_target(uri: &str) -> Result<(String, String), String> {
    let Some(without_scheme) = uri.strip_prefix("s3://") else {
        return Err(ERROR_MESSAGE_INVALID_TARGET.to_string());
    };

    let (bucket, prefix) = match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx + 1..]),
        None => (without_scheme, ""),
    };

    if bucket.is_empty() {
        return Err(ERROR_MESSAGE_INVALID_TARGET.to_string());
    }

    Ok((bucket.to_string(), prefix.to_string()))
}

fn parse_bucket_only(uri: &str) -> Result<String, String> {
    let (bucket, prefix) = parse_target(uri)?;
    if !prefix.is_empty() {
        return Err(ERROR_MESSAGE_BUCKET_ONLY.to_string());
    }
    Ok(bucket)
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        Ok(Config {
            command: args.build_command()?,
            target_client_config: args.build_client_config(),
            tracing_config: args.build_tracing_config(),
            delimiter: args.delimiter.clone(),
            max_keys: args.max_keys,
            pretty_json: args.pretty,
            auto_complete_shell: args.auto_complete_shell,
        })
    }
}
