use aws_config::BehaviorVersion;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region, StalledStreamProtectionConfig};
use std::time::Duration;

use crate::config::{CLITimeoutConfig, ClientConfig};
use crate::types::S3Credentials;

const CREDENTIALS_PROVIDER_NAME: &str = "s3tree-rs";

impl ClientConfig {
    /// Build an `aws_sdk_s3::Client` from this configuration.
    ///
    /// Loading the configuration does not contact S3; credential and region
    /// resolution failures surface on the first API call.
    pub async fn create_client(&self) -> Client {
        let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(self.build_retry_config())
            .timeout_config(build_timeout_config(&self.cli_timeout_config));

        if let Some(profile_files) = self.build_profile_files() {
            config_loader = config_loader.profile_files(profile_files);
        }

        config_loader = match &self.credential {
            S3Credentials::Profile(profile_name) => config_loader.profile_name(profile_name),
            S3Credentials::Credentials { access_keys } => {
                config_loader.credentials_provider(Credentials::new(
                    access_keys.access_key.clone(),
                    access_keys.secret_access_key.clone(),
                    access_keys.session_token.clone(),
                    None,
                    CREDENTIALS_PROVIDER_NAME,
                ))
            }
            S3Credentials::FromEnvironment => config_loader,
        };

        if let Some(region) = &self.region {
            config_loader = config_loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint_url);
        }

        let sdk_config = config_loader.load().await;

        let stalled_stream_protection = if self.disable_stalled_stream_protection {
            StalledStreamProtectionConfig::disabled()
        } else {
            StalledStreamProtectionConfig::enabled().build()
        };

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .accelerate(self.accelerate)
            .request_checksum_calculation(self.request_checksum_calculation.clone())
            .stalled_stream_protection(stalled_stream_protection)
            .build();

        Client::from_conf(s3_config)
    }

    fn build_retry_config(&self) -> RetryConfig {
        RetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    fn build_profile_files(&self) -> Option<ProfileFiles> {
        let location = &self.client_config_location;
        if location.aws_config_file.is_none() && location.aws_shared_credentials_file.is_none() {
            return None;
        }

        let mut builder = ProfileFiles::builder();
        builder = match &location.aws_config_file {
            Some(path) => builder.with_file(ProfileFileKind::Config, path),
            None => builder.include_default_config_file(true),
        };
        builder = match &location.aws_shared_credentials_file {
            Some(path) => builder.with_file(ProfileFileKind::Credentials, path),
            None => builder.include_default_credentials_file(true),
        };

        Some(builder.build())
    }
}

fn build_timeout_config(cli_timeout_config: &CLITimeoutConfig) -> TimeoutConfig {
    let mut builder = TimeoutConfig::builder();
    builder
        .set_operation_timeout(
            cli_timeout_config
                .operation_timeout_milliseconds
                .map(Duration::from_millis),
        )
        .set_operation_attempt_timeout(
            cli_timeout_config
                .operation_attempt_timeout_milliseconds
                .map(Duration::from_millis),
        )
        .set_connect_timeout(
            cli_timeout_config
                .connect_timeout_milliseconds
                .map(Duration::from_millis),
        )
        .set_read_timeout(
            cli_timeout_config
                .read_timeout_milliseconds
                .map(Duration::from_millis),
        );
    builder.build()
}
