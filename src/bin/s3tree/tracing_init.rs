// Initializes the tracing subscriber for the CLI binary.
// Logs go to stderr so that stdout carries only the JSON result.

use std::env;
use std::io::IsTerminal;

use tracing_subscriber::fmt::format::FmtSpan;

use s3tree_rs::config::TracingConfig;

const EVENT_FILTER_ENV_VAR: &str = "RUST_LOG";

fn default_event_filter(tracing_level: log::Level) -> String {
    format!("s3tree_rs={tracing_level},s3tree={tracing_level}")
}

fn aws_sdk_event_filter(tracing_level: log::Level) -> String {
    format!(
        "{},aws_smithy_runtime={tracing_level},aws_config={tracing_level},aws_sigv4={tracing_level}",
        default_event_filter(tracing_level)
    )
}

pub fn init_tracing(config: &TracingConfig) {
    let fmt_span = if config.span_events_tracing {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(!config.disable_color_tracing && std::io::stderr().is_terminal())
        .with_span_events(fmt_span);

    let mut show_target = true;
    let event_filter = if config.aws_sdk_tracing {
        aws_sdk_event_filter(config.tracing_level)
    } else if let Ok(env_filter) = env::var(EVENT_FILTER_ENV_VAR) {
        env_filter
    } else {
        show_target = false;
        default_event_filter(config.tracing_level)
    };

    let subscriber_builder = subscriber_builder
        .with_env_filter(event_filter)
        .with_target(show_target);
    if config.json_tracing {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }
}
