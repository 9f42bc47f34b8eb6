use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::{debug, error, trace};

use s3tree_rs::ObjectBrowser;
use s3tree_rs::config::Config;
use s3tree_rs::config::args::CLIArgs;
use s3tree_rs::response::{CommandResponse, MutationResponse};
use s3tree_rs::types::error::exit_code_from_error;

mod tracing_init;

/// s3tree - Browse an Amazon S3 bucket as folders and files.
///
/// This binary is a thin wrapper over the s3tree-rs library.
/// Results are printed to stdout as JSON; logs go to stderr.
#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_exit_if_err();

    if let Some(shell) = config.auto_complete_shell {
        generate(
            shell,
            &mut CLIArgs::command(),
            "s3tree",
            &mut std::io::stdout(),
        );

        return Ok(());
    }

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    let exit_code = run(&config).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

/// Execute the configured command, print its JSON and return the exit code.
async fn run(config: &Config) -> Result<i32> {
    let start_time = tokio::time::Instant::now();
    debug!(command = ?config.command, "s3tree start.");

    let browser = ObjectBrowser::create(config).await;
    let result = browser.execute(&config.command).await;
    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    let (response, exit_code) = match result {
        Ok(response) => {
            let exit_code = response.exit_code();
            (response, exit_code)
        }
        Err(e) => {
            error!(duration_sec = duration_sec, "{:#}", e);
            let exit_code = exit_code_from_error(&e);
            (
                CommandResponse::Mutation(MutationResponse::from_error(&e)),
                exit_code,
            )
        }
    };

    println!("{}", response.to_json(config.pretty_json)?);

    debug!(
        duration_sec = duration_sec,
        exit_code = exit_code,
        "s3tree has been completed."
    );
    Ok(exit_code)
}
