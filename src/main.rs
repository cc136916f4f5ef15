//! crewline - runs the scripted crew once and prints its result.

use std::process::ExitCode;

use clap::Parser;
use crewline::{
    cli::Cli,
    config::Config,
    runner::{self, render_result},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the result.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // The environment is written here, before any runtime worker threads exist.
    let options = cli.run_options();
    let config = if cli.guarded {
        match runner::prepare_guarded(&options) {
            Some(config) => config,
            None => return Ok(ExitCode::FAILURE),
        }
    } else {
        runner::prepare(&options)?
    };
    info!(
        "Loaded configuration: model={}, search={}",
        config.model, config.with_search
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main(cli.guarded, config))
}

async fn async_main(guarded: bool, config: Config) -> anyhow::Result<ExitCode> {
    let output = if guarded {
        match runner::run_guarded(&config).await {
            Some(output) => output,
            None => return Ok(ExitCode::FAILURE),
        }
    } else {
        runner::run(&config).await?
    };

    println!("{}", render_result(&output));
    Ok(ExitCode::SUCCESS)
}
