//! Arclink: tags archive server entries from an online catalog, falling back
//! to its mirror.
mod cli;
mod logging;

use std::process::ExitCode;

use anyhow::{Context, Result};
use arclink_engine::{ArchiveServerClient, Cascade, ConsoleOperator, LoggingSink, SetupError};
use arclink_logging::{arclink_error, arclink_info, arclink_warn};
use clap::Parser;

use crate::cli::{Args, RunConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return err.exit_code();
        }
    };
    logging::initialize(config.debug, config.log_file.as_deref());
    for word in &config.ignored {
        arclink_warn!("Ignoring unknown argument '{}'", word);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            arclink_error!("{:#}", err);
            exit_code(&err)
        }
    }
}

async fn run(config: RunConfig) -> Result<()> {
    arclink_info!("Running in {} mode", config.cascade.mode);
    let server = ArchiveServerClient::new(config.server)?;
    let mut cascade = Cascade::connect(
        server,
        config.sources,
        config.cascade,
        Box::new(ConsoleOperator::new()),
    )
    .await
    .context("setting up the run")?;

    let archives = cascade
        .server()
        .load_archives(&config.selection)
        .await
        .context("listing archives")?;
    arclink_info!("Selected {} archives", archives.len());

    cascade
        .verify_login()
        .await
        .context("checking the catalog login")?;

    let reports = cascade
        .run(&archives, &config.selection, &LoggingSink)
        .await
        .context("processing archives")?;
    arclink_info!("Done, processed {} archives", reports.len());
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<SetupError>() {
        Some(SetupError::LoginRejected) => ExitCode::from(205),
        Some(SetupError::MissingPlugin(_)) => ExitCode::from(206),
        Some(SetupError::Transport(_)) | None => ExitCode::FAILURE,
    }
}
