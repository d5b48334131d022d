//! Front-desk records console.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod console_config;
mod record_file;

use clap::Parser;
use frontdesk_core::AppError;
use tracing::debug;

use crate::cli::Cli;
use crate::commands::Console;
use crate::console_config::{ConsoleConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ConsoleConfig::load()?;
    debug!(
        api_url = %config.api_url,
        gateway = ?config.gateway,
        timeout_secs = config.api_timeout.as_secs(),
        "frontdesk console configured"
    );

    Console::new(config)?.run(cli.command).await
}
