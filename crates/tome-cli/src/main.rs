//! tome - CLI client for a hosted workspace service.
//!
//! A thin wrapper over the tome libraries: fetch, export, and back up
//! databases, pages, and blocks.

mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.json_logs);

    let globals = cli.globals();
    match cli.command {
        Commands::Users(args) => commands::users::run(args, &globals).await,
        Commands::Databases(args) => commands::databases::run(args, &globals).await,
        Commands::Query(args) => commands::query::run(args, &globals).await,
        Commands::Page(args) => commands::page::run(args, &globals).await,
        Commands::Block(args) => commands::block::run(args, &globals).await,
        Commands::Blocks(args) => commands::blocks::run(args, &globals).await,
        Commands::Create(args) => commands::create::run(args, &globals).await,
        Commands::Update(args) => commands::update::run(args, &globals).await,
        Commands::Backup(args) => commands::backup::run(args, &globals).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
