//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;

/// CLI client for a hosted workspace service.
#[derive(Parser, Debug)]
#[command(name = "tome")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Suppress result output on stdout
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Save the full result JSON to a file
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "output.json"
    )]
    pub save: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List workspace users
    Users(commands::users::UsersArgs),

    /// List databases, or retrieve them by id
    Databases(commands::databases::DatabasesArgs),

    /// Query a database for its entries
    Query(commands::query::QueryArgs),

    /// Retrieve pages, optionally duplicating them
    Page(commands::page::PageArgs),

    /// Retrieve single blocks
    Block(commands::block::BlockArgs),

    /// List a block's children
    Blocks(commands::blocks::BlocksArgs),

    /// Create pages from JSON templates
    Create(commands::create::CreateArgs),

    /// Update page properties, icon, cover, or archive state
    Update(commands::update::UpdateArgs),

    /// Back up databases, entries, and content blocks
    Backup(commands::backup::BackupArgs),
}

/// Output-shaping flags shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub quiet: bool,
    pub save: Option<PathBuf>,
}

impl Cli {
    pub fn globals(&self) -> Globals {
        Globals {
            quiet: self.quiet,
            save: self.save.clone(),
        }
    }
}
