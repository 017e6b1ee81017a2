//! Backup command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use tome_backup::{BackupOptions, BackupPipeline, StatusLine};

use crate::cli::Globals;
use crate::commands::parse_ids;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Database ids or URLs to back up (default: every visible database)
    pub ids: Vec<String>,

    /// Destination directory
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// Write directly into the destination, without a dated subdirectory
    #[arg(long)]
    pub no_date: bool,

    /// Embedded store file to fill alongside the file tree
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Create the store file when it does not exist
    #[arg(long, requires = "store")]
    pub create_store: bool,

    /// Delete and recreate the store file before the run
    #[arg(long, requires = "store")]
    pub remove_store: bool,

    /// Skip the per-entry content block phase
    #[arg(long)]
    pub skip_blocks: bool,
}

pub async fn run(args: BackupArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;

    let options = BackupOptions {
        output_dir: args.output,
        dated_subdir: !args.no_date,
        database_ids: parse_ids(&args.ids, "database")?,
        store_path: args.store,
        create_store: args.create_store,
        remove_store: args.remove_store,
        skip_blocks: args.skip_blocks,
        max_pages: None,
    };

    let status = StatusLine;
    let mut pipeline = BackupPipeline::new(&workspace);
    if !globals.quiet {
        pipeline = pipeline.with_progress(&status);
    }

    let summary = pipeline.run(&options).await?;

    output::success(&format!("backup written to {}", summary.root.display()));
    output::field("databases", &summary.databases.to_string());
    output::field("entries", &summary.entries.to_string());
    output::field("blocks", &summary.blocks.to_string());

    Ok(())
}
