//! Blocks command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tome_backup::BackupSink;
use tome_core::ObjectId;
use tome_core::traits::Workspace;
use tome_core::walk::{WalkOptions, WalkOutput, walk};

use crate::cli::Globals;
use crate::commands::PageTicker;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Block or page id (or URL)
    pub id: String,

    /// Page size
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Pagination cursor
    #[arg(long)]
    pub cursor: Option<String>,

    /// Fetch every page, flattened into one record list
    #[arg(long, conflicts_with = "cursor")]
    pub all: bool,

    /// Fetch every page, preserving page boundaries
    #[arg(long, conflicts_with_all = ["all", "cursor"])]
    pub raw: bool,

    /// Stream fetched records into a file tree under this directory
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Show per-page progress on stderr
    #[arg(long)]
    pub progress: bool,
}

pub async fn run(args: BlocksArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let id = ObjectId::new(&args.id).context("Invalid block id")?;

    if !args.all && !args.raw {
        let page = workspace
            .list_block_children(&id, args.page_size, args.cursor.as_deref())
            .await?;
        output::result(&page.results, globals)?;
        if let Some(cursor) = &page.next_cursor {
            output::note(&format!("Next cursor: {}", cursor));
        }
        return Ok(());
    }

    let mut options = if args.raw {
        WalkOptions::raw()
    } else {
        WalkOptions::flattened()
    };

    let sink = args.export.as_ref().map(BackupSink::to_dir);
    if let Some(sink) = &sink {
        options = options.with_sink(sink);
    }

    let ticker = PageTicker;
    if args.progress {
        options = options.with_progress(&ticker);
    }

    let ws = &workspace;
    let page_size = args.page_size;
    let state = walk(
        |cursor| {
            let id = &id;
            async move { ws.list_block_children(id, page_size, cursor.as_deref()).await }
        },
        options,
    )
    .await?;
    if args.progress {
        ticker.finish();
    }

    if let Some(dir) = &args.export {
        output::success(&format!(
            "exported {} records to {}",
            state.total_records(),
            dir.display()
        ));
    }

    match state.into_output() {
        WalkOutput::Raw(pages) => output::result(&pages, globals),
        WalkOutput::Flattened(records) => output::result(&records, globals),
    }
}
