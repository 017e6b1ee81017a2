//! Query command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tome_backup::BackupSink;
use tome_core::ObjectId;
use tome_core::record::DatabaseQuery;
use tome_core::traits::Workspace;
use tome_core::walk::{WalkOptions, WalkOutput, walk};

use crate::cli::Globals;
use crate::commands::{PageTicker, json_arg};
use crate::{config, output};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Database id or URL
    pub database: String,

    /// Filter specification as inline JSON
    #[arg(long)]
    pub filter: Option<String>,

    /// Filter specification from a file
    #[arg(long, value_name = "PATH", conflicts_with = "filter")]
    pub filter_file: Option<PathBuf>,

    /// Sort specification as inline JSON
    #[arg(long)]
    pub sorts: Option<String>,

    /// Sort specification from a file
    #[arg(long, value_name = "PATH", conflicts_with = "sorts")]
    pub sorts_file: Option<PathBuf>,

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

pub async fn run(args: QueryArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let id = ObjectId::new(&args.database).context("Invalid database id")?;

    let query = DatabaseQuery {
        filter: json_arg(args.filter.as_deref(), args.filter_file.as_ref(), "filter")?,
        sorts: json_arg(args.sorts.as_deref(), args.sorts_file.as_ref(), "sorts")?,
        page_size: args.page_size,
    };

    if !args.all && !args.raw {
        let page = workspace
            .query_database(&id, &query, args.cursor.as_deref())
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
    let state = walk(
        |cursor| {
            let id = &id;
            let query = &query;
            async move { ws.query_database(id, query, cursor.as_deref()).await }
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
