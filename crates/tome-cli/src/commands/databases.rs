//! Databases command implementation.

use anyhow::Result;
use clap::Args;

use tome_core::traits::Workspace;
use tome_core::walk::{WalkOptions, walk};

use crate::cli::Globals;
use crate::commands::parse_ids;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct DatabasesArgs {
    /// Database ids or URLs to retrieve
    pub ids: Vec<String>,

    /// Force listing even when ids are given
    #[arg(long, conflicts_with = "retrieve")]
    pub list: bool,

    /// Force retrieval by id
    #[arg(long)]
    pub retrieve: bool,

    /// Pagination cursor for listing
    #[arg(long)]
    pub cursor: Option<String>,

    /// Fetch every page when listing
    #[arg(long, conflicts_with = "cursor")]
    pub all: bool,
}

pub async fn run(args: DatabasesArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;

    if args.retrieve && args.ids.is_empty() {
        anyhow::bail!("--retrieve requires at least one database id");
    }

    if args.ids.is_empty() || args.list {
        if args.all {
            let ws = &workspace;
            let state = walk(
                |cursor| async move { ws.list_databases(cursor.as_deref()).await },
                WalkOptions::flattened(),
            )
            .await?;
            return output::result(&state.into_records(), globals);
        }

        let page = workspace.list_databases(args.cursor.as_deref()).await?;
        output::result(&page.results, globals)?;
        if let Some(cursor) = &page.next_cursor {
            output::note(&format!("Next cursor: {}", cursor));
        }
        return Ok(());
    }

    let ids = parse_ids(&args.ids, "database")?;
    let mut databases = Vec::with_capacity(ids.len());
    for id in &ids {
        databases.push(workspace.retrieve_database(id).await?);
    }
    output::result(&databases, globals)
}
