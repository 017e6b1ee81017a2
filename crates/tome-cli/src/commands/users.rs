//! Users command implementation.

use anyhow::Result;
use clap::Args;

use tome_core::traits::Workspace;
use tome_core::walk::{WalkOptions, walk};

use crate::cli::Globals;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Pagination cursor
    #[arg(long)]
    pub cursor: Option<String>,

    /// Fetch every page
    #[arg(long, conflicts_with = "cursor")]
    pub all: bool,
}

pub async fn run(args: UsersArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;

    if args.all {
        let ws = &workspace;
        let state = walk(
            |cursor| async move { ws.list_users(cursor.as_deref()).await },
            WalkOptions::flattened(),
        )
        .await?;
        return output::result(&state.into_records(), globals);
    }

    let page = workspace.list_users(args.cursor.as_deref()).await?;
    output::result(&page.results, globals)?;

    if let Some(cursor) = &page.next_cursor {
        output::note(&format!("Next cursor: {}", cursor));
    }

    Ok(())
}
