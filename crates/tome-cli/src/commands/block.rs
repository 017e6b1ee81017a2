//! Block command implementation.

use anyhow::Result;
use clap::Args;

use tome_core::traits::Workspace;

use crate::cli::Globals;
use crate::commands::parse_ids;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct BlockArgs {
    /// Block ids or URLs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

pub async fn run(args: BlockArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let ids = parse_ids(&args.ids, "block")?;

    let mut blocks = Vec::with_capacity(ids.len());
    for id in &ids {
        blocks.push(workspace.retrieve_block(id).await?);
    }
    output::result(&blocks, globals)
}
