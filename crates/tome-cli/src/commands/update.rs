//! Update command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value, json};

use tome_core::traits::Workspace;

use crate::cli::Globals;
use crate::commands::{json_arg, parse_ids};
use crate::{config, output};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Page ids or URLs
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Properties patch as inline JSON
    #[arg(long)]
    pub properties: Option<String>,

    /// Properties patch from a file
    #[arg(long, value_name = "PATH", conflicts_with = "properties")]
    pub data: Option<PathBuf>,

    /// Icon specification as inline JSON
    #[arg(long)]
    pub icon: Option<String>,

    /// Emoji icon shorthand
    #[arg(long, conflicts_with = "icon")]
    pub emoji: Option<String>,

    /// Cover specification as inline JSON
    #[arg(long)]
    pub cover: Option<String>,

    /// Archive the pages
    #[arg(long, conflicts_with = "unarchive")]
    pub archive: bool,

    /// Restore the pages from the archive
    #[arg(long)]
    pub unarchive: bool,
}

pub async fn run(args: UpdateArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let ids = parse_ids(&args.ids, "page")?;

    let command = build_command(&args)?;

    let mut updated = Vec::with_capacity(ids.len());
    for id in &ids {
        let page = workspace.update_page(id, &command).await?;
        output::success(&format!("updated {}", id));
        updated.push(page);
    }

    output::result(&updated, globals)
}

fn build_command(args: &UpdateArgs) -> Result<Value> {
    let mut command = Map::new();

    if let Some(properties) = json_arg(args.properties.as_deref(), args.data.as_ref(), "properties")?
    {
        command.insert("properties".to_string(), properties);
    }

    if let Some(icon) = json_arg(args.icon.as_deref(), None, "icon")? {
        command.insert("icon".to_string(), icon);
    } else if let Some(emoji) = &args.emoji {
        command.insert("icon".to_string(), json!({"type": "emoji", "emoji": emoji}));
    }

    if let Some(cover) = json_arg(args.cover.as_deref(), None, "cover")? {
        command.insert("cover".to_string(), cover);
    }

    if args.archive {
        command.insert("archived".to_string(), Value::Bool(true));
    } else if args.unarchive {
        command.insert("archived".to_string(), Value::Bool(false));
    }

    if command.is_empty() {
        anyhow::bail!(
            "Nothing to update: pass --properties, --data, --icon, --emoji, --cover, --archive, or --unarchive"
        );
    }

    Ok(Value::Object(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> UpdateArgs {
        UpdateArgs {
            ids: vec!["p1".to_string()],
            properties: None,
            data: None,
            icon: None,
            emoji: None,
            cover: None,
            archive: false,
            unarchive: false,
        }
    }

    #[test]
    fn emoji_expands_to_an_icon() {
        let command = build_command(&UpdateArgs {
            emoji: Some("🎉".to_string()),
            ..base_args()
        })
        .unwrap();

        assert_eq!(command["icon"]["type"], "emoji");
        assert_eq!(command["icon"]["emoji"], "🎉");
    }

    #[test]
    fn archive_flag_sets_archived() {
        let command = build_command(&UpdateArgs {
            archive: true,
            ..base_args()
        })
        .unwrap();
        assert_eq!(command["archived"], true);
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(build_command(&base_args()).is_err());
    }
}
