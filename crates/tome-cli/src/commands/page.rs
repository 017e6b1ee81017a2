//! Page command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};

use tome_core::ObjectId;
use tome_core::record::Record;
use tome_core::traits::Workspace;

use crate::cli::Globals;
use crate::commands::parse_ids;
use crate::{config, output};

/// Property types the service computes itself; they cannot be written
/// back on page creation.
const NON_EDITABLE: &[&str] = &[
    "rollup",
    "formula",
    "created_time",
    "created_by",
    "last_edited_time",
    "last_edited_by",
    "unique_id",
];

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("copying").args(["duplicate", "copy"])
    .multiple(false))]
pub struct PageArgs {
    /// Page ids or URLs
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Create a copy of each page in its own database
    #[arg(long)]
    pub duplicate: bool,

    /// Create a copy of each page in another database
    #[arg(long, value_name = "DATABASE", conflicts_with = "duplicate")]
    pub copy: Option<String>,

    /// Title for the copy
    #[arg(long, requires = "copying")]
    pub name: Option<String>,

    /// Prefix prepended to the original title of the copy
    #[arg(long, requires = "copying", conflicts_with = "name")]
    pub prefix: Option<String>,
}

pub async fn run(args: PageArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let ids = parse_ids(&args.ids, "page")?;
    let copy_target = args
        .copy
        .as_deref()
        .map(ObjectId::new)
        .transpose()
        .context("Invalid database id")?;

    let copying = args.duplicate || copy_target.is_some();
    let mut results = Vec::with_capacity(ids.len());

    for id in &ids {
        let page = workspace.retrieve_page(id).await?;

        if !copying {
            results.push(page);
            continue;
        }

        let command = copy_command(
            &page,
            copy_target.as_ref().map(ObjectId::as_str),
            args.name.as_deref(),
            args.prefix.as_deref(),
        )?;
        let created = workspace.create_page(&command).await?;
        output::success(&format!(
            "copied {} to {}",
            id,
            created.id().unwrap_or("<no id>")
        ));
        results.push(created);
    }

    output::result(&results, globals)
}

/// Build a create command from an existing page: same (or overridden)
/// parent database, non-editable properties dropped, title rewritten.
fn copy_command(
    page: &Record,
    target_database: Option<&str>,
    name: Option<&str>,
    prefix: Option<&str>,
) -> Result<Value> {
    let value = page.as_value();

    let database_id = match target_database {
        Some(db) => db.to_string(),
        None => value
            .pointer("/parent/database_id")
            .and_then(Value::as_str)
            .context("Page has no parent database; use --copy to pick one")?
            .to_string(),
    };

    let source = value
        .get("properties")
        .and_then(Value::as_object)
        .context("Page has no properties")?;

    let mut properties = editable_properties(source);

    if let Some(key) = title_key(source) {
        let title = match (name, prefix) {
            (Some(name), _) => name.to_string(),
            (None, Some(prefix)) => format!("{}{}", prefix, title_text(&source[&key])),
            (None, None) => title_text(&source[&key]),
        };
        properties.insert(
            key,
            json!({"title": [{"text": {"content": title}}]}),
        );
    }

    Ok(json!({
        "parent": {"database_id": database_id},
        "properties": Value::Object(properties),
    }))
}

/// Drop properties the service refuses on creation.
fn editable_properties(source: &Map<String, Value>) -> Map<String, Value> {
    source
        .iter()
        .filter(|(_, prop)| {
            let kind = prop.get("type").and_then(Value::as_str).unwrap_or("");
            !NON_EDITABLE.contains(&kind)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Find the title property's key.
fn title_key(source: &Map<String, Value>) -> Option<String> {
    source
        .iter()
        .find(|(_, prop)| prop.get("type").and_then(Value::as_str) == Some("title"))
        .map(|(k, _)| k.clone())
}

/// Join a title property's plain-text fragments.
fn title_text(prop: &Value) -> String {
    prop.get("title")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
