//! Create command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Value, json};

use tome_core::ObjectId;
use tome_core::traits::Workspace;

use crate::cli::Globals;
use crate::{config, output};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON template files, one page created per file
    #[arg(required = true)]
    pub templates: Vec<PathBuf>,

    /// Target database id or URL
    #[arg(long)]
    pub database: String,

    /// Title override applied to every created page
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn run(args: CreateArgs, globals: &Globals) -> Result<()> {
    let workspace = config::open_workspace()?;
    let database = ObjectId::new(&args.database).context("Invalid database id")?;

    let mut created = Vec::with_capacity(args.templates.len());
    for template in &args.templates {
        let text = std::fs::read_to_string(template)
            .with_context(|| format!("Failed to read template {}", template.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in template {}", template.display()))?;

        let command = build_command(&database, value, args.name.as_deref())?;
        let page = workspace.create_page(&command).await?;
        output::success(&format!(
            "created {} from {}",
            page.id().unwrap_or("<no id>"),
            template.display()
        ));
        created.push(page);
    }

    output::result(&created, globals)
}

/// Build a create command from a template. Templates either are a bare
/// properties object or carry a top-level `properties` key; either way
/// the parent is always the target database.
fn build_command(database: &ObjectId, template: Value, name: Option<&str>) -> Result<Value> {
    let mut properties = match template {
        Value::Object(mut map) => match map.remove("properties") {
            Some(Value::Object(props)) => props,
            Some(other) => anyhow::bail!("template 'properties' must be an object, got {}", other),
            None => map,
        },
        other => anyhow::bail!("template must be a JSON object, got {}", other),
    };

    if let Some(name) = name {
        let title_key = properties
            .iter()
            .find(|(_, prop)| {
                prop.get("type").and_then(Value::as_str) == Some("title")
                    || prop.get("title").is_some()
            })
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| "Name".to_string());
        properties.insert(
            title_key,
            json!({"title": [{"text": {"content": name}}]}),
        );
    }

    Ok(json!({
        "parent": {"database_id": database.as_str()},
        "properties": Value::Object(properties),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> ObjectId {
        ObjectId::new("33333333-3333-4333-8333-333333333333").unwrap()
    }

    #[test]
    fn bare_properties_template() {
        let template = json!({"Status": {"select": {"name": "Open"}}});
        let command = build_command(&db(), template, None).unwrap();

        assert_eq!(command["parent"]["database_id"], db().as_str());
        assert!(command["properties"]["Status"].is_object());
    }

    #[test]
    fn wrapped_template_with_name_override() {
        let template = json!({
            "properties": {
                "Name": {"title": [{"text": {"content": "Old"}}]}
            }
        });
        let command = build_command(&db(), template, Some("New")).unwrap();

        assert_eq!(
            command["properties"]["Name"]["title"][0]["text"]["content"],
            "New"
        );
    }
}
