//! Output formatting helpers.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::cli::Globals;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a dimmed note on stderr.
pub fn note(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Emit a command result, honoring `--quiet` and `--save`.
pub fn result<T: Serialize>(value: &T, globals: &Globals) -> Result<()> {
    if let Some(path) = &globals.save {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        success(&format!("saved to {}", path.display()));
    }

    if !globals.quiet {
        json_pretty(value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_the_result_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let globals = Globals {
            quiet: true,
            save: Some(path.clone()),
        };

        result(&serde_json::json!({"id": "p1"}), &globals).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["id"], "p1");
    }
}
