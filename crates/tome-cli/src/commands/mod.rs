//! Subcommand implementations.

pub mod backup;
pub mod block;
pub mod blocks;
pub mod create;
pub mod databases;
pub mod page;
pub mod query;
pub mod update;
pub mod users;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use tome_core::ObjectId;
use tome_core::traits::ProgressObserver;

/// Parse a JSON argument given either inline or as a file path.
pub(crate) fn json_arg(
    inline: Option<&str>,
    file: Option<&PathBuf>,
    what: &str,
) -> Result<Option<Value>> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} file {}", what, path.display()))?,
        (None, None) => return Ok(None),
    };
    let value =
        serde_json::from_str(&text).with_context(|| format!("Invalid {} JSON", what))?;
    Ok(Some(value))
}

/// Parse a list of raw id arguments, rejecting the first invalid one.
pub(crate) fn parse_ids(raw: &[String], what: &str) -> Result<Vec<ObjectId>> {
    raw.iter()
        .map(|s| ObjectId::new(s).with_context(|| format!("Invalid {} id '{}'", what, s)))
        .collect()
}

/// Carriage-return per-page progress for cursor walks.
pub(crate) struct PageTicker;

impl ProgressObserver for PageTicker {
    fn on_page(&self, page_index: usize, page_len: usize, running_total: usize) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\rpage {}: {} records ({} total)",
            page_index + 1,
            page_len,
            running_total
        );
        let _ = stderr.flush();
    }
}

impl PageTicker {
    /// Terminate the status line once the walk is done.
    pub(crate) fn finish(&self) {
        eprintln!();
    }
}
