//! Object sink trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::Record;

/// Outcome of a persist call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// The record was written/inserted.
    Inserted,
    /// A record with the same id already existed; nothing was written.
    Skipped,
}

/// Idempotent persistence of fetched records.
///
/// Implementations are keyed by record identity: persisting the same id
/// twice must be a no-op, not an error. The walker streams every page's
/// records through the sink as soon as the page is fetched, so a crash
/// mid-walk still leaves partial progress persisted.
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Persist one record.
    async fn persist(&self, record: &Record) -> Result<Persisted>;
}
