//! tome-backup - Hierarchical backup pipeline and object sink.
//!
//! Walks the three-level object hierarchy (databases, database entries,
//! page content blocks) through the cursor walker, persisting every
//! record idempotently to a file tree and/or an embedded store.

mod pipeline;
mod progress;
mod sink;
mod store;

pub use pipeline::{BackupOptions, BackupPipeline, BackupSummary};
pub use progress::StatusLine;
pub use sink::BackupSink;
pub use store::{DocStore, escape_keys};
