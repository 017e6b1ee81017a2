//! Progress observer trait.

use std::fmt;

/// The pipeline stage a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Enumerating databases.
    DatabaseEnumeration,
    /// Paginating a database's entries.
    EntryPagination,
    /// Paginating an entry's content blocks.
    BlockPagination,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::DatabaseEnumeration => "databases",
            Phase::EntryPagination => "entries",
            Phase::BlockPagination => "blocks",
        };
        f.write_str(s)
    }
}

/// One progress event.
#[derive(Debug, Clone)]
pub struct Progress {
    /// The pipeline stage.
    pub phase: Phase,
    /// Completed units in this stage.
    pub current: usize,
    /// Total units in this stage.
    pub total: usize,
    /// Elapsed-rate ETA for the remainder, when computable.
    pub eta_seconds: Option<f64>,
}

/// Receiver for progress events.
///
/// Implementations must not block or alter control flow; a slow or
/// failing observer is the observer's problem, never the walk's.
pub trait ProgressObserver: Send + Sync {
    /// Called once per fetched page during a cursor walk.
    fn on_page(&self, page_index: usize, page_len: usize, running_total: usize) {
        let _ = (page_index, page_len, running_total);
    }

    /// Called after each completed unit of pipeline work.
    fn on_progress(&self, progress: &Progress) {
        let _ = progress;
    }
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}
