//! Core traits for the workspace service, persistence, and progress.

mod progress;
mod sink;
mod workspace;

pub use progress::{NoopProgress, Phase, Progress, ProgressObserver};
pub use sink::{ObjectSink, Persisted};
pub use workspace::Workspace;
