//! tome-core - Core types and traits for the tome workspace API toolkit.

pub mod error;
pub mod record;
pub mod traits;
pub mod types;
pub mod walk;

pub use error::Error;
pub use record::{DatabaseQuery, Envelope, EnvelopeKind, PageResult, Record};
pub use traits::{NoopProgress, ObjectSink, Persisted, Phase, Progress, ProgressObserver, Workspace};
pub use types::{ApiUrl, ObjectId};
pub use walk::{WalkMode, WalkOptions, WalkState, walk};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
