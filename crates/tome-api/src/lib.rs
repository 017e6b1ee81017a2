//! tome-api - HTTP-backed workspace implementation.
//!
//! Provides the reqwest client, the rate-limited transport decorator,
//! and the [`HttpWorkspace`] implementation of the core
//! [`Workspace`](tome_core::Workspace) trait.

mod client;
mod endpoints;
mod transport;
mod workspace;

pub use client::ApiClient;
pub use transport::{PacingConfig, RunLog, Transport};
pub use workspace::HttpWorkspace;
