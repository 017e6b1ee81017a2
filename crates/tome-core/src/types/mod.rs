//! Core identifier and URL types.
//!
//! These types normalize and validate their input at construction time,
//! so the rest of the toolkit never has to re-parse ids or URLs.

mod api_url;
mod object_id;

pub use api_url::ApiUrl;
pub use object_id::ObjectId;
