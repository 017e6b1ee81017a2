//! Endpoint paths for the workspace API.

use tome_core::types::ObjectId;

pub(crate) const DATABASES: &str = "/v1/databases";
pub(crate) const PAGES: &str = "/v1/pages";
pub(crate) const USERS: &str = "/v1/users";

pub(crate) fn database(id: &ObjectId) -> String {
    format!("{}/{}", DATABASES, id)
}

pub(crate) fn database_query(id: &ObjectId) -> String {
    format!("{}/{}/query", DATABASES, id)
}

pub(crate) fn page(id: &ObjectId) -> String {
    format!("{}/{}", PAGES, id)
}

pub(crate) fn block(id: &ObjectId) -> String {
    format!("/v1/blocks/{}", id)
}

pub(crate) fn block_children(id: &ObjectId) -> String {
    format!("/v1/blocks/{}/children", id)
}
