//! Workspace service trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::record::{DatabaseQuery, PageResult, Record};
use crate::types::ObjectId;

/// The remote object-fetching service.
///
/// Implementations own authentication and endpoint semantics; callers
/// treat every returned object as opaque JSON. All paginated operations
/// take an optional continuation cursor valid only against the same
/// parameters that produced it.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// List the databases the credentials can enumerate.
    async fn list_databases(&self, cursor: Option<&str>) -> Result<PageResult>;

    /// Retrieve a single database by id.
    async fn retrieve_database(&self, id: &ObjectId) -> Result<Record>;

    /// Query a database's entries. Filter and sorts are passed through
    /// verbatim.
    async fn query_database(
        &self,
        id: &ObjectId,
        query: &DatabaseQuery,
        cursor: Option<&str>,
    ) -> Result<PageResult>;

    /// List the child blocks of a page or block.
    async fn list_block_children(
        &self,
        id: &ObjectId,
        page_size: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<PageResult>;

    /// Retrieve a single page by id.
    async fn retrieve_page(&self, id: &ObjectId) -> Result<Record>;

    /// Retrieve a single block by id.
    async fn retrieve_block(&self, id: &ObjectId) -> Result<Record>;

    /// Create a page from a full create command.
    async fn create_page(&self, command: &Value) -> Result<Record>;

    /// Update a page with a partial update command.
    async fn update_page(&self, id: &ObjectId, command: &Value) -> Result<Record>;

    /// List workspace users.
    async fn list_users(&self, cursor: Option<&str>) -> Result<PageResult>;
}
