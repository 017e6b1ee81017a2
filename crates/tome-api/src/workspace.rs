//! HTTP-backed workspace implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use tome_core::record::{DatabaseQuery, PageResult, Record};
use tome_core::traits::Workspace;
use tome_core::types::{ApiUrl, ObjectId};
use tome_core::Result;

use crate::client::ApiClient;
use crate::endpoints;
use crate::transport::{PacingConfig, RunLog, Transport};

/// Query string for cursor-only GET pagination.
#[derive(Debug, serde::Serialize)]
struct CursorQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// Query string for block-children pagination.
#[derive(Debug, serde::Serialize)]
struct ChildrenQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// Body for database query requests.
#[derive(Debug, serde::Serialize)]
struct QueryBody<'a> {
    #[serde(flatten)]
    query: &'a DatabaseQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

/// A network-backed workspace using the rate-limited transport.
#[derive(Debug, Clone)]
pub struct HttpWorkspace {
    client: ApiClient,
}

impl HttpWorkspace {
    /// Create a new workspace client for the given base URL and token.
    pub fn new(base: ApiUrl, token: impl Into<String>, pacing: PacingConfig, log: RunLog) -> Self {
        let transport = Arc::new(Transport::new(pacing, log));
        Self {
            client: ApiClient::new(base, token, transport),
        }
    }

    /// Create a workspace client over an existing transport.
    ///
    /// Lets several clients share one pacing budget.
    pub fn with_transport(base: ApiUrl, token: impl Into<String>, transport: Arc<Transport>) -> Self {
        Self {
            client: ApiClient::new(base, token, transport),
        }
    }

    /// Returns the base URL this workspace talks to.
    pub fn base(&self) -> &ApiUrl {
        self.client.base()
    }
}

#[async_trait]
impl Workspace for HttpWorkspace {
    #[instrument(skip(self))]
    async fn list_databases(&self, cursor: Option<&str>) -> Result<PageResult> {
        debug!("listing databases");
        self.client
            .get(
                "databases.list",
                endpoints::DATABASES,
                Some(&CursorQuery {
                    start_cursor: cursor,
                }),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn retrieve_database(&self, id: &ObjectId) -> Result<Record> {
        debug!(%id, "retrieving database");
        self.client
            .get::<CursorQuery, Record>("databases.retrieve", &endpoints::database(id), None)
            .await
    }

    #[instrument(skip(self, query))]
    async fn query_database(
        &self,
        id: &ObjectId,
        query: &DatabaseQuery,
        cursor: Option<&str>,
    ) -> Result<PageResult> {
        debug!(%id, "querying database");
        self.client
            .post(
                "databases.query",
                &endpoints::database_query(id),
                &QueryBody {
                    query,
                    start_cursor: cursor,
                },
            )
            .await
    }

    #[instrument(skip(self))]
    async fn list_block_children(
        &self,
        id: &ObjectId,
        page_size: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<PageResult> {
        debug!(%id, "listing block children");
        self.client
            .get(
                "blocks.children.list",
                &endpoints::block_children(id),
                Some(&ChildrenQuery {
                    page_size,
                    start_cursor: cursor,
                }),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn retrieve_page(&self, id: &ObjectId) -> Result<Record> {
        debug!(%id, "retrieving page");
        self.client
            .get::<CursorQuery, Record>("pages.retrieve", &endpoints::page(id), None)
            .await
    }

    #[instrument(skip(self))]
    async fn retrieve_block(&self, id: &ObjectId) -> Result<Record> {
        debug!(%id, "retrieving block");
        self.client
            .get::<CursorQuery, Record>("blocks.retrieve", &endpoints::block(id), None)
            .await
    }

    #[instrument(skip(self, command))]
    async fn create_page(&self, command: &Value) -> Result<Record> {
        debug!("creating page");
        self.client
            .post("pages.create", endpoints::PAGES, command)
            .await
    }

    #[instrument(skip(self, command))]
    async fn update_page(&self, id: &ObjectId, command: &Value) -> Result<Record> {
        debug!(%id, "updating page");
        self.client
            .patch("pages.update", &endpoints::page(id), command)
            .await
    }

    #[instrument(skip(self))]
    async fn list_users(&self, cursor: Option<&str>) -> Result<PageResult> {
        debug!("listing users");
        self.client
            .get(
                "users.list",
                endpoints::USERS,
                Some(&CursorQuery {
                    start_cursor: cursor,
                }),
            )
            .await
    }
}
