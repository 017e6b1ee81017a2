//! Record, page, and envelope types.
//!
//! Remote objects are opaque JSON documents; the toolkit only ever reads
//! the handful of fields it needs (`id`, `object`, `title`) and passes
//! everything else through untouched.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ObjectId;

/// One opaque record returned by the remote service.
///
/// The inner value is schema-agnostic; interpretation is left to the
/// operator looking at the exported JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Wrap a JSON value as a record.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the record id, if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Returns the object kind tag (`database`, `page`, `block`, ...), if present.
    pub fn object(&self) -> Option<&str> {
        self.0.get("object").and_then(Value::as_str)
    }

    /// Returns the inner JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the record, returning the inner JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Best-effort plain-text title for database records.
    ///
    /// Joins the `plain_text` fragments of the top-level `title` array.
    /// Returns an empty string when no title is present.
    pub fn plain_title(&self) -> String {
        self.0
            .get("title")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One response from a paginated fetch.
///
/// The cursor is only meaningful in combination with the exact request
/// parameters that produced it. `has_more` is optional so that a
/// malformed response missing the field is representable (the walker
/// treats it as terminal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// The records in this page, in server order.
    #[serde(default)]
    pub results: Vec<Record>,

    /// Whether more data remains after this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,

    /// Continuation cursor for the next page, if more data remains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl PageResult {
    /// Returns true when this page ends the walk: `has_more` absent or
    /// false, or no usable continuation cursor.
    pub fn is_terminal(&self) -> bool {
        if self.has_more != Some(true) {
            return true;
        }
        match self.next_cursor.as_deref() {
            Some(c) if !c.is_empty() => false,
            _ => true,
        }
    }
}

/// Kind tags for locally synthesized envelope documents.
///
/// These are distinct from every remote kind so that envelopes and raw
/// records can never be confused in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// All resolved databases.
    DatabaseIndex,
    /// All entries of one database.
    DatabaseContent,
    /// The global entry id list across all databases.
    PagesInDatabases,
    /// All content blocks of one entry.
    PageContent,
}

impl EnvelopeKind {
    /// Returns the kind tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::DatabaseIndex => "database_index",
            EnvelopeKind::DatabaseContent => "database_content",
            EnvelopeKind::PagesInDatabases => "pages_in_databases",
            EnvelopeKind::PageContent => "page_content",
        }
    }
}

/// A locally synthesized wrapper grouping a batch of records under one
/// persisted unit.
///
/// Envelopes are created in-memory per backup unit of work. Their id is
/// deterministic (the owning object's id, or the kind tag for the two
/// global envelopes), so re-running a backup produces the same ids and
/// the store's duplicate check skips them instead of accumulating one
/// copy per run.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Envelope kind tag.
    pub object: EnvelopeKind,

    /// Marks this document as locally synthesized rather than fetched.
    pub native_object: bool,

    /// Deterministic id: the owning object's id for per-owner
    /// envelopes, the kind tag otherwise.
    pub id: String,

    /// The owning database, for per-database envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,

    /// The owning entry/page, for per-entry envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// The wrapped contents, in fetch order.
    pub contents: Value,
}

impl Envelope {
    fn new(kind: EnvelopeKind, id: String, contents: Value) -> Self {
        Self {
            object: kind,
            native_object: false,
            id,
            database_id: None,
            page_id: None,
            created_at: Utc::now().to_rfc3339(),
            contents,
        }
    }

    /// Envelope wrapping the resolved database list.
    pub fn database_index(databases: &[Record]) -> Self {
        Self::new(
            EnvelopeKind::DatabaseIndex,
            EnvelopeKind::DatabaseIndex.as_str().to_string(),
            Value::Array(databases.iter().map(|r| r.as_value().clone()).collect()),
        )
    }

    /// Envelope wrapping all entries of one database, keyed by that
    /// database's id.
    pub fn database_content(database_id: &ObjectId, entries: &[Record]) -> Self {
        let mut env = Self::new(
            EnvelopeKind::DatabaseContent,
            database_id.as_str().to_string(),
            Value::Array(entries.iter().map(|r| r.as_value().clone()).collect()),
        );
        env.database_id = Some(database_id.as_str().to_string());
        env
    }

    /// Envelope wrapping the global entry id list.
    pub fn pages_in_databases(page_ids: &[String]) -> Self {
        Self::new(
            EnvelopeKind::PagesInDatabases,
            EnvelopeKind::PagesInDatabases.as_str().to_string(),
            Value::Array(page_ids.iter().map(|id| Value::String(id.clone())).collect()),
        )
    }

    /// Envelope wrapping the content blocks of one entry, keyed by that
    /// entry's id.
    pub fn page_content(page_id: &str, blocks: &[Record]) -> Self {
        let mut env = Self::new(
            EnvelopeKind::PageContent,
            page_id.to_string(),
            Value::Array(blocks.iter().map(|r| r.as_value().clone()).collect()),
        );
        env.page_id = Some(page_id.to_string());
        env
    }

    /// Serialize this envelope to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("envelope serialization is infallible")
    }
}

/// Parameters for a database query, passed through to the service
/// verbatim. No query language is interpreted locally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseQuery {
    /// Filter specification, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    /// Sort specification, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Value>,

    /// Page size (service max is typically 100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_accessors() {
        let record = Record::new(json!({
            "object": "page",
            "id": "abc-123",
            "properties": {"Name": {"title": []}}
        }));
        assert_eq!(record.id(), Some("abc-123"));
        assert_eq!(record.object(), Some("page"));
    }

    #[test]
    fn record_without_identity() {
        let record = Record::new(json!({"foo": "bar"}));
        assert_eq!(record.id(), None);
        assert_eq!(record.object(), None);
    }

    #[test]
    fn plain_title_joins_fragments() {
        let record = Record::new(json!({
            "object": "database",
            "id": "db1",
            "title": [
                {"plain_text": "Project "},
                {"plain_text": "Tracker"}
            ]
        }));
        assert_eq!(record.plain_title(), "Project Tracker");
    }

    #[test]
    fn page_terminality() {
        let terminal = PageResult {
            results: vec![],
            has_more: Some(false),
            next_cursor: None,
        };
        assert!(terminal.is_terminal());

        let missing_flag: PageResult = serde_json::from_value(json!({"results": []})).unwrap();
        assert!(missing_flag.is_terminal());

        let more_without_cursor = PageResult {
            results: vec![],
            has_more: Some(true),
            next_cursor: Some(String::new()),
        };
        assert!(more_without_cursor.is_terminal());

        let more = PageResult {
            results: vec![],
            has_more: Some(true),
            next_cursor: Some("cur".to_string()),
        };
        assert!(!more.is_terminal());
    }

    #[test]
    fn envelope_fields() {
        let db_id = ObjectId::new("01234567-89ab-cdef-0123-456789abcdef").unwrap();
        let entries = vec![Record::new(json!({"object": "page", "id": "p1"}))];
        let env = Envelope::database_content(&db_id, &entries);

        assert_eq!(env.object, EnvelopeKind::DatabaseContent);
        assert!(!env.native_object);
        assert_eq!(env.database_id.as_deref(), Some(db_id.as_str()));
        assert!(env.page_id.is_none());
        assert_eq!(env.id, db_id.as_str());

        let value = env.to_value();
        assert_eq!(value["object"], "database_content");
        assert_eq!(value["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn envelope_ids_are_deterministic() {
        // Same unit of work, same id: re-running a backup must produce
        // duplicate store keys, not fresh documents.
        let a = Envelope::pages_in_databases(&[]);
        let b = Envelope::pages_in_databases(&["p1".to_string()]);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "pages_in_databases");

        let page_a = Envelope::page_content("p1", &[]);
        let page_b = Envelope::page_content("p1", &[]);
        assert_eq!(page_a.id, "p1");
        assert_eq!(page_a.id, page_b.id);
    }
}
