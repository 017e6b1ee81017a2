//! File-tree and store-backed object sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use tome_core::record::Record;
use tome_core::traits::{ObjectSink, Persisted};
use tome_core::Result;

use crate::store::DocStore;

/// Persists records to `{base}/{kind}/{id}.json` and, optionally, to an
/// embedded store.
///
/// File writes are authoritative and unconditional: a failed write
/// fails the persist, and re-persisting an id overwrites the file so a
/// re-run refreshes changed records. Duplicate detection lives in the
/// store, whose failed insertions are logged and ignored so a damaged
/// store file never aborts a backup that is otherwise producing good
/// output.
pub struct BackupSink {
    objects_dir: Option<PathBuf>,
    store: Option<Arc<DocStore>>,
}

impl BackupSink {
    /// A sink writing under the given objects directory.
    pub fn to_dir(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: Some(objects_dir.into()),
            store: None,
        }
    }

    /// A sink writing only to a store.
    pub fn to_store(store: Arc<DocStore>) -> Self {
        Self {
            objects_dir: None,
            store: Some(store),
        }
    }

    /// Also insert every record into the given store.
    pub fn with_store(mut self, store: Arc<DocStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The objects directory, if file output is enabled.
    pub fn objects_dir(&self) -> Option<&Path> {
        self.objects_dir.as_deref()
    }

    /// The attached store, if any.
    pub fn store(&self) -> Option<&Arc<DocStore>> {
        self.store.as_ref()
    }

    fn write_file(&self, kind: &str, id: &str, record: &Record) -> Result<Persisted> {
        let Some(base) = &self.objects_dir else {
            return Ok(Persisted::Skipped);
        };

        let dir = base.join(kind);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{id}.json"));
        let existed = path.exists();

        let body = serde_json::to_vec_pretty(record.as_value())?;
        std::fs::write(&path, body)?;
        debug!(id, kind, path = %path.display(), existed, "wrote object file");
        Ok(if existed {
            Persisted::Skipped
        } else {
            Persisted::Inserted
        })
    }
}

#[async_trait]
impl ObjectSink for BackupSink {
    async fn persist(&self, record: &Record) -> Result<Persisted> {
        let Some(id) = record.id() else {
            warn!("record without id, not persisting");
            return Ok(Persisted::Skipped);
        };
        let kind = record.object().unwrap_or("unknown").to_string();
        let id = id.to_string();

        let outcome = self.write_file(&kind, &id, record)?;

        if let Some(store) = &self.store {
            match store.insert_if_absent(&kind, &id, record.as_value()) {
                Ok(inserted) => {
                    if inserted && outcome == Persisted::Skipped && self.objects_dir.is_none() {
                        return Ok(Persisted::Inserted);
                    }
                }
                Err(err) => warn!(id, kind, %err, "store insertion failed"),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: &str, id: &str) -> Record {
        Record::new(json!({"object": kind, "id": id, "title": []}))
    }

    #[tokio::test]
    async fn writes_one_file_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = BackupSink::to_dir(dir.path());

        let outcome = sink.persist(&record("page", "p1")).await.unwrap();
        assert_eq!(outcome, Persisted::Inserted);

        let path = dir.path().join("page").join("p1.json");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["id"], "p1");
    }

    #[tokio::test]
    async fn repeat_persist_overwrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = BackupSink::to_dir(dir.path());

        let first = Record::new(json!({"object": "page", "id": "p1", "rev": 1}));
        let second = Record::new(json!({"object": "page", "id": "p1", "rev": 2}));

        assert_eq!(sink.persist(&first).await.unwrap(), Persisted::Inserted);
        assert_eq!(sink.persist(&second).await.unwrap(), Persisted::Skipped);

        // The file always reflects the latest persisted revision.
        let path = dir.path().join("page").join("p1.json");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["rev"], 2);
    }

    #[tokio::test]
    async fn records_without_id_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = BackupSink::to_dir(dir.path());

        let outcome = sink
            .persist(&Record::new(json!({"object": "page"})))
            .await
            .unwrap();
        assert_eq!(outcome, Persisted::Skipped);
    }

    #[tokio::test]
    async fn store_receives_records_too() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocStore::open(dir.path().join("data.db")).unwrap());
        let sink = BackupSink::to_dir(dir.path().join("objects")).with_store(store.clone());

        sink.persist(&record("database", "db1")).await.unwrap();
        sink.persist(&record("page", "p1")).await.unwrap();
        sink.persist(&record("page", "p1")).await.unwrap();

        assert_eq!(store.len().unwrap(), 2);
    }
}
