//! The hierarchical backup pipeline.
//!
//! Walks databases, then each database's entries, then each entry's
//! content blocks, persisting every fetched record through the object
//! sink and writing one envelope file per unit of work. Any walk
//! failure aborts the whole run; whatever was persisted before the
//! failure stays on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde_json::Value;
use tracing::{info, instrument, warn};

use tome_core::error::{ConfigError, InvalidInputError};
use tome_core::record::{DatabaseQuery, Envelope, Record};
use tome_core::traits::{NoopProgress, ObjectSink, Phase, Progress, ProgressObserver, Workspace};
use tome_core::types::ObjectId;
use tome_core::walk::{WalkOptions, walk};
use tome_core::{Error, Result};

use crate::sink::BackupSink;
use crate::store::DocStore;

/// Options for one backup run.
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Destination directory. Required.
    pub output_dir: PathBuf,
    /// Nest the run under a `YYYY-MM-DD` subdirectory.
    pub dated_subdir: bool,
    /// Back up only these databases. Empty means all databases the
    /// token can see.
    pub database_ids: Vec<ObjectId>,
    /// Path to the embedded store file. None disables the store.
    pub store_path: Option<PathBuf>,
    /// Create the store file when it does not exist.
    pub create_store: bool,
    /// Delete and recreate the store file before the run.
    pub remove_store: bool,
    /// Skip the per-entry block phase.
    pub skip_blocks: bool,
    /// Bound every cursor walk to this many pages.
    pub max_pages: Option<usize>,
}

/// Counts from a finished backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    /// Databases backed up.
    pub databases: usize,
    /// Database entries backed up.
    pub entries: usize,
    /// Content blocks backed up.
    pub blocks: usize,
    /// The run's root directory.
    pub root: PathBuf,
}

/// Drives a full hierarchical backup over any [`Workspace`].
pub struct BackupPipeline<'a> {
    workspace: &'a dyn Workspace,
    progress: &'a dyn ProgressObserver,
}

impl<'a> BackupPipeline<'a> {
    /// A pipeline over the given workspace, reporting no progress.
    pub fn new(workspace: &'a dyn Workspace) -> Self {
        Self {
            workspace,
            progress: &NoopProgress,
        }
    }

    /// Report unit-of-work progress to the given observer.
    pub fn with_progress(mut self, progress: &'a dyn ProgressObserver) -> Self {
        self.progress = progress;
        self
    }

    /// Run a backup.
    #[instrument(skip(self, options), fields(output = %options.output_dir.display()))]
    pub async fn run(&self, options: &BackupOptions) -> Result<BackupSummary> {
        if options.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDirectory.into());
        }

        let store = open_store(options)?;

        let root = if options.dated_subdir {
            options
                .output_dir
                .join(Local::now().format("%Y-%m-%d").to_string())
        } else {
            options.output_dir.clone()
        };
        for dir in ["objects", "databases", "database_content", "page_content"] {
            std::fs::create_dir_all(root.join(dir))?;
        }

        let mut sink = BackupSink::to_dir(root.join("objects"));
        if let Some(store) = &store {
            sink = sink.with_store(store.clone());
        }

        let databases = self.resolve_databases(options, &sink).await?;
        info!(count = databases.len(), "resolved databases");

        let index = Envelope::database_index(&databases);
        write_envelope(&root.join("databases").join("index.json"), &index, &store)?;

        let mut entries_total = 0usize;
        let mut page_ids: Vec<String> = Vec::new();
        for (i, database) in databases.iter().enumerate() {
            let entries = self.backup_database(database, options, &sink, &root).await?;
            entries_total += entries.len();
            page_ids.extend(entries.iter().filter_map(|e| e.id().map(String::from)));
            self.progress.on_progress(&Progress {
                phase: Phase::EntryPagination,
                current: i + 1,
                total: databases.len(),
                eta_seconds: None,
            });
        }

        let id_list = Envelope::pages_in_databases(&page_ids);
        write_envelope(
            &root.join("databases").join("pages_in_databases.json"),
            &id_list,
            &store,
        )?;

        let mut blocks_total = 0usize;
        if !options.skip_blocks {
            let started = Instant::now();
            for (i, page_id) in page_ids.iter().enumerate() {
                blocks_total += self.backup_page(page_id, options, &sink, &root).await?;
                let done = i + 1;
                let eta = if done < page_ids.len() {
                    let per_unit = started.elapsed().as_secs_f64() / done as f64;
                    Some(per_unit * (page_ids.len() - done) as f64)
                } else {
                    None
                };
                self.progress.on_progress(&Progress {
                    phase: Phase::BlockPagination,
                    current: done,
                    total: page_ids.len(),
                    eta_seconds: eta,
                });
            }
        }

        let summary = BackupSummary {
            databases: databases.len(),
            entries: entries_total,
            blocks: blocks_total,
            root,
        };
        info!(
            databases = summary.databases,
            entries = summary.entries,
            blocks = summary.blocks,
            "backup complete"
        );
        Ok(summary)
    }

    /// Resolve the set of databases to back up, persisting each through
    /// the sink.
    async fn resolve_databases(
        &self,
        options: &BackupOptions,
        sink: &BackupSink,
    ) -> Result<Vec<Record>> {
        if options.database_ids.is_empty() {
            let ws = self.workspace;
            let state = walk(
                |cursor| async move { ws.list_databases(cursor.as_deref()).await },
                walk_opts(sink, options.max_pages),
            )
            .await?;
            return Ok(state.into_records());
        }

        let mut databases = Vec::with_capacity(options.database_ids.len());
        for (i, id) in options.database_ids.iter().enumerate() {
            let database = self.workspace.retrieve_database(id).await?;
            sink.persist(&database).await?;
            self.progress.on_progress(&Progress {
                phase: Phase::DatabaseEnumeration,
                current: i + 1,
                total: options.database_ids.len(),
                eta_seconds: None,
            });
            databases.push(database);
        }
        Ok(databases)
    }

    /// Fetch all entries of one database and write its content envelope.
    async fn backup_database(
        &self,
        database: &Record,
        options: &BackupOptions,
        sink: &BackupSink,
        root: &Path,
    ) -> Result<Vec<Record>> {
        let id = database.id().ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::Other {
                message: "database record without id".to_string(),
            })
        })?;
        let database_id = ObjectId::new(id)?;

        let ws = self.workspace;
        let query = DatabaseQuery::default();
        let state = walk(
            |cursor| {
                let database_id = &database_id;
                let query = &query;
                async move {
                    ws.query_database(database_id, query, cursor.as_deref())
                        .await
                }
            },
            walk_opts(sink, options.max_pages),
        )
        .await?;
        let entries = state.into_records();

        let envelope = Envelope::database_content(&database_id, &entries);
        let filename = format!(
            "pages_{}_{}.json",
            database_id,
            sanitize(&database.plain_title())
        );
        let store = sink_store(sink);
        write_envelope(&root.join("database_content").join(filename), &envelope, &store)?;

        Ok(entries)
    }

    /// Fetch all content blocks of one entry and write its envelope.
    async fn backup_page(
        &self,
        page_id: &str,
        options: &BackupOptions,
        sink: &BackupSink,
        root: &Path,
    ) -> Result<usize> {
        let id = ObjectId::new(page_id)?;

        let ws = self.workspace;
        let state = walk(
            |cursor| {
                let id = &id;
                async move { ws.list_block_children(id, None, cursor.as_deref()).await }
            },
            walk_opts(sink, options.max_pages),
        )
        .await?;
        let blocks = state.into_records();

        let envelope = Envelope::page_content(page_id, &blocks);
        let store = sink_store(sink);
        write_envelope(
            &root.join("page_content").join(format!("{page_id}.json")),
            &envelope,
            &store,
        )?;

        Ok(blocks.len())
    }
}

fn walk_opts<'s>(sink: &'s BackupSink, max_pages: Option<usize>) -> WalkOptions<'s> {
    let opts = WalkOptions::flattened().with_sink(sink);
    match max_pages {
        Some(max) => opts.with_max_pages(max),
        None => opts,
    }
}

fn open_store(options: &BackupOptions) -> Result<Option<Arc<DocStore>>> {
    let Some(path) = &options.store_path else {
        return Ok(None);
    };

    if options.remove_store && path.exists() {
        std::fs::remove_file(path)?;
    }
    if !path.exists() && !options.create_store && !options.remove_store {
        return Err(ConfigError::StoreMissing { path: path.clone() }.into());
    }

    Ok(Some(Arc::new(DocStore::open(path)?)))
}

fn sink_store(sink: &BackupSink) -> Option<Arc<DocStore>> {
    sink.store().cloned()
}

/// Write an envelope to its file and insert it into the store.
///
/// Envelope ids are deterministic, so re-runs overwrite the file and
/// get duplicate-skipped by the store. A store failure is logged and
/// ignored, matching the sink's store policy.
fn write_envelope(path: &Path, envelope: &Envelope, store: &Option<Arc<DocStore>>) -> Result<()> {
    let value: Value = envelope.to_value();
    std::fs::write(path, serde_json::to_vec_pretty(&value)?)?;

    if let Some(store) = store {
        if let Err(err) = store.insert_if_absent(envelope.object.as_str(), &envelope.id, &value) {
            warn!(id = %envelope.id, %err, "envelope store insertion failed");
        }
    }
    Ok(())
}

/// Make a database title safe for use inside a filename.
fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}
