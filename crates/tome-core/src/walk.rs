//! Paginated cursor walker.
//!
//! Turns "fetch one page given a cursor" into "fetch all pages,
//! optionally flattened". Page fetches are strictly sequential: a
//! continuation cursor is only valid after its predecessor's response,
//! so there is never any parallelism here.

use std::future::Future;

use tracing::{debug, warn};

use crate::Result;
use crate::record::{PageResult, Record};
use crate::traits::{ObjectSink, ProgressObserver};

/// Output mode for a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Keep every full page response, preserving per-page boundaries.
    Raw,
    /// Concatenate all pages' records into one ordered list.
    Flattened,
}

/// Options for a walk.
#[derive(Default)]
pub struct WalkOptions<'a> {
    mode: WalkMode,
    max_pages: Option<usize>,
    sink: Option<&'a dyn ObjectSink>,
    progress: Option<&'a dyn ProgressObserver>,
}

impl Default for WalkMode {
    fn default() -> Self {
        WalkMode::Flattened
    }
}

impl<'a> WalkOptions<'a> {
    /// Options for a flattened walk.
    pub fn flattened() -> Self {
        Self {
            mode: WalkMode::Flattened,
            ..Default::default()
        }
    }

    /// Options for a raw (per-page) walk.
    pub fn raw() -> Self {
        Self {
            mode: WalkMode::Raw,
            ..Default::default()
        }
    }

    /// Stream every fetched page's records through a sink.
    pub fn with_sink(mut self, sink: &'a dyn ObjectSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Report per-page progress to an observer.
    pub fn with_progress(mut self, progress: &'a dyn ProgressObserver) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Bound the walk to at most `max_pages` pages. Off by default;
    /// the walker's sole termination condition is the cursor contract.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }
}

/// Accumulated state of a multi-page fetch.
///
/// The three metadata vectors are parallel: one entry per page fetched.
#[derive(Debug)]
pub struct WalkState {
    /// Continuation cursor reported by each page (the last entry is
    /// usually absent).
    pub cursors: Vec<Option<String>>,
    /// The `has_more` flag reported by each page (missing counts as false).
    pub has_more: Vec<bool>,
    /// Record count of each page.
    pub page_counts: Vec<usize>,
    output: WalkOutput,
}

/// The per-mode payload of a finished walk.
#[derive(Debug)]
pub enum WalkOutput {
    /// Full page responses, in fetch order.
    Raw(Vec<PageResult>),
    /// Concatenated records, preserving page order and within-page order.
    Flattened(Vec<Record>),
}

impl WalkState {
    fn new(mode: WalkMode) -> Self {
        Self {
            cursors: Vec::new(),
            has_more: Vec::new(),
            page_counts: Vec::new(),
            output: match mode {
                WalkMode::Raw => WalkOutput::Raw(Vec::new()),
                WalkMode::Flattened => WalkOutput::Flattened(Vec::new()),
            },
        }
    }

    fn push(&mut self, page: PageResult) {
        self.cursors.push(page.next_cursor.clone());
        self.has_more.push(page.has_more.unwrap_or(false));
        self.page_counts.push(page.results.len());
        match &mut self.output {
            WalkOutput::Raw(pages) => pages.push(page),
            WalkOutput::Flattened(records) => records.extend(page.results),
        }
    }

    /// Number of pages fetched.
    pub fn pages_fetched(&self) -> usize {
        self.page_counts.len()
    }

    /// Total records seen across all pages.
    pub fn total_records(&self) -> usize {
        self.page_counts.iter().sum()
    }

    /// The full page responses, for raw-mode walks.
    pub fn pages(&self) -> Option<&[PageResult]> {
        match &self.output {
            WalkOutput::Raw(pages) => Some(pages),
            WalkOutput::Flattened(_) => None,
        }
    }

    /// Consume the state, returning all records in order regardless of mode.
    pub fn into_records(self) -> Vec<Record> {
        match self.output {
            WalkOutput::Flattened(records) => records,
            WalkOutput::Raw(pages) => pages.into_iter().flat_map(|p| p.results).collect(),
        }
    }

    /// Consume the state, returning the mode-specific output.
    pub fn into_output(self) -> WalkOutput {
        self.output
    }
}

/// Fetch all pages of a paginated operation.
///
/// Always fetches at least one page (with no cursor). While the most
/// recent page reports `has_more` and carries a non-empty continuation
/// cursor, fetches the next page with that cursor. A page missing the
/// `has_more` flag entirely is treated as terminal and logged as a
/// warning; a page with zero records but `has_more` true continues the
/// walk.
///
/// If a sink is configured, each page's records are pushed to it as
/// soon as that page arrives, before the next fetch.
pub async fn walk<F, Fut>(mut fetch_page: F, options: WalkOptions<'_>) -> Result<WalkState>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<PageResult>>,
{
    let mut state = WalkState::new(options.mode);
    let mut cursor: Option<String> = None;
    let mut page_index = 0usize;

    loop {
        let page = fetch_page(cursor.take()).await?;

        if page.has_more.is_none() {
            warn!(page_index, "page response missing has_more; treating as terminal");
        }

        if let Some(sink) = options.sink {
            for record in &page.results {
                sink.persist(record).await?;
            }
        }

        let running_total = state.total_records() + page.results.len();
        if let Some(progress) = options.progress {
            progress.on_page(page_index, page.results.len(), running_total);
        }
        debug!(
            page_index,
            page_len = page.results.len(),
            running_total,
            "fetched page"
        );

        let terminal = page.is_terminal();
        cursor = page.next_cursor.clone();
        state.push(page);

        if terminal {
            break;
        }
        if let Some(max) = options.max_pages {
            if state.pages_fetched() >= max {
                warn!(max_pages = max, "walk stopped at page cap");
                break;
            }
        }
        page_index += 1;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::traits::Persisted;
    use async_trait::async_trait;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn record(id: &str) -> Record {
        Record::new(json!({"object": "page", "id": id}))
    }

    fn page(ids: &[&str], has_more: Option<bool>, next_cursor: Option<&str>) -> PageResult {
        PageResult {
            results: ids.iter().map(|id| record(id)).collect(),
            has_more,
            next_cursor: next_cursor.map(String::from),
        }
    }

    /// Builds a fetcher over a fixed page sequence that also records
    /// the cursor passed to every fetch.
    fn scripted(
        pages: Vec<PageResult>,
    ) -> (
        impl FnMut(Option<String>) -> std::future::Ready<Result<PageResult>>,
        std::rc::Rc<RefCell<Vec<Option<String>>>>,
    ) {
        let queue = RefCell::new(VecDeque::from(pages));
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));
        let seen_out = seen.clone();
        let fetch = move |cursor: Option<String>| {
            seen.borrow_mut().push(cursor);
            let page = queue
                .borrow_mut()
                .pop_front()
                .expect("fetcher called past end of script");
            std::future::ready(Ok(page))
        };
        (fetch, seen_out)
    }

    struct RecordingSink {
        ids: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                ids: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObjectSink for RecordingSink {
        async fn persist(&self, record: &Record) -> Result<Persisted> {
            self.ids
                .lock()
                .unwrap()
                .push(record.id().unwrap_or_default().to_string());
            Ok(Persisted::Inserted)
        }
    }

    #[tokio::test]
    async fn flattened_concatenates_in_order() {
        let (fetch, seen) = scripted(vec![
            page(&["a", "b"], Some(true), Some("c1")),
            page(&["c"], Some(true), Some("c2")),
            page(&["d", "e"], Some(false), None),
        ]);

        let state = walk(fetch, WalkOptions::flattened()).await.unwrap();

        assert_eq!(state.pages_fetched(), 3);
        assert_eq!(state.page_counts, vec![2, 1, 2]);
        assert_eq!(state.has_more, vec![true, true, false]);
        assert_eq!(
            state.cursors,
            vec![Some("c1".to_string()), Some("c2".to_string()), None]
        );

        let ids: Vec<_> = state
            .into_records()
            .iter()
            .map(|r| r.id().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);

        // Each fetch used the previous page's cursor.
        assert_eq!(
            *seen.borrow(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn raw_mode_preserves_page_boundaries() {
        let (fetch, _) = scripted(vec![
            page(&["a"], Some(true), Some("c1")),
            page(&["b"], Some(false), None),
        ]);

        let state = walk(fetch, WalkOptions::raw()).await.unwrap();

        let pages = state.pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].results.len(), 1);
        assert_eq!(pages[1].results.len(), 1);
    }

    #[tokio::test]
    async fn empty_page_with_has_more_continues() {
        let (fetch, seen) = scripted(vec![
            page(&[], Some(true), Some("c1")),
            page(&["a"], Some(false), None),
        ]);

        let state = walk(fetch, WalkOptions::flattened()).await.unwrap();

        assert_eq!(state.pages_fetched(), 2);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1], Some("c1".to_string()));
    }

    #[tokio::test]
    async fn missing_has_more_is_terminal() {
        let (fetch, seen) = scripted(vec![page(&["a", "b"], None, Some("c1"))]);

        let state = walk(fetch, WalkOptions::flattened()).await.unwrap();

        assert_eq!(state.pages_fetched(), 1);
        assert_eq!(state.has_more, vec![false]);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[tokio::test]
    async fn has_more_without_cursor_is_terminal() {
        let (fetch, _) = scripted(vec![page(&["a"], Some(true), None)]);
        let state = walk(fetch, WalkOptions::flattened()).await.unwrap();
        assert_eq!(state.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn max_pages_caps_the_walk() {
        let (fetch, _) = scripted(vec![
            page(&["a"], Some(true), Some("c1")),
            page(&["b"], Some(true), Some("c2")),
            // Never reached: the cap stops the walk first.
            page(&["c"], Some(false), None),
        ]);

        let state = walk(fetch, WalkOptions::flattened().with_max_pages(2))
            .await
            .unwrap();

        assert_eq!(state.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn sink_receives_records_per_page() {
        let sink = RecordingSink::new();
        let (fetch, _) = scripted(vec![
            page(&["a", "b"], Some(true), Some("c1")),
            page(&["c"], Some(false), None),
        ]);

        walk(fetch, WalkOptions::flattened().with_sink(&sink))
            .await
            .unwrap();

        assert_eq!(*sink.ids.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn sink_keeps_partial_progress_on_mid_walk_failure() {
        let sink = RecordingSink::new();
        let pages = RefCell::new(VecDeque::from(vec![page(&["a"], Some(true), Some("c1"))]));
        let fetch = |_cursor: Option<String>| {
            let next = pages.borrow_mut().pop_front();
            std::future::ready(match next {
                Some(p) => Ok(p),
                None => Err(Error::RetriesExhausted {
                    operation: "query".to_string(),
                    attempts: 3,
                }),
            })
        };

        let result = walk(fetch, WalkOptions::flattened().with_sink(&sink)).await;

        assert!(result.is_err());
        // The first page was already streamed before the failure.
        assert_eq!(*sink.ids.lock().unwrap(), vec!["a"]);
    }
}
