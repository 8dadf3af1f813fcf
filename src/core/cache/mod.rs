//! Per-file incremental caches.
//!
//! A [`FileCache`] maps a file path to the latest parse result for that file.
//! Its only writer is its own [`BatchScheduler`]: rebuild requests are
//! coalesced per file, re-parsed in full and swapped in whole, so a reader
//! sees either a complete result or nothing.
//!
//! Consumers learn about changes through a [`Subscription`], a watch on a
//! generation counter that only moves when the map actually changed.
//!
//! ## Module Structure
//!
//! - `catalog`: CatalogCache, parsing catalog files
//! - `source`: SourceCache, extracting call sites from code files

pub mod catalog;
pub mod source;

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

use crate::core::{
    scheduler::{BatchScheduler, SkipDuplicatesByKey},
    workspace::Workspace,
};

pub use catalog::{CatalogCache, CatalogFileParser};
pub use source::{SourceCache, SourceFileParser};

/// Why a file needs rebuilding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Changed => write!(f, "changed"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildRequest {
    pub file_path: String,
    pub kind: ChangeKind,
    /// Current text when the caller has it (e.g. an unsaved buffer).
    /// Otherwise the file is read from the workspace when processed.
    pub text: Option<String>,
}

impl RebuildRequest {
    pub fn new(file_path: impl Into<String>, kind: ChangeKind, text: Option<String>) -> Self {
        Self {
            file_path: file_path.into(),
            kind,
            text,
        }
    }
}

/// Turns one file's text into a cached value.
pub trait FileParser<T>: Send + Sync {
    fn parse(&self, file_path: &str, text: &str) -> T;
}

/// Point-in-time copy of a cache.
pub type Snapshot<T> = BTreeMap<String, Arc<T>>;

/// Handle for "rebuilt" notifications. Dropping it unsubscribes.
#[derive(Debug, Clone)]
pub struct Subscription {
    receiver: watch::Receiver<u64>,
}

impl Subscription {
    /// Wait until the cache changes. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Whether a change happened since the last `changed()` or `mark_seen()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) {
        self.receiver.borrow_and_update();
    }

    pub fn generation(&self) -> u64 {
        *self.receiver.borrow()
    }
}

struct CacheState<T> {
    name: &'static str,
    entries: RwLock<Snapshot<T>>,
    generation: watch::Sender<u64>,
}

impl<T: PartialEq> CacheState<T> {
    fn rebuild(
        &self,
        request: RebuildRequest,
        parser: &dyn FileParser<T>,
        workspace: &dyn Workspace,
    ) -> Result<()> {
        let RebuildRequest {
            file_path,
            kind,
            text,
        } = request;

        let changed = match kind {
            ChangeKind::Deleted => self.evict(&file_path),
            ChangeKind::Created | ChangeKind::Changed => {
                let text = match text {
                    Some(text) => text,
                    None => match workspace.read_text(&file_path) {
                        Ok(text) => text,
                        Err(err) => {
                            // An unreadable file is no longer served stale.
                            if self.evict(&file_path) {
                                self.generation.send_modify(|g| *g += 1);
                            }
                            return Err(err);
                        }
                    },
                };
                let parsed = Arc::new(parser.parse(&file_path, &text));
                let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                match entries.get(&file_path) {
                    Some(existing) if **existing == *parsed => false,
                    _ => {
                        entries.insert(file_path.clone(), parsed);
                        true
                    }
                }
            }
        };

        debug!(cache = self.name, file = %file_path, %kind, changed, "rebuilt file");
        if changed {
            self.generation.send_modify(|g| *g += 1);
        }
        Ok(())
    }

    fn evict(&self, file_path: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file_path)
            .is_some()
    }
}

/// Incremental `file -> parse result` cache driven by a batch scheduler.
pub struct FileCache<T> {
    state: Arc<CacheState<T>>,
    scheduler: BatchScheduler<RebuildRequest>,
}

impl<T> FileCache<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    pub fn new(
        name: &'static str,
        parser: Arc<dyn FileParser<T>>,
        workspace: Arc<dyn Workspace>,
        interval: Duration,
    ) -> Self {
        let (generation, _) = watch::channel(0);
        let state = Arc::new(CacheState {
            name,
            entries: RwLock::new(BTreeMap::new()),
            generation,
        });

        let processor_state = Arc::clone(&state);
        let scheduler = BatchScheduler::new(name, interval, move |request: RebuildRequest| {
            let state = Arc::clone(&processor_state);
            let parser = Arc::clone(&parser);
            let workspace = Arc::clone(&workspace);
            async move { state.rebuild(request, parser.as_ref(), workspace.as_ref()) }
        })
        .with_strategy(SkipDuplicatesByKey::new(|request: &RebuildRequest| {
            request.file_path.clone()
        }));

        Self { state, scheduler }
    }

    /// Queue a rebuild. Never blocks on parsing.
    pub fn request(&self, request: RebuildRequest) {
        self.scheduler.push(request);
    }

    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Process everything queued so far, inline.
    pub async fn flush(&self) {
        while !self.scheduler.is_idle() && !self.scheduler.is_disposed() {
            if self.scheduler.run_cycle().await == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn dispose(&self) {
        self.scheduler.dispose();
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.state.generation.subscribe(),
        }
    }

    pub fn generation(&self) -> u64 {
        *self.state.generation.borrow()
    }

    pub fn get(&self, file_path: &str) -> Option<Arc<T>> {
        self.state
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_path)
            .cloned()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.state
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
