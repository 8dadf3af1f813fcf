//! Debounced, coalescing batch scheduler.
//!
//! Items are pushed without blocking and accumulate until the next cycle.
//! A cycle swaps out the whole pending list, runs it through the configured
//! [`Organize`] strategies (which may mark items skipped), then feeds the
//! survivors one at a time to an async processor.
//!
//! A failing item (error or panic) is logged and the cycle moves on.
//! Items pushed while a batch is being processed land in the next batch.
//! After [`BatchScheduler::dispose`] no further item starts processing.

use std::{
    collections::HashSet,
    future::Future,
    hash::Hash,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, error};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

type BoxFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type Processor<T> = Arc<dyn Fn(T) -> BoxFuture + Send + Sync>;

// ============================================================
// Organize strategies
// ============================================================

/// A pending item plus its skip flag while a batch is being organized.
#[derive(Debug)]
pub struct Slot<T> {
    pub item: T,
    pub skip: bool,
}

/// Reduces a batch before processing by marking items skipped.
pub trait Organize<T>: Send + Sync {
    fn organize(&self, slots: &mut [Slot<T>]);
}

/// Keep only the final item of a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastOnly;

impl<T> Organize<T> for LastOnly {
    fn organize(&self, slots: &mut [Slot<T>]) {
        let len = slots.len();
        for slot in slots.iter_mut().take(len.saturating_sub(1)) {
            slot.skip = true;
        }
    }
}

/// For items sharing a key keep only the latest one, preserving the
/// submission order of the survivors.
pub struct SkipDuplicatesByKey<F> {
    key_fn: F,
}

impl<F> SkipDuplicatesByKey<F> {
    pub fn new(key_fn: F) -> Self {
        Self { key_fn }
    }
}

impl<T, K, F> Organize<T> for SkipDuplicatesByKey<F>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Eq + Hash,
{
    fn organize(&self, slots: &mut [Slot<T>]) {
        let mut seen = HashSet::new();
        for slot in slots.iter_mut().rev() {
            if slot.skip {
                continue;
            }
            if !seen.insert((self.key_fn)(&slot.item)) {
                slot.skip = true;
            }
        }
    }
}

// ============================================================
// Scheduler
// ============================================================

struct Inner<T> {
    name: String,
    interval: Duration,
    pending: Mutex<Vec<T>>,
    strategies: Vec<Box<dyn Organize<T>>>,
    processor: Processor<T>,
    disposed: AtomicBool,
    busy: AtomicBool,
    started: AtomicBool,
    cycle: tokio::sync::Mutex<()>,
    shutdown: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> Inner<T> {
    fn push(&self, item: T) {
        if self.disposed.load(Ordering::SeqCst) {
            debug!(scheduler = %self.name, "push after dispose ignored");
            return;
        }
        lock(&self.pending).push(item);
    }

    async fn run_cycle(&self) -> usize {
        let _cycle = self.cycle.lock().await;
        if self.disposed.load(Ordering::SeqCst) {
            return 0;
        }

        self.busy.store(true, Ordering::SeqCst);
        let batch = std::mem::take(&mut *lock(&self.pending));
        if batch.is_empty() {
            self.busy.store(false, Ordering::SeqCst);
            return 0;
        }

        let mut slots: Vec<Slot<T>> = batch
            .into_iter()
            .map(|item| Slot { item, skip: false })
            .collect();
        for strategy in &self.strategies {
            strategy.organize(&mut slots);
        }
        let items: Vec<T> = slots
            .into_iter()
            .filter(|slot| !slot.skip)
            .map(|slot| slot.item)
            .collect();
        debug!(scheduler = %self.name, count = items.len(), "processing batch");

        let mut processed = 0;
        for item in items {
            if self.disposed.load(Ordering::SeqCst) {
                break;
            }
            // Each item runs as its own task so a panic is contained to it.
            match tokio::spawn((self.processor)(item)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(scheduler = %self.name, "batch item processing failed: {err:#}");
                }
                Err(err) => {
                    error!(scheduler = %self.name, "batch item processing panicked: {err}");
                }
            }
            processed += 1;
        }

        self.busy.store(false, Ordering::SeqCst);
        processed
    }
}

/// Cheap, cloneable handle that can only enqueue items.
pub struct Submitter<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Submitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Submitter<T> {
    pub fn push(&self, item: T) {
        self.inner.push(item);
    }
}

/// Periodic batch processor. See the module docs for the cycle semantics.
pub struct BatchScheduler<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> BatchScheduler<T> {
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, processor: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let processor: Processor<T> = Arc::new(move |item: T| -> BoxFuture { Box::pin(processor(item)) });
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                interval,
                pending: Mutex::new(Vec::new()),
                strategies: Vec::new(),
                processor,
                disposed: AtomicBool::new(false),
                busy: AtomicBool::new(false),
                started: AtomicBool::new(false),
                cycle: tokio::sync::Mutex::new(()),
                shutdown: Notify::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Append an organize strategy. Strategies run in the order added.
    ///
    /// Must be called before the scheduler is shared or started.
    pub fn with_strategy(mut self, strategy: impl Organize<T> + 'static) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.strategies.push(Box::new(strategy)),
            None => error!(scheduler = %self.inner.name, "strategy added to a shared scheduler was ignored"),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Enqueue an item for the next cycle. Never blocks on processing.
    pub fn push(&self, item: T) {
        self.inner.push(item);
    }

    pub fn submitter(&self) -> Submitter<T> {
        Submitter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Spawn the periodic cycle on the current tokio runtime.
    ///
    /// A second call is a no-op.
    pub fn start(&self) {
        if self.inner.disposed.load(Ordering::SeqCst)
            || self.inner.started.swap(true, Ordering::SeqCst)
        {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            loop {
                inner.run_cycle().await;
                if inner.disposed.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(inner.interval) => {}
                    _ = inner.shutdown.notified() => break,
                }
            }
            debug!(scheduler = %inner.name, "scheduler loop stopped");
        });
        *lock(&self.inner.task) = Some(handle);
    }

    /// Run a single cycle inline and return the number of items processed.
    pub async fn run_cycle(&self) -> usize {
        self.inner.run_cycle().await
    }

    /// No pending items and no batch in flight.
    pub fn is_idle(&self) -> bool {
        !self.inner.busy.load(Ordering::SeqCst) && lock(&self.inner.pending).is_empty()
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Stop the cycle and drop pending items. An item already being
    /// processed finishes; the next one never starts.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.inner.pending).clear();
        self.inner.shutdown.notify_one();
        // Detach: the loop observes the flag and exits on its own.
        drop(lock(&self.inner.task).take());
    }
}

impl<T> Drop for BatchScheduler<T> {
    fn drop(&mut self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.shutdown.notify_one();
    }
}
