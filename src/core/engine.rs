//! Per-target engine.
//!
//! A [`TargetEngine`] owns one target's catalog cache and source cache, and
//! answers queries from their current snapshots. Nothing is shared between
//! engines; a host running several targets keeps several engines.
//!
//! Hosts that keep the engine running call [`TargetEngine::start`] and either
//! poll through [`TargetEngine::subscribe`] or hand a sink to
//! [`TargetEngine::publish_diagnostics`], which recomputes diagnostics once
//! per burst of rebuilds.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{
    cache::{CatalogCache, ChangeKind, RebuildRequest, SourceCache, Subscription},
    data::{CodeCallSite, EditSet, Location, Position, Target},
    extract::CallExtractor,
    matching::match_diagnostics,
    rename::{RenameError, plan_rename},
    scheduler::{BatchScheduler, LastOnly},
    workspace::Workspace,
};
use crate::issues::{FileDiagnostics, merge_file_diagnostics};

/// A file change reported by the host.
pub type FileEvent = RebuildRequest;

/// One translation of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub translation: String,
    pub location: Location,
}

/// Wakes when either cache of an engine changed.
pub struct EngineSubscription {
    catalogs: Subscription,
    sources: Subscription,
}

impl EngineSubscription {
    /// Returns `false` once the engine is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            changed = self.catalogs.changed() => changed,
            changed = self.sources.changed() => changed,
        }
    }
}

/// Pushes fresh diagnostics to a sink after the caches change. Several
/// rebuilds within one interval are published once. Dropping it stops
/// publishing.
pub struct DiagnosticsPublisher {
    scheduler: BatchScheduler<()>,
    forward: JoinHandle<()>,
}

impl DiagnosticsPublisher {
    pub fn dispose(&self) {
        self.forward.abort();
        self.scheduler.dispose();
    }
}

impl Drop for DiagnosticsPublisher {
    fn drop(&mut self) {
        self.dispose();
    }
}

pub struct TargetEngine {
    target: Target,
    workspace: Arc<dyn Workspace>,
    catalogs: Arc<CatalogCache>,
    sources: Arc<SourceCache>,
}

impl TargetEngine {
    pub fn new(
        target: Target,
        workspace: Arc<dyn Workspace>,
        extractor: Arc<CallExtractor>,
        interval: Duration,
    ) -> Self {
        let catalogs =
            CatalogCache::for_format(target.catalog_format, Arc::clone(&workspace), interval);
        let sources = SourceCache::for_target(&target, extractor, Arc::clone(&workspace), interval);
        Self {
            target,
            workspace,
            catalogs: Arc::new(catalogs),
            sources: Arc::new(sources),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Start both caches' background rebuild loops.
    pub fn start(&self) {
        self.catalogs.start();
        self.sources.start();
    }

    /// Route a file event to the cache owning that file. Returns `false` for
    /// files outside this target.
    pub fn handle_event(&self, event: FileEvent) -> bool {
        if self.target.is_catalog_file(&event.file_path) {
            self.catalogs.request(event);
            true
        } else if self.target.is_code_file(&event.file_path) {
            self.sources.request(event);
            true
        } else {
            false
        }
    }

    /// Enumerate every code and catalog file of the target and queue them.
    /// Returns the number of files queued.
    pub fn initial_scan(&self) -> Result<usize> {
        let mut files = Vec::new();
        let code_extensions = self.target.code_extensions();
        for dir in &self.target.code_dirs {
            files.extend(
                self.workspace
                    .find_files(dir, &code_extensions)
                    .with_context(|| format!("Failed to scan code directory {}", dir.display()))?,
            );
        }
        let catalog_extension = [self.target.catalog_extension_bare()];
        for dir in &self.target.catalog_dirs {
            files.extend(
                self.workspace
                    .find_files(dir, &catalog_extension)
                    .with_context(|| {
                        format!("Failed to scan catalog directory {}", dir.display())
                    })?,
            );
        }
        files.sort();
        files.dedup();

        let workspace = &self.workspace;
        let loaded: Vec<(String, String)> = files
            .into_par_iter()
            .filter_map(|file| match workspace.read_text(&file) {
                Ok(text) => Some((file, text)),
                Err(err) => {
                    warn!("{err:#}");
                    None
                }
            })
            .collect();

        let mut queued = 0;
        for (file, text) in loaded {
            if self.handle_event(FileEvent::new(file, ChangeKind::Created, Some(text))) {
                queued += 1;
            }
        }
        info!(queued, "initial scan complete");
        Ok(queued)
    }

    /// Process every queued rebuild now.
    pub async fn flush(&self) {
        self.catalogs.flush().await;
        self.sources.flush().await;
    }

    pub fn is_idle(&self) -> bool {
        self.catalogs.is_idle() && self.sources.is_idle()
    }

    pub fn dispose(&self) {
        self.catalogs.dispose();
        self.sources.dispose();
    }

    pub fn code_file_count(&self) -> usize {
        self.sources.len()
    }

    pub fn catalog_file_count(&self) -> usize {
        self.catalogs.len()
    }

    pub fn subscribe(&self) -> EngineSubscription {
        EngineSubscription {
            catalogs: self.catalogs.subscribe(),
            sources: self.sources.subscribe(),
        }
    }

    /// Recompute diagnostics after every burst of rebuilds and hand them to
    /// `publish`. Must be called inside a tokio runtime.
    pub fn publish_diagnostics<F>(&self, interval: Duration, publish: F) -> DiagnosticsPublisher
    where
        F: Fn(FileDiagnostics) + Send + Sync + 'static,
    {
        let catalogs = Arc::clone(&self.catalogs);
        let sources = Arc::clone(&self.sources);
        let publish = Arc::new(publish);
        let scheduler = BatchScheduler::new("diagnostics", interval, move |()| {
            let catalogs = Arc::clone(&catalogs);
            let sources = Arc::clone(&sources);
            let publish = Arc::clone(&publish);
            async move {
                (*publish)(collect_diagnostics(&catalogs, &sources));
                Ok(())
            }
        })
        .with_strategy(LastOnly);

        let submitter = scheduler.submitter();
        let mut subscription = self.subscribe();
        let forward = tokio::spawn(async move {
            while subscription.changed().await {
                submitter.push(());
            }
        });
        scheduler.start();

        DiagnosticsPublisher { scheduler, forward }
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Catalog parse diagnostics merged with matching diagnostics.
    pub fn diagnostics(&self) -> FileDiagnostics {
        collect_diagnostics(&self.catalogs, &self.sources)
    }

    /// Key whose call site or catalog entry covers `position` in `file_path`.
    pub fn key_at(&self, file_path: &str, position: Position) -> Option<String> {
        if let Some(sites) = self.sources.get(file_path) {
            return sites
                .iter()
                .find(|site| site.location.range.contains_inclusive(position))
                .map(|site| site.key.clone());
        }
        let parsed = self.catalogs.get(file_path)?;
        parsed
            .iter_entries()
            .find(|(_, _, entry)| entry.location.range.contains_inclusive(position))
            .map(|(_, key, _)| key.to_string())
    }

    /// Where `key` is defined across the target's catalogs.
    pub fn catalog_locations(&self, key: &str) -> Vec<Location> {
        let mut locations: Vec<Location> = self
            .catalogs
            .snapshot()
            .values()
            .flat_map(|parsed| {
                parsed
                    .entries
                    .values()
                    .filter_map(|entries| entries.get(key))
                    .map(|entry| entry.location.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        locations.sort();
        locations
    }

    /// Where `key` is used across the target's code.
    pub fn code_locations(&self, key: &str) -> Vec<Location> {
        self.code_sites(key)
            .into_iter()
            .map(|site| site.location)
            .collect()
    }

    pub fn code_sites(&self, key: &str) -> Vec<CodeCallSite> {
        let mut sites: Vec<CodeCallSite> = self
            .sources
            .snapshot()
            .values()
            .flat_map(|sites| sites.iter().filter(|site| site.key == key).cloned().collect::<Vec<_>>())
            .collect();
        sites.sort_by(|a, b| a.location.cmp(&b.location));
        sites
    }

    pub fn translations(&self, key: &str) -> Vec<Translation> {
        let mut translations: Vec<Translation> = self
            .catalogs
            .snapshot()
            .values()
            .flat_map(|parsed| {
                parsed
                    .iter_entries()
                    .filter(|(_, k, _)| *k == key)
                    .map(|(language, _, entry)| Translation {
                        language: language.to_string(),
                        translation: entry.translation.clone(),
                        location: entry.location.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        translations.sort_by(|a, b| {
            a.language
                .cmp(&b.language)
                .then_with(|| a.location.cmp(&b.location))
        });
        translations
    }

    /// Every catalog key of the target.
    pub fn keys(&self) -> BTreeSet<String> {
        self.catalogs
            .snapshot()
            .values()
            .flat_map(|parsed| {
                parsed
                    .iter_entries()
                    .map(|(_, key, _)| key.to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    // ============================================================
    // Rename
    // ============================================================

    pub fn plan_rename(&self, old: &str, new: &str) -> Result<EditSet, RenameError> {
        plan_rename(
            old,
            new,
            &self.code_sites(old),
            &self.catalog_locations(old),
            &self.keys(),
        )
    }

    /// Plan and apply a rename, then queue the edited files for rebuild.
    pub fn rename(&self, old: &str, new: &str) -> Result<EditSet> {
        let edits = self.plan_rename(old, new)?;
        self.apply(&edits)?;
        Ok(edits)
    }

    /// Apply edits through the workspace and refresh the edited files.
    pub fn apply(&self, edits: &EditSet) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        self.workspace.apply_edits(edits)?;
        for (file, _) in edits.files() {
            self.handle_event(FileEvent::new(file, ChangeKind::Changed, None));
        }
        debug!(files = edits.file_count(), edits = edits.len(), "applied edits");
        Ok(())
    }
}

fn collect_diagnostics(catalogs: &CatalogCache, sources: &SourceCache) -> FileDiagnostics {
    let catalogs = catalogs.snapshot();
    let sources = sources.snapshot();

    let mut out = FileDiagnostics::new();
    for (file, parsed) in &catalogs {
        if !parsed.diagnostics.is_empty() {
            out.insert(file.clone(), parsed.diagnostics.clone());
        }
    }
    merge_file_diagnostics(&mut out, match_diagnostics(&catalogs, &sources));
    out
}

impl Drop for TargetEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
