//! All targets of one workspace behind a single entry point.
//!
//! The service owns one [`TargetEngine`] per configured target, keeps the
//! settings messages produced while loading them, and fans queries and
//! events out to the engines. Rename is checked and planned across every
//! target so a key shared by two targets is renamed everywhere or nowhere.

use std::{collections::BTreeSet, path::Path, sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{CONFIG_FILE_NAME, Settings};
use crate::core::{
    cache::ChangeKind,
    data::{CodeCallSite, EditSet, Location, Position, Range},
    engine::{FileEvent, TargetEngine},
    extract::CallExtractor,
    rename::{RenameError, plan_rename},
    workspace::Workspace,
};
use crate::issues::{Diagnostic, FileDiagnostics, Rule, merge_file_diagnostics};

pub struct Service {
    engines: Vec<TargetEngine>,
    settings_diagnostics: FileDiagnostics,
    workspace: Arc<dyn Workspace>,
}

impl Service {
    /// Build one engine per target. `root` names the settings file when the
    /// settings did not come from one.
    pub fn new(
        settings: Settings,
        root: &Path,
        workspace: Arc<dyn Workspace>,
        interval: Duration,
    ) -> Self {
        let extractor = Arc::new(CallExtractor::default());
        let settings_file = settings
            .settings_file
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));

        let mut settings_diagnostics = FileDiagnostics::new();
        if !settings.messages.is_empty() {
            settings_diagnostics.insert(
                settings_file.to_string_lossy().into_owned(),
                settings
                    .messages
                    .into_iter()
                    .map(|message| {
                        Diagnostic::warning(Range::document_start(), message, Rule::Settings)
                    })
                    .collect(),
            );
        }

        let engines = settings
            .targets
            .into_iter()
            .map(|target| {
                TargetEngine::new(
                    target,
                    Arc::clone(&workspace),
                    Arc::clone(&extractor),
                    interval,
                )
            })
            .collect();

        Self {
            engines,
            settings_diagnostics,
            workspace,
        }
    }

    pub fn engines(&self) -> &[TargetEngine] {
        &self.engines
    }

    pub fn code_file_count(&self) -> usize {
        self.engines.iter().map(TargetEngine::code_file_count).sum()
    }

    pub fn catalog_file_count(&self) -> usize {
        self.engines.iter().map(TargetEngine::catalog_file_count).sum()
    }

    pub fn start(&self) {
        for engine in &self.engines {
            engine.start();
        }
    }

    /// Scan every target. A target that fails to scan is logged and skipped.
    pub fn initial_scan(&self) -> usize {
        let mut queued = 0;
        for (i, engine) in self.engines.iter().enumerate() {
            match engine.initial_scan() {
                Ok(count) => queued += count,
                Err(err) => warn!(target = i, "initial scan failed: {err:#}"),
            }
        }
        info!(targets = self.engines.len(), queued, "scanned workspace");
        queued
    }

    /// Offer an event to every target. Returns whether any target took it.
    pub fn handle_event(&self, event: FileEvent) -> bool {
        let mut handled = false;
        for engine in &self.engines {
            handled |= engine.handle_event(event.clone());
        }
        handled
    }

    pub async fn flush(&self) {
        for engine in &self.engines {
            engine.flush().await;
        }
    }

    pub fn dispose(&self) {
        for engine in &self.engines {
            engine.dispose();
        }
    }

    /// Settings, parse and matching diagnostics of every target, per file.
    pub fn diagnostics(&self) -> FileDiagnostics {
        let mut out = self.settings_diagnostics.clone();
        for engine in &self.engines {
            merge_file_diagnostics(&mut out, engine.diagnostics());
        }
        for diagnostics in out.values_mut() {
            diagnostics.dedup();
        }
        out
    }

    pub fn key_at(&self, file_path: &str, position: Position) -> Option<String> {
        self.engines
            .iter()
            .find_map(|engine| engine.key_at(file_path, position))
    }

    pub fn catalog_locations(&self, key: &str) -> Vec<Location> {
        let mut locations: Vec<Location> = self
            .engines
            .iter()
            .flat_map(|engine| engine.catalog_locations(key))
            .collect();
        locations.sort();
        locations.dedup();
        locations
    }

    pub fn code_locations(&self, key: &str) -> Vec<Location> {
        let mut locations: Vec<Location> = self
            .engines
            .iter()
            .flat_map(|engine| engine.code_locations(key))
            .collect();
        locations.sort();
        locations.dedup();
        locations
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.engines.iter().flat_map(|engine| engine.keys()).collect()
    }

    /// Plan a rename over every target, conflict-checked against all of them.
    pub fn plan_rename(&self, old: &str, new: &str) -> Result<EditSet, RenameError> {
        let mut sites: Vec<CodeCallSite> = Vec::new();
        for engine in &self.engines {
            for site in engine.code_sites(old) {
                if !sites.contains(&site) {
                    sites.push(site);
                }
            }
        }
        plan_rename(
            old,
            new,
            &sites,
            &self.catalog_locations(old),
            &self.keys(),
        )
    }

    /// Plan and apply a rename, then refresh the edited files.
    pub fn rename(&self, old: &str, new: &str) -> Result<EditSet> {
        let edits = self.plan_rename(old, new)?;
        if !edits.is_empty() {
            self.workspace.apply_edits(&edits)?;
            for (file, _) in edits.files() {
                self.handle_event(FileEvent::new(file, ChangeKind::Changed, None));
            }
        }
        Ok(edits)
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        data::{CatalogFormat, CodeLanguage, Target},
        scheduler::DEFAULT_INTERVAL,
        workspace::MemoryWorkspace,
    };
    use crate::issues::Severity;

    fn target(code_dir: &str, catalog_dir: &str) -> Target {
        Target {
            code_languages: vec![CodeLanguage::Python, CodeLanguage::JavaScript],
            code_dirs: vec![code_dir.into()],
            catalog_format: CatalogFormat::Po,
            catalog_dirs: vec![catalog_dir.into()],
            catalog_extension: ".po".to_string(),
            function_names: vec!["_".to_string()],
            settings_location: None,
        }
    }

    async fn service(messages: Vec<String>) -> (Service, Arc<MemoryWorkspace>) {
        let workspace = Arc::new(MemoryWorkspace::new());
        workspace.insert("/p/api/app.py", "_(\"hello\")\n");
        workspace.insert("/p/api/locales/en.po", "msgid \"hello\"\nmsgstr \"Hello\"\n");
        workspace.insert("/p/web/app.js", "_('hello');\n_('bye');\n");
        workspace.insert("/p/web/locales/en.po", "msgid \"hello\"\nmsgstr \"Hi\"\n");

        let settings = Settings {
            targets: vec![
                target("/p/api", "/p/api/locales"),
                target("/p/web", "/p/web/locales"),
            ],
            messages,
            settings_file: None,
        };
        let service = Service::new(settings, Path::new("/p"), workspace.clone(), DEFAULT_INTERVAL);
        service.initial_scan();
        service.flush().await;
        (service, workspace)
    }

    #[tokio::test]
    async fn test_diagnostics_merge_targets_and_settings() {
        let (service, _) = service(vec!["targets[2]: Incomplete target definition.".into()]).await;
        let diagnostics = service.diagnostics();

        let settings = &diagnostics["/p/.locsyncrc.json"];
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].rule, Rule::Settings);
        assert_eq!(settings[0].severity, Severity::Warning);

        let web = &diagnostics["/p/web/app.js"];
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].message, "undefined localization key 'bye' used in code");
        assert!(!diagnostics.contains_key("/p/api/app.py"));
    }

    #[tokio::test]
    async fn test_rename_spans_targets() {
        let (service, workspace) = service(Vec::new()).await;

        assert!(matches!(
            service.plan_rename("hello", "hello2"),
            Ok(ref edits) if edits.file_count() == 4
        ));

        service.rename("hello", "greeting").unwrap();
        assert_eq!(workspace.get("/p/api/app.py").as_deref(), Some("_(\"greeting\")\n"));
        assert_eq!(
            workspace.get("/p/web/app.js").as_deref(),
            Some("_('greeting');\n_('bye');\n")
        );
        assert_eq!(
            workspace.get("/p/web/locales/en.po").as_deref(),
            Some("msgid \"greeting\"\nmsgstr \"Hi\"\n")
        );

        service.flush().await;
        assert_eq!(service.code_locations("greeting").len(), 2);
        assert_eq!(service.catalog_locations("greeting").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_service_picks_up_events() {
        let (service, workspace) = service(Vec::new()).await;
        service.start();

        workspace.insert("/p/api/app.py", "_(\"hello\")\n_(\"gone\")\n");
        assert!(service.handle_event(FileEvent::new(
            "/p/api/app.py",
            ChangeKind::Changed,
            None
        )));
        tokio::time::sleep(DEFAULT_INTERVAL * 2).await;

        let diagnostics = service.diagnostics();
        assert_eq!(
            diagnostics["/p/api/app.py"][0].message,
            "undefined localization key 'gone' used in code"
        );
    }

    #[tokio::test]
    async fn test_rename_conflict_in_other_target() {
        let (service, workspace) = service(Vec::new()).await;
        workspace.insert("/p/web/locales/ja.po", "msgid \"taken\"\nmsgstr \"x\"\n");
        service.handle_event(FileEvent::new(
            "/p/web/locales/ja.po",
            ChangeKind::Created,
            None,
        ));
        service.flush().await;

        let err = service.plan_rename("hello", "taken").unwrap_err();
        assert!(matches!(err, RenameError::Conflict { .. }));
    }
}
