use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::cli::args::CommonArgs;
use crate::config::load_config;
use crate::core::{service::Service, workspace::FsWorkspace};

/// A loaded project: every target scanned and its caches built.
pub struct Project {
    pub root: PathBuf,
    pub service: Service,
}

pub fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

pub fn project_root(common: &CommonArgs) -> Result<PathBuf> {
    let root = match &common.source_root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    fs::canonicalize(&root)
        .with_context(|| format!("Failed to resolve project root: {}", root.display()))
}

/// Load settings, scan every target and wait for the caches to settle.
pub fn load_project(common: &CommonArgs, runtime: &Runtime) -> Result<Project> {
    let root = project_root(common)?;
    let loaded = load_config(&root)?;
    let settings = loaded.settings(&root);
    let workspace = FsWorkspace::new(loaded.base_dir(&root), &loaded.config.ignores);
    let service = Service::new(
        settings,
        &root,
        Arc::new(workspace),
        loaded.config.rebuild_interval(),
    );

    runtime.block_on(async {
        service.initial_scan();
        service.flush().await;
    });
    debug!(
        code_files = service.code_file_count(),
        catalog_files = service.catalog_file_count(),
        "project loaded"
    );

    Ok(Project { root, service })
}
