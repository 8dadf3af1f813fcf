use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::data::{CatalogFormat, CodeLanguage, Target};

pub const CONFIG_FILE_NAME: &str = ".locsyncrc.json";

pub const DEFAULT_REBUILD_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_rebuild_interval_ms")]
    pub rebuild_interval_ms: u64,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// A target as written in the config file, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    #[serde(default)]
    pub code_languages: Vec<String>,
    #[serde(default)]
    pub code_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l10n_format: Option<String>,
    #[serde(default)]
    pub l10n_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l10n_extension: Option<String>,
    #[serde(default)]
    pub l10n_func_names: Vec<String>,
}

fn default_rebuild_interval_ms() -> u64 {
    DEFAULT_REBUILD_INTERVAL_MS
}

fn default_target() -> TargetConfig {
    TargetConfig {
        code_languages: vec!["python".to_string()],
        code_dirs: vec!["src".to_string()],
        l10n_format: Some("po".to_string()),
        l10n_dirs: vec!["locales".to_string()],
        l10n_extension: Some(".po".to_string()),
        l10n_func_names: vec!["_".to_string(), "gettext".to_string()],
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            rebuild_interval_ms: default_rebuild_interval_ms(),
            targets: vec![default_target()],
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `ignores` is invalid or the
    /// rebuild interval is zero. Target problems are reported by
    /// [`Config::normalize`] instead.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern)
                    .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
            }
        }
        if self.rebuild_interval_ms == 0 {
            bail!("'rebuildIntervalMs' must be greater than 0");
        }
        Ok(())
    }

    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_millis(self.rebuild_interval_ms)
    }

    /// Turn raw targets into [`Target`]s, collecting a message for every
    /// problem found. Relative directories resolve against `base_dir`.
    ///
    /// Incomplete targets are dropped; other problems keep the target with
    /// the offending value removed or defaulted.
    pub fn normalize(&self, base_dir: &Path, settings_file: Option<&Path>) -> Settings {
        let mut settings = Settings {
            targets: Vec::new(),
            messages: Vec::new(),
            settings_file: settings_file.map(Path::to_path_buf),
        };
        if self.targets.is_empty() {
            settings
                .messages
                .push("No targets defined. Please define at least one target.".to_string());
            return settings;
        }

        for (i, raw) in self.targets.iter().enumerate() {
            let prefix = format!("targets[{}]", i);
            match normalize_target(raw, base_dir, &prefix, &mut settings.messages) {
                Some(mut target) => {
                    target.settings_location = settings.settings_file.clone();
                    settings.targets.push(target);
                }
                None => debug!(target = i, "skipping incomplete target"),
            }
        }
        settings
    }
}

/// Normalized settings: usable targets plus messages about what was wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub targets: Vec<Target>,
    pub messages: Vec<String>,
    /// The file the settings came from, if any.
    pub settings_file: Option<PathBuf>,
}

fn normalize_target(
    raw: &TargetConfig,
    base_dir: &Path,
    prefix: &str,
    messages: &mut Vec<String>,
) -> Option<Target> {
    if raw.code_languages.is_empty()
        || raw.code_dirs.is_empty()
        || raw.l10n_dirs.is_empty()
        || raw.l10n_func_names.is_empty()
    {
        messages.push(format!(
            "{}: Incomplete target definition. Please ensure codeLanguages, codeDirs, l10nDirs, and l10nFuncNames are all specified.",
            prefix
        ));
        return None;
    }

    let mut code_languages = Vec::new();
    for name in &raw.code_languages {
        match name.parse::<CodeLanguage>() {
            Ok(lang) if !code_languages.contains(&lang) => code_languages.push(lang),
            Ok(_) => {}
            Err(err) => messages.push(format!("{}: {}.", prefix, err)),
        }
    }

    let code_dirs = normalize_dirs(&raw.code_dirs, base_dir, |dir| {
        messages.push(format!("{}: Code directory '{}' does not exist.", prefix, dir));
    });
    let catalog_dirs = normalize_dirs(&raw.l10n_dirs, base_dir, |dir| {
        messages.push(format!(
            "{}: Localization directory '{}' does not exist.",
            prefix, dir
        ));
    });

    let mut function_names: Vec<String> = Vec::new();
    for name in &raw.l10n_func_names {
        let trimmed = name.trim();
        if !trimmed.is_empty() && !function_names.iter().any(|f| f == trimmed) {
            function_names.push(trimmed.to_string());
        }
    }

    let catalog_format = match raw.l10n_format.as_deref().map(str::parse::<CatalogFormat>) {
        Some(Ok(format)) => format,
        _ => {
            messages.push(format!(
                "{}: Invalid or missing l10nFormat. Defaulting to 'po'. Supported formats are: 'po'.",
                prefix
            ));
            CatalogFormat::Po
        }
    };

    let catalog_extension = match raw.l10n_extension.as_deref().map(str::trim) {
        Some(ext) if !ext.is_empty() => {
            if ext.contains('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            }
        }
        _ => {
            messages.push(format!(
                "{}: Invalid or missing l10nExtension. Defaulting to '.po'.",
                prefix
            ));
            catalog_format.default_extension().to_string()
        }
    };

    Some(Target {
        code_languages,
        code_dirs,
        catalog_format,
        catalog_dirs,
        catalog_extension,
        function_names,
        settings_location: None,
    })
}

/// Resolve directories against `base_dir`, dropping duplicates and
/// reporting the ones that do not exist.
fn normalize_dirs(dirs: &[String], base_dir: &Path, mut missing: impl FnMut(&str)) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        // `components()` drops interior `.` segments.
        let path: PathBuf = base_dir.join(dir).components().collect();
        if !path.is_dir() {
            missing(dir);
        } else if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Config file path, or `None` when using defaults.
    pub path: Option<PathBuf>,
}

impl ConfigLoadResult {
    pub fn from_file(&self) -> bool {
        self.path.is_some()
    }

    /// Directory relative target paths resolve against.
    pub fn base_dir<'a>(&'a self, start_dir: &'a Path) -> &'a Path {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(start_dir)
    }

    pub fn settings(&self, start_dir: &Path) -> Settings {
        let settings = self
            .config
            .normalize(self.base_dir(start_dir), self.path.as_deref());
        for message in &settings.messages {
            debug!("settings: {}", message);
        }
        settings
    }
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            debug!(path = %path.display(), "loaded config");
            Ok(ConfigLoadResult {
                config,
                path: Some(path),
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
        }),
    }
}
