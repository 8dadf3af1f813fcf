//! Workspace capability: enumerate, read and edit files.
//!
//! The engine never touches the file system directly. [`FsWorkspace`] is the
//! disk-backed implementation used by the CLI; [`MemoryWorkspace`] holds file
//! contents in memory for hosts that own their buffers and for tests.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::data::{EditSet, apply_text_edits};

pub trait Workspace: Send + Sync {
    /// Files under `dir` whose extension (without dot) is in `extensions`,
    /// sorted. A missing directory yields an empty list.
    fn find_files(&self, dir: &Path, extensions: &[&str]) -> Result<Vec<String>>;

    fn read_text(&self, file_path: &str) -> Result<String>;

    /// Apply every edit or none of them.
    fn apply_edits(&self, edits: &EditSet) -> Result<()>;
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

// ============================================================
// File system
// ============================================================

#[derive(Debug, Default)]
pub struct FsWorkspace {
    ignore_paths: Vec<PathBuf>,
    ignore_patterns: Vec<Pattern>,
}

impl FsWorkspace {
    /// Build a workspace rooted at `root`. Literal `ignores` are resolved
    /// against the root and matched by prefix; glob `ignores` match the full
    /// path.
    pub fn new(root: &Path, ignores: &[String]) -> Self {
        let mut workspace = Self::default();
        for ignore in ignores {
            if is_glob_pattern(ignore) {
                match Pattern::new(ignore) {
                    Ok(pattern) => workspace.ignore_patterns.push(pattern),
                    Err(err) => warn!(pattern = %ignore, "invalid ignore pattern: {err}"),
                }
            } else {
                workspace.ignore_paths.push(root.join(ignore));
            }
        }
        workspace
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_paths.iter().any(|p| path.starts_with(p))
            || self
                .ignore_patterns
                .iter()
                .any(|p| p.matches(&path.to_string_lossy()))
    }
}

impl Workspace for FsWorkspace {
    fn find_files(&self, dir: &Path, extensions: &[&str]) -> Result<Vec<String>> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry.path()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("cannot access path: {err}");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && has_extension(path, extensions) {
                files.push(path.to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_text(&self, file_path: &str) -> Result<String> {
        fs::read_to_string(file_path).with_context(|| format!("Failed to read file: {}", file_path))
    }

    fn apply_edits(&self, edits: &EditSet) -> Result<()> {
        // Compute every new text first so a bad edit writes nothing.
        let mut planned = Vec::with_capacity(edits.file_count());
        for (file, file_edits) in edits.files() {
            let original = self.read_text(file)?;
            let updated = apply_text_edits(&original, file_edits)
                .with_context(|| format!("Failed to apply edits to {}", file))?;
            planned.push((file, original, updated));
        }

        let mut written: Vec<(&str, &str)> = Vec::new();
        for (file, original, updated) in &planned {
            if let Err(err) = write_replacing(file, updated) {
                for (done, previous) in written.iter().rev() {
                    if let Err(restore_err) = write_replacing(done, previous) {
                        warn!(file = done, "failed to restore file after aborted edit: {restore_err:#}");
                    }
                }
                return Err(err);
            }
            written.push((*file, original.as_str()));
        }
        Ok(())
    }
}

/// Write through a sibling temporary file and rename over the target.
fn write_replacing(file_path: &str, content: &str) -> Result<()> {
    let target = Path::new(file_path);
    let mut tmp_name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".locsync-tmp");
    let tmp = target.with_file_name(tmp_name);

    fs::write(&tmp, content).with_context(|| format!("Failed to write file: {}", tmp.display()))?;
    fs::rename(&tmp, target).with_context(|| format!("Failed to replace file: {}", file_path))
}

// ============================================================
// In memory
// ============================================================

/// File contents held in memory, keyed by path.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    files: RwLock<BTreeMap<String, String>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file_path: impl Into<String>, text: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_path.into(), text.into());
    }

    pub fn remove(&self, file_path: &str) -> Option<String> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file_path)
    }

    pub fn get(&self, file_path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_path)
            .cloned()
    }
}

impl Workspace for MemoryWorkspace {
    fn find_files(&self, dir: &Path, extensions: &[&str]) -> Result<Vec<String>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files
            .keys()
            .filter(|path| {
                let path = Path::new(path.as_str());
                path.starts_with(dir) && has_extension(path, extensions)
            })
            .cloned()
            .collect())
    }

    fn read_text(&self, file_path: &str) -> Result<String> {
        match self.get(file_path) {
            Some(text) => Ok(text),
            None => bail!("No such file: {}", file_path),
        }
    }

    fn apply_edits(&self, edits: &EditSet) -> Result<()> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = Vec::with_capacity(edits.file_count());
        for (file, file_edits) in edits.files() {
            let Some(original) = files.get(file) else {
                bail!("No such file: {}", file);
            };
            let text = apply_text_edits(original, file_edits)
                .with_context(|| format!("Failed to apply edits to {}", file))?;
            updated.push((file.to_string(), text));
        }
        files.extend(updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::Range;
    use tempfile::TempDir;

    #[test]
    fn test_find_files_filters_extension_and_ignores() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("src/node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("src/vendor")).unwrap();
        fs::write(root.join("src/a.py"), "").unwrap();
        fs::write(root.join("src/nested/b.PY"), "").unwrap();
        fs::write(root.join("src/c.txt"), "").unwrap();
        fs::write(root.join("src/node_modules/pkg/d.py"), "").unwrap();
        fs::write(root.join("src/vendor/e.py"), "").unwrap();

        let ws = FsWorkspace::new(
            root,
            &["**/node_modules/**".to_string(), "src/vendor".to_string()],
        );
        let files = ws.find_files(&root.join("src"), &["py"]).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| Path::new(f).strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["src/a.py", "src/nested/b.PY"]);
    }

    #[test]
    fn test_find_files_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::default();
        assert!(ws.find_files(&dir.path().join("nope"), &["py"]).unwrap().is_empty());
    }

    #[test]
    fn test_fs_apply_edits_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.po");
        fs::write(&a, "_(\"old\")").unwrap();
        fs::write(&b, "msgid \"old\"").unwrap();
        let ws = FsWorkspace::default();

        let mut bad = EditSet::new();
        bad.push(a.to_string_lossy(), Range::from_coords(0, 3, 0, 6), "new");
        bad.push(b.to_string_lossy(), Range::from_coords(9, 0, 9, 1), "x");
        assert!(ws.apply_edits(&bad).is_err());
        assert_eq!(fs::read_to_string(&a).unwrap(), "_(\"old\")");

        let mut good = EditSet::new();
        good.push(a.to_string_lossy(), Range::from_coords(0, 3, 0, 6), "new");
        good.push(b.to_string_lossy(), Range::from_coords(0, 6, 0, 11), "\"new\"");
        ws.apply_edits(&good).unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "_(\"new\")");
        assert_eq!(fs::read_to_string(&b).unwrap(), "msgid \"new\"");
    }

    #[test]
    fn test_memory_workspace_roundtrip() {
        let ws = MemoryWorkspace::new();
        ws.insert("/p/src/a.py", "_(\"k\")");
        ws.insert("/p/locales/en.po", "");

        assert_eq!(
            ws.find_files(Path::new("/p/src"), &["py"]).unwrap(),
            vec!["/p/src/a.py".to_string()]
        );
        assert!(ws.read_text("/p/src/missing.py").is_err());

        let mut edits = EditSet::new();
        edits.push("/p/src/a.py", Range::from_coords(0, 3, 0, 4), "j");
        ws.apply_edits(&edits).unwrap();
        assert_eq!(ws.get("/p/src/a.py").as_deref(), Some("_(\"j\")"));
    }
}
