//! Target definitions: which code and catalog files belong together.

use std::{fmt, path::PathBuf, str::FromStr};

/// Source languages the call extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodeLanguage {
    JavaScript,
    TypeScript,
    Python,
    CSharp,
    Java,
}

impl CodeLanguage {
    pub const ALL: [CodeLanguage; 5] = [
        CodeLanguage::JavaScript,
        CodeLanguage::TypeScript,
        CodeLanguage::Python,
        CodeLanguage::CSharp,
        CodeLanguage::Java,
    ];

    /// Identifier used in settings files.
    pub fn id(self) -> &'static str {
        match self {
            CodeLanguage::JavaScript => "javascript",
            CodeLanguage::TypeScript => "typescript",
            CodeLanguage::Python => "python",
            CodeLanguage::CSharp => "csharp",
            CodeLanguage::Java => "java",
        }
    }

    /// File extensions (without dot) handled as this language.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            CodeLanguage::JavaScript => &["js", "jsx", "mjs", "cjs"],
            CodeLanguage::TypeScript => &["ts", "mts", "cts"],
            CodeLanguage::Python => &["py"],
            CodeLanguage::CSharp => &["cs"],
            CodeLanguage::Java => &["java"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn supported_ids() -> String {
        Self::ALL
            .iter()
            .map(|lang| lang.id())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CodeLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.id() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid code language '{}'. Supported languages are: {}",
                    s,
                    Self::supported_ids()
                )
            })
    }
}

/// Catalog file formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CatalogFormat {
    #[default]
    Po,
}

impl CatalogFormat {
    pub fn id(self) -> &'static str {
        match self {
            CatalogFormat::Po => "po",
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self {
            CatalogFormat::Po => ".po",
        }
    }
}

impl FromStr for CatalogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "po" => Ok(CatalogFormat::Po),
            other => Err(format!("Unsupported localization format '{}'", other)),
        }
    }
}

/// One independent configuration unit: a set of code directories, catalog
/// directories and localization function names checked against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub code_languages: Vec<CodeLanguage>,
    pub code_dirs: Vec<PathBuf>,
    pub catalog_format: CatalogFormat,
    pub catalog_dirs: Vec<PathBuf>,
    /// Catalog file extension including the leading dot.
    pub catalog_extension: String,
    pub function_names: Vec<String>,
    /// Settings file this target was declared in, if any.
    pub settings_location: Option<PathBuf>,
}

impl Target {
    /// Extensions (without dot) of every code file this target scans.
    pub fn code_extensions(&self) -> Vec<&'static str> {
        self.code_languages
            .iter()
            .flat_map(|lang| lang.extensions().iter().copied())
            .collect()
    }

    pub fn catalog_extension_bare(&self) -> &str {
        self.catalog_extension.trim_start_matches('.')
    }

    /// Language of a code file of this target, by its extension.
    pub fn code_language_of(&self, file_path: &str) -> Option<CodeLanguage> {
        let ext = extension_of(file_path)?;
        CodeLanguage::from_extension(ext).filter(|lang| self.code_languages.contains(lang))
    }

    /// Extension match ignores ASCII case, as directory scans do.
    pub fn is_catalog_file(&self, file_path: &str) -> bool {
        extension_of(file_path)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.catalog_extension_bare()))
            && self
                .catalog_dirs
                .iter()
                .any(|dir| is_under(file_path, dir))
    }

    pub fn is_code_file(&self, file_path: &str) -> bool {
        self.code_language_of(file_path).is_some()
            && self.code_dirs.iter().any(|dir| is_under(file_path, dir))
    }
}

fn extension_of(file_path: &str) -> Option<&str> {
    let name = file_path.rsplit(['/', '\\']).next()?;
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn is_under(file_path: &str, dir: &std::path::Path) -> bool {
    std::path::Path::new(file_path).starts_with(dir)
}
