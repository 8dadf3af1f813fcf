//! Grammar loading capability.
//!
//! The extractor asks a [`GrammarProvider`] for a compiled grammar per
//! language. [`BundledGrammars`] serves the grammars linked into the binary.

use thiserror::Error;

use crate::core::data::CodeLanguage;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("no grammar available for {0}")]
    Unavailable(CodeLanguage),
    #[error("grammar for {language} is incompatible with the parser: {message}")]
    Incompatible {
        language: CodeLanguage,
        message: String,
    },
    #[error("call query for {language} failed to compile: {message}")]
    Query {
        language: CodeLanguage,
        message: String,
    },
}

pub trait GrammarProvider: Send + Sync {
    fn load(&self, language: CodeLanguage) -> Result<tree_sitter::Language, GrammarError>;
}

/// Grammars statically linked from the `tree-sitter-*` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledGrammars;

impl GrammarProvider for BundledGrammars {
    fn load(&self, language: CodeLanguage) -> Result<tree_sitter::Language, GrammarError> {
        Ok(match language {
            CodeLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            CodeLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            CodeLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            CodeLanguage::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            CodeLanguage::Java => tree_sitter_java::LANGUAGE.into(),
        })
    }
}
