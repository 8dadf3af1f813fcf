//! Source call extraction.
//!
//! Finds localization calls such as `_("key")`, `i18n.t('key')` or
//! `Loc.T(@"key")` with a grammar-aware parse. A per-language tree-sitter
//! query matches every call together with its callee and first argument;
//! the rules below then decide which matches are real call sites:
//!
//! - the callee must be a bare name or a member access ending in one of the
//!   configured function names. Subscript access (`obj['t']("x")`) is rejected.
//! - the first argument must be a single static string literal. Template
//!   strings with substitutions, Python f-strings, C# interpolated strings and
//!   concatenations are rejected.
//!
//! Any failure (grammar unavailable, query error, no tree) yields no call
//! sites for that file and is logged.
//!
//! ## Module Structure
//!
//! - `grammar`: GrammarProvider capability and the bundled grammars
//! - `literal`: literal splitting, unescaping and re-escaping

pub mod grammar;
pub mod literal;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use streaming_iterator::StreamingIterator;
use tracing::warn;
use tree_sitter::{Node, Parser, Query, QueryCursor};

pub use grammar::{BundledGrammars, GrammarError, GrammarProvider};
use literal::{DelimiterRules, parse_literal};

use crate::core::data::{CodeCallSite, CodeLanguage, LineIndex, Location};

// ============================================================
// Language rules
// ============================================================

const JS_QUERY: &str = r#"
(call_expression
  function: (_) @callee
  arguments: (arguments . (_) @key)) @call
"#;

const PYTHON_QUERY: &str = r#"
(call
  function: (_) @callee
  arguments: (argument_list . (_) @key)) @call
"#;

const CSHARP_QUERY: &str = r#"
(invocation_expression
  function: (_) @callee
  arguments: (argument_list . (argument . (_) @key))) @call
"#;

const JAVA_QUERY: &str = r#"
(method_invocation
  name: (identifier) @callee
  arguments: (argument_list . (_) @key)) @call
"#;

fn query_source(language: CodeLanguage) -> &'static str {
    match language {
        CodeLanguage::JavaScript | CodeLanguage::TypeScript => JS_QUERY,
        CodeLanguage::Python => PYTHON_QUERY,
        CodeLanguage::CSharp => CSHARP_QUERY,
        CodeLanguage::Java => JAVA_QUERY,
    }
}

enum Callee<'t> {
    Name(&'t str),
    Computed,
    Unsupported,
}

fn node_text<'t>(node: Node<'_>, source: &'t str) -> &'t str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn classify_callee<'t>(node: Node<'_>, source: &'t str) -> Callee<'t> {
    let named = |field: &str| {
        node.child_by_field_name(field)
            .map_or(Callee::Unsupported, |n| classify_callee(n, source))
    };
    match node.kind() {
        "identifier" => Callee::Name(node_text(node, source)),
        "member_expression" => named("property"),
        "property_identifier" | "private_property_identifier" => {
            Callee::Name(node_text(node, source))
        }
        "attribute" => named("attribute"),
        "member_access_expression" => named("name"),
        "generic_name" => node
            .named_child(0)
            .map_or(Callee::Unsupported, |n| classify_callee(n, source)),
        kind if SUBSCRIPT_KINDS.contains(&kind) => Callee::Computed,
        _ => Callee::Unsupported,
    }
}

const SUBSCRIPT_KINDS: &[&str] = &[
    "subscript_expression",
    "subscript",
    "element_access_expression",
    "array_access",
];

/// The receiver a call or member access is made on.
fn receiver_of(node: Node<'_>) -> Option<Node<'_>> {
    let field = match node.kind() {
        "member_expression" | "attribute" | "field_access" | "method_invocation" => "object",
        "member_access_expression" => "expression",
        "call_expression" | "call" | "invocation_expression" => "function",
        "parenthesized_expression" | "non_null_expression" => {
            return node.named_child(0);
        }
        _ => return None,
    };
    node.child_by_field_name(field)
}

/// Whether any link of the receiver chain of `call` is a bracket access,
/// as in `a['b'].t("x")` or `items[0]._("x")`.
fn reached_through_subscript(call: Node<'_>) -> bool {
    let mut current = receiver_of(call);
    while let Some(node) = current {
        if SUBSCRIPT_KINDS.contains(&node.kind()) {
            return true;
        }
        current = receiver_of(node);
    }
    false
}

/// Decide whether the first argument is an acceptable static literal, and
/// with which delimiter rules it should be split.
fn literal_rules(language: CodeLanguage, node: Node<'_>, source: &str) -> Option<DelimiterRules> {
    let has_child = |kind: &str| {
        let mut cursor = node.walk();
        node.named_children(&mut cursor).any(|c| c.kind() == kind)
    };
    match (language, node.kind()) {
        (CodeLanguage::JavaScript | CodeLanguage::TypeScript, "string") => {
            Some(DelimiterRules::default())
        }
        (CodeLanguage::JavaScript | CodeLanguage::TypeScript, "template_string") => {
            (!has_child("template_substitution")).then(DelimiterRules::default)
        }
        (CodeLanguage::Python, "string") => {
            let text = node_text(node, source);
            let prefix = &text[..text.find(['"', '\'']).unwrap_or(0)];
            let interpolated = prefix.contains(['f', 'F']) || has_child("interpolation");
            (!interpolated).then_some(DelimiterRules {
                triple_quotes: true,
                raw_runs: false,
            })
        }
        (CodeLanguage::CSharp, "string_literal" | "verbatim_string_literal") => {
            Some(DelimiterRules::default())
        }
        (CodeLanguage::CSharp, "raw_string_literal") => Some(DelimiterRules {
            triple_quotes: false,
            raw_runs: true,
        }),
        (CodeLanguage::Java, "string_literal") => Some(DelimiterRules {
            triple_quotes: true,
            raw_runs: false,
        }),
        _ => None,
    }
}

// ============================================================
// Extractor
// ============================================================

struct CompiledGrammar {
    language: tree_sitter::Language,
    query: Query,
    callee: u32,
    key: u32,
    call: u32,
}

/// Extracts [`CodeCallSite`]s from source text. Compiled queries are cached
/// per language; parsing itself is stateless.
pub struct CallExtractor {
    grammars: Arc<dyn GrammarProvider>,
    compiled: Mutex<HashMap<CodeLanguage, Arc<CompiledGrammar>>>,
}

impl Default for CallExtractor {
    fn default() -> Self {
        Self::new(Arc::new(BundledGrammars))
    }
}

impl CallExtractor {
    pub fn new(grammars: Arc<dyn GrammarProvider>) -> Self {
        Self {
            grammars,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Extract call sites, returning an empty list on any internal failure.
    pub fn extract(
        &self,
        file_path: &str,
        text: &str,
        language: CodeLanguage,
        function_names: &[String],
    ) -> Vec<CodeCallSite> {
        match self.try_extract(file_path, text, language, function_names) {
            Ok(sites) => sites,
            Err(err) => {
                warn!(file = file_path, %language, "call extraction failed: {err:#}");
                Vec::new()
            }
        }
    }

    fn try_extract(
        &self,
        file_path: &str,
        text: &str,
        language: CodeLanguage,
        function_names: &[String],
    ) -> Result<Vec<CodeCallSite>> {
        if function_names.is_empty() {
            return Ok(Vec::new());
        }

        let grammar = self.compiled(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar.language)
            .map_err(|err| GrammarError::Incompatible {
                language,
                message: err.to_string(),
            })?;
        let tree = parser
            .parse(text, None)
            .with_context(|| format!("parser produced no tree for {}", file_path))?;

        let index = LineIndex::new(text);
        let mut sites = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&grammar.query, tree.root_node(), text.as_bytes());
        while let Some(m) = matches.next() {
            let (Some(callee), Some(key), Some(call)) = (
                m.nodes_for_capture_index(grammar.callee).next(),
                m.nodes_for_capture_index(grammar.key).next(),
                m.nodes_for_capture_index(grammar.call).next(),
            ) else {
                continue;
            };

            let Callee::Name(name) = classify_callee(callee, text) else {
                continue;
            };
            if reached_through_subscript(call) {
                continue;
            }
            if !function_names.iter().any(|f| f == name) {
                continue;
            }
            let Some(rules) = literal_rules(language, key, text) else {
                continue;
            };
            let Some(parsed) = parse_literal(node_text(key, text), rules) else {
                continue;
            };
            if parsed.key.is_empty() {
                continue;
            }

            let base = key.start_byte();
            sites.push(CodeCallSite {
                key: parsed.key,
                location: Location::new(
                    file_path,
                    index.range_of(base + parsed.inner.start, base + parsed.inner.end),
                ),
                literal_range: index.range_of(key.start_byte(), key.end_byte()),
                call_range: index.range_of(call.start_byte(), call.end_byte()),
                style: parsed.style,
            });
        }

        sites.sort_by(|a, b| a.location.cmp(&b.location));
        sites.dedup_by(|a, b| a.location == b.location);
        Ok(sites)
    }

    fn compiled(&self, language: CodeLanguage) -> Result<Arc<CompiledGrammar>> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(grammar) = compiled.get(&language) {
            return Ok(Arc::clone(grammar));
        }

        let ts_language = self.grammars.load(language)?;
        let query = Query::new(&ts_language, query_source(language)).map_err(|err| {
            GrammarError::Query {
                language,
                message: err.to_string(),
            }
        })?;
        let capture = |name: &str| {
            query
                .capture_index_for_name(name)
                .ok_or_else(|| GrammarError::Query {
                    language,
                    message: format!("missing @{} capture", name),
                })
        };
        let grammar = Arc::new(CompiledGrammar {
            callee: capture("callee")?,
            key: capture("key")?,
            call: capture("call")?,
            language: ts_language,
            query,
        });
        compiled.insert(language, Arc::clone(&grammar));
        Ok(grammar)
    }
}
