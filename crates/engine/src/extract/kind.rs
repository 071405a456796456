//! Scanner-kind classification.
//!
//! The heuristics are an ordered data table of tagged predicate rules, not
//! branching code: first matching rule wins, no match falls through to
//! `Custom`. Rules look at a small profile of the source (names of defined
//! functions, dict-literal assignment targets) gathered with declarative
//! tree-sitter queries.

use crate::core::ScannerKind;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor, Tree};

const DEF_QUERY: &str = r#"
(function_definition
  name: (identifier) @def_name)
"#;

const DICT_ASSIGN_QUERY: &str = r#"
(assignment
  left: (identifier) @target
  right: (dictionary))
"#;

#[derive(Debug, Default)]
pub struct SourceProfile {
    pub def_names: Vec<String>,
    pub dict_assign_targets: Vec<String>,
}

impl SourceProfile {
    pub fn from_tree(tree: &Tree, source: &str) -> Self {
        let language = tree_sitter_python::LANGUAGE.into();
        Self {
            def_names: capture_texts(&language, DEF_QUERY, tree, source),
            dict_assign_targets: capture_texts(&language, DICT_ASSIGN_QUERY, tree, source),
        }
    }
}

fn capture_texts(
    language: &tree_sitter::Language,
    query_source: &str,
    tree: &Tree,
    source: &str,
) -> Vec<String> {
    let query = match Query::new(language, query_source) {
        Ok(q) => q,
        Err(e) => {
            tracing::warn!(error = %e, "kind rule query failed to compile");
            return Vec::new();
        }
    };

    let mut texts = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
    matches.advance();
    while let Some(match_) = matches.get() {
        for capture in match_.captures {
            texts.push(source[capture.node.byte_range()].to_string());
        }
        matches.advance();
    }
    texts
}

pub struct KindRule {
    pub kind: ScannerKind,
    pub name: &'static str,
    pub applies: fn(&SourceProfile) -> bool,
}

/// Evaluated top to bottom; order is part of the contract.
pub const KIND_RULES: &[KindRule] = &[
    KindRule {
        kind: ScannerKind::FilterFunction,
        name: "named-filter-function",
        applies: |profile| {
            profile.def_names.iter().any(|name| {
                let lower = name.to_lowercase();
                lower.contains("scan") || lower.contains("filter") || lower.contains("screen")
            })
        },
    },
    KindRule {
        kind: ScannerKind::ParamTable,
        name: "flat-parameter-table",
        applies: |profile| {
            profile.dict_assign_targets.iter().any(|name| {
                let lower = name.to_lowercase();
                lower.contains("param") || lower.contains("config") || lower.contains("setting")
            })
        },
    },
];

pub fn classify(profile: &SourceProfile) -> ScannerKind {
    for rule in KIND_RULES {
        if (rule.applies)(profile) {
            tracing::debug!(rule = rule.name, "scanner kind matched");
            return rule.kind;
        }
    }
    ScannerKind::Custom
}
