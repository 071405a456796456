//! Multi-pattern detection and splitting.
//!
//! Evidence for a split is two or more top-level assignments to distinct
//! named boolean outputs (`df['pattern_a'] = ...`) whose right-hand sides are
//! filter expressions. Each unit gets the minimal dependency closure of its
//! pattern: the assignment plus every helper binding it references
//! transitively. Helpers must belong to exactly one closure; a helper claimed
//! by two patterns makes the boundary ambiguous and the splitter degrades to
//! a single whole-file unit instead of guessing. Imports are prelude, copied
//! into every unit.

use crate::core::{ParseError, ScannerUnit, SourceSpan};
use crate::extract::tree::{lower, parse_module};
use crate::extract::StructuralExtractor;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::Node;

pub const WHOLE_FILE_UNIT: &str = "scanner";

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub units: Vec<ScannerUnit>,

    pub warnings: Vec<String>,
}

impl SplitOutcome {
    pub fn is_split(&self) -> bool {
        self.units.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementRole {
    Prelude,
    Helper,
    Pattern,
    Other,
}

#[derive(Debug, Clone)]
struct Statement {
    span: SourceSpan,
    text: String,
    role: StatementRole,
    output: Option<String>,
    defines: Vec<String>,
    uses: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Splitter {
    extractor: StructuralExtractor,
}

impl Splitter {
    pub fn new(extractor: StructuralExtractor) -> Self {
        Self { extractor }
    }

    pub fn split(&self, source: &str) -> Result<SplitOutcome, ParseError> {
        let tree = parse_module(source)?;
        let signature = self.extractor.extract(source)?;

        let statements = collect_statements(&tree.root_node(), source, self.extractor.mapping_ident());

        let patterns: Vec<usize> = statements
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == StatementRole::Pattern)
            .map(|(i, _)| i)
            .collect();

        let whole_file = |warnings: Vec<String>| SplitOutcome {
            units: vec![ScannerUnit {
                unit_name: WHOLE_FILE_UNIT.to_string(),
                code: source.to_string(),
                bindings: signature.bindings.clone(),
            }],
            warnings,
        };

        if patterns.len() < 2 {
            return Ok(whole_file(Vec::new()));
        }

        let mut seen_outputs = HashSet::new();
        for &idx in &patterns {
            let output = statements[idx].output.as_deref().unwrap_or_default();
            if !seen_outputs.insert(output.to_string()) {
                return Ok(whole_file(vec![format!(
                    "split ambiguous: output `{}` is assigned more than once",
                    output
                )]));
            }
        }

        let mut name_to_helpers: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, stmt) in statements.iter().enumerate() {
            if stmt.role == StatementRole::Helper {
                for name in &stmt.defines {
                    name_to_helpers.entry(name).or_default().push(idx);
                }
            }
        }

        let closures: Vec<BTreeSet<usize>> = patterns
            .iter()
            .map(|&idx| closure_of(idx, &statements, &name_to_helpers))
            .collect();

        let mut owner: HashMap<usize, usize> = HashMap::new();
        for (unit_idx, closure) in closures.iter().enumerate() {
            for &stmt_idx in closure {
                if let Some(&previous) = owner.get(&stmt_idx) {
                    let output_a = statements[patterns[previous]].output.as_deref().unwrap_or("");
                    let output_b = statements[patterns[unit_idx]].output.as_deref().unwrap_or("");
                    return Ok(whole_file(vec![format!(
                        "split ambiguous: helper at line {} is referenced by both `{}` and `{}`",
                        statements[stmt_idx].span.line, output_a, output_b
                    )]));
                }
                owner.insert(stmt_idx, unit_idx);
            }
        }

        let prelude: Vec<usize> = statements
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == StatementRole::Prelude)
            .map(|(i, _)| i)
            .collect();

        let mut units = Vec::with_capacity(patterns.len());
        for (unit_idx, &pattern_idx) in patterns.iter().enumerate() {
            let mut included: BTreeSet<usize> = closures[unit_idx].clone();
            included.extend(prelude.iter().copied());
            included.insert(pattern_idx);

            let code = included
                .iter()
                .map(|&i| statements[i].text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
                + "\n";

            let spans: Vec<SourceSpan> = included.iter().map(|&i| statements[i].span).collect();
            let mut bindings = IndexMap::new();
            for (name, binding) in &signature.bindings {
                let owned = binding
                    .span
                    .map(|bs| spans.iter().any(|s| s.contains(&bs)))
                    .unwrap_or(false);
                if owned {
                    // duplicated by value when shared through prelude
                    bindings.insert(name.clone(), binding.clone());
                }
            }

            units.push(ScannerUnit {
                unit_name: statements[pattern_idx]
                    .output
                    .clone()
                    .unwrap_or_else(|| format!("unit_{}", unit_idx + 1)),
                code,
                bindings,
            });
        }

        tracing::debug!(units = units.len(), "split complete");
        Ok(SplitOutcome {
            units,
            warnings: Vec::new(),
        })
    }
}

fn closure_of(
    pattern_idx: usize,
    statements: &[Statement],
    name_to_helpers: &HashMap<&str, Vec<usize>>,
) -> BTreeSet<usize> {
    let mut closure = BTreeSet::new();
    let mut worklist: Vec<String> = statements[pattern_idx].uses.clone();
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(name) = worklist.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some(helpers) = name_to_helpers.get(name.as_str()) {
            for &idx in helpers {
                if closure.insert(idx) {
                    worklist.extend(statements[idx].uses.iter().cloned());
                }
            }
        }
    }

    closure
}

fn collect_statements(root: &Node, source: &str, mapping_ident: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor) {
        if child.is_extra() {
            continue;
        }
        let span = SourceSpan::from_node(&child);
        let text = source[child.byte_range()].to_string();

        let statement = match child.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => Statement {
                span,
                text,
                role: StatementRole::Prelude,
                output: None,
                defines: Vec::new(),
                uses: Vec::new(),
            },
            "function_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| source[n.byte_range()].to_string());
                let uses = child
                    .child_by_field_name("body")
                    .map(|body| identifiers_in(&body, source))
                    .unwrap_or_default();
                Statement {
                    span,
                    text,
                    role: StatementRole::Helper,
                    output: None,
                    defines: name.into_iter().collect(),
                    uses,
                }
            }
            "expression_statement" => match child.named_child(0) {
                Some(inner) if inner.kind() == "assignment" => {
                    lower_assignment(inner, span, text, source, mapping_ident)
                }
                Some(inner) if inner.kind() == "augmented_assignment" => {
                    lower_assignment(inner, span, text, source, mapping_ident)
                }
                _ => Statement {
                    span,
                    text,
                    role: StatementRole::Other,
                    output: None,
                    defines: Vec::new(),
                    uses: identifiers_in(&child, source),
                },
            },
            _ => Statement {
                span,
                text,
                role: StatementRole::Other,
                output: None,
                defines: Vec::new(),
                uses: identifiers_in(&child, source),
            },
        };

        statements.push(statement);
    }

    statements
}

fn lower_assignment(
    node: Node,
    span: SourceSpan,
    text: String,
    source: &str,
    mapping_ident: &str,
) -> Statement {
    let left = node.child_by_field_name("left");
    let right = node.child_by_field_name("right");

    let uses = right
        .map(|r| identifiers_in(&r, source))
        .unwrap_or_default();

    if let Some(left) = left {
        match left.kind() {
            "identifier" => {
                return Statement {
                    span,
                    text,
                    role: StatementRole::Helper,
                    output: None,
                    defines: vec![source[left.byte_range()].to_string()],
                    uses,
                };
            }
            "subscript" => {
                let value = left.child_by_field_name("value");
                let key = left.child_by_field_name("subscript");
                if let (Some(value), Some(key)) = (value, key) {
                    if value.kind() == "identifier" && key.kind() == "string" {
                        let is_filter = right
                            .map(|r| lower(r, source, mapping_ident).is_filter_shaped())
                            .unwrap_or(false);
                        if is_filter {
                            let output = crate::extract::tree::strip_string_quotes(
                                &source[key.byte_range()],
                            );
                            return Statement {
                                span,
                                text,
                                role: StatementRole::Pattern,
                                output: Some(output),
                                defines: Vec::new(),
                                uses,
                            };
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Statement {
        span,
        text,
        role: StatementRole::Other,
        output: None,
        defines: Vec::new(),
        uses,
    }
}

fn identifiers_in(node: &Node, source: &str) -> Vec<String> {
    fn visit(node: Node, source: &str, names: &mut Vec<String>) {
        if node.kind() == "identifier" {
            let name = source[node.byte_range()].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            visit(child, source, names);
        }
    }

    let mut names = Vec::new();
    visit(*node, source, &mut names);
    names
}
