//! The structural extraction pass: parse, lower, walk, name.
//!
//! Extraction is pure and deterministic. The walk visits the lowered tree in
//! source order, so the same text always produces the same binding order and
//! therefore the same content hash.

use crate::core::{LiteralValue, ParameterBinding, ParseError, Signature, SourceSpan};
use crate::extract::kind::{classify, SourceProfile};
use crate::extract::tree::{lower, parse_module, CompareOp, FilterExpr};
use std::collections::HashSet;

pub const DEFAULT_MAPPING_IDENT: &str = "params";

#[derive(Debug, Clone)]
pub struct StructuralExtractor {
    mapping_ident: String,
}

impl Default for StructuralExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralExtractor {
    pub fn new() -> Self {
        Self {
            mapping_ident: DEFAULT_MAPPING_IDENT.to_string(),
        }
    }

    pub fn with_mapping_ident(ident: impl Into<String>) -> Self {
        Self {
            mapping_ident: ident.into(),
        }
    }

    pub fn mapping_ident(&self) -> &str {
        &self.mapping_ident
    }

    pub fn extract(&self, source: &str) -> Result<Signature, ParseError> {
        let tree = parse_module(source)?;
        let profile = SourceProfile::from_tree(&tree, source);
        let kind = classify(&profile);

        let lowered = lower(tree.root_node(), source, &self.mapping_ident);

        let mut collector = BindingCollector::default();
        collector.walk(&lowered);

        tracing::debug!(
            kind = %kind,
            bindings = collector.bindings.len(),
            "structural extraction complete"
        );

        Ok(Signature::new(kind, collector.bindings))
    }
}

#[derive(Debug, Default)]
struct BindingCollector {
    bindings: Vec<ParameterBinding>,
    taken: HashSet<String>,
}

impl BindingCollector {
    fn walk(&mut self, expr: &FilterExpr) {
        match expr {
            FilterExpr::Comparison {
                op, left, right, ..
            } => {
                match (left.as_ref(), right.as_ref()) {
                    (
                        FilterExpr::FieldRef { field, .. },
                        FilterExpr::Literal { value, span },
                    ) => self.record(field, *op, false, value.clone(), *span),
                    (
                        FilterExpr::Literal { value, span },
                        FilterExpr::FieldRef { field, .. },
                    ) => self.record(field, *op, true, value.clone(), *span),
                    _ => {}
                }
                self.walk(left);
                self.walk(right);
            }
            FilterExpr::BooleanCombinator { operands, .. } => {
                for operand in operands {
                    self.walk(operand);
                }
            }
            FilterExpr::Other { children, .. } => {
                for child in children {
                    self.walk(child);
                }
            }
            FilterExpr::Literal { .. } | FilterExpr::FieldRef { .. } => {}
        }
    }

    fn record(
        &mut self,
        field: &str,
        op: CompareOp,
        literal_on_left: bool,
        value: LiteralValue,
        span: SourceSpan,
    ) {
        let name = self.unique_name(field, op, literal_on_left);
        self.taken.insert(name.clone());
        self.bindings
            .push(ParameterBinding::structural(name, value, span));
    }

    /// `field >= lit` → `field_min`; a literal on the left flips the class
    /// (`lit >= field` bounds the field from above). Collisions take the
    /// smallest unused integer suffix.
    fn unique_name(&self, field: &str, op: CompareOp, literal_on_left: bool) -> String {
        let class = match (op, literal_on_left) {
            (CompareOp::Gt | CompareOp::Ge, false) => "min",
            (CompareOp::Lt | CompareOp::Le, false) => "max",
            (CompareOp::Gt | CompareOp::Ge, true) => "max",
            (CompareOp::Lt | CompareOp::Le, true) => "min",
            (CompareOp::Eq, _) => "eq",
            (CompareOp::Ne, _) => "ne",
        };
        let base = format!("{}_{}", sanitize_field(field), class);
        if !self.taken.contains(&base) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.taken.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn sanitize_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c.is_ascii_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_orders_bindings_by_source_position() {
        let source = "\
mask = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)
";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        let names: Vec<&str> = sig.bindings.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["gap_min", "vol_min"]);
        assert_eq!(sig.value_of("gap_min"), Some(&LiteralValue::Number(0.5)));
        assert_eq!(sig.value_of("vol_min"), Some(&LiteralValue::Int(1_000_000)));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let source = "mask = (df['gap'] >= 0.5) & (df['rsi'] <= 70)\n";
        let extractor = StructuralExtractor::new();
        let a = extractor.extract(source).unwrap();
        let b = extractor.extract(source).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_flipped_operands_flip_the_class() {
        let source = "mask = 0.5 <= df['gap']\n";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        assert!(sig.get("gap_min").is_some());
    }

    #[test]
    fn test_collisions_take_integer_suffixes() {
        let source = "mask = (df['gap'] >= 0.5) & (df['gap'] > 1.0) & (df['gap'] >= 2.0)\n";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        let names: Vec<&str> = sig.bindings.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["gap_min", "gap_min_2", "gap_min_3"]);
    }

    #[test]
    fn test_lookup_table_literals_are_not_bindings() {
        let source = "tiers = [0.5, 1.0, 2.0]\nmask = df['sector'].isin(['Tech', 'Energy'])\n";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        assert!(sig.is_empty());
    }

    #[test]
    fn test_nested_combinators_are_fully_captured() {
        let source = "\
mask = ((df['gap'] >= 0.5) | ((df['vol'] >= 1000000) & ~(df['close'] <= 2.0)))
";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        let names: Vec<&str> = sig.bindings.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["gap_min", "vol_min", "close_max"]);
    }

    #[test]
    fn test_equality_comparisons_get_eq_class() {
        let source = "mask = df['exchange'] == 'NASDAQ'\n";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        assert_eq!(
            sig.value_of("exchange_eq"),
            Some(&LiteralValue::Str("NASDAQ".into()))
        );
    }

    #[test]
    fn test_attribute_column_access_qualifies() {
        let source = "mask = df.gap >= 0.5\n";
        let sig = StructuralExtractor::new().extract(source).unwrap();
        assert!(sig.get("gap_min").is_some());
    }

    #[test]
    fn test_invalid_source_fails_extraction() {
        let err = StructuralExtractor::new()
            .extract("mask = (df['gap'] >= 0.5\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }
}
