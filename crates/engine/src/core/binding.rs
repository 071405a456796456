use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn from_node(node: &tree_sitter::Node) -> Self {
        let range = node.byte_range();
        let pos = node.start_position();
        Self {
            start: range.start,
            end: range.end,
            line: pos.row + 1,
            column: pos.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &SourceSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LiteralValue {
    Int(i64),
    Number(f64),
    Str(String),
    Bool(bool),
}

impl LiteralValue {
    /// Canonical rendering used both for the content hash and for splicing
    /// a default back into rewritten source. Must be stable across runs.
    pub fn canonical(&self) -> String {
        match self {
            LiteralValue::Int(v) => v.to_string(),
            LiteralValue::Number(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    format!("{:.1}", v)
                } else {
                    format!("{}", v)
                }
            }
            LiteralValue::Str(v) => format!("\"{}\"", v),
            LiteralValue::Bool(v) => v.to_string(),
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BindingOrigin {
    Structural,
    Enriched,
}

/// A named literal threshold pulled out of a filtering comparison.
///
/// Structural bindings always carry the span of the literal they were
/// extracted from and confidence 1.0. Enriched bindings are proposed by the
/// inference service: no span, service-reported confidence, never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterBinding {
    pub name: String,

    pub value: LiteralValue,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,

    pub confidence: f64,

    pub origin: BindingOrigin,
}

impl ParameterBinding {
    pub fn structural(name: impl Into<String>, value: LiteralValue, span: SourceSpan) -> Self {
        Self {
            name: name.into(),
            value,
            span: Some(span),
            confidence: 1.0,
            origin: BindingOrigin::Structural,
        }
    }

    pub fn enriched(name: impl Into<String>, value: LiteralValue, confidence: f64) -> Self {
        Self {
            name: name.into(),
            value,
            span: None,
            confidence: confidence.clamp(0.0, 1.0),
            origin: BindingOrigin::Enriched,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.origin == BindingOrigin::Structural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_containment() {
        let outer = SourceSpan::new(10, 50, 2, 0);
        let inner = SourceSpan::new(20, 30, 2, 10);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn test_canonical_rendering_is_stable() {
        assert_eq!(LiteralValue::Number(0.5).canonical(), "0.5");
        assert_eq!(LiteralValue::Number(2.0).canonical(), "2.0");
        assert_eq!(LiteralValue::Int(1_000_000).canonical(), "1000000");
        assert_eq!(LiteralValue::Str("NASDAQ".into()).canonical(), "\"NASDAQ\"");
        assert_eq!(LiteralValue::Bool(true).canonical(), "true");
    }

    #[test]
    fn test_structural_binding_has_full_confidence() {
        let b = ParameterBinding::structural(
            "gap_min",
            LiteralValue::Number(0.5),
            SourceSpan::new(0, 3, 1, 0),
        );
        assert_eq!(b.confidence, 1.0);
        assert!(b.is_structural());
        assert!(b.span.is_some());
    }

    #[test]
    fn test_enriched_confidence_is_clamped() {
        let b = ParameterBinding::enriched("rsi_max", LiteralValue::Int(70), 1.7);
        assert_eq!(b.confidence, 1.0);
        assert!(b.span.is_none());
    }
}
