//! Parsing and lowering of scanner source into a closed structural tree.
//!
//! The tree-sitter AST is lowered into [`FilterExpr`] before any walking
//! happens, so every downstream pass matches exhaustively over five variants
//! and cannot silently skip an unhandled node shape. The lowering understands
//! the two spellings pandas-style filters use for boolean structure: the
//! `and`/`or`/`not` keywords and the element-wise `&`/`|`/`~` operators.

use crate::core::{LiteralValue, ParseError, SourceSpan};
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// Closed sum type over everything the extractor cares about. `Other` keeps
/// its lowered children so nested comparisons at any depth stay reachable,
/// while literals that are merely list elements or call arguments stay
/// behind an `Other` boundary and are never treated as thresholds.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    Comparison {
        op: CompareOp,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
        span: SourceSpan,
    },
    BooleanCombinator {
        op: BoolOp,
        operands: Vec<FilterExpr>,
        span: SourceSpan,
    },
    Literal {
        value: LiteralValue,
        span: SourceSpan,
    },
    FieldRef {
        base: String,
        field: String,
        span: SourceSpan,
    },
    Other {
        children: Vec<FilterExpr>,
        span: SourceSpan,
    },
}

impl FilterExpr {
    pub fn span(&self) -> SourceSpan {
        match self {
            FilterExpr::Comparison { span, .. }
            | FilterExpr::BooleanCombinator { span, .. }
            | FilterExpr::Literal { span, .. }
            | FilterExpr::FieldRef { span, .. }
            | FilterExpr::Other { span, .. } => *span,
        }
    }

    /// True when the expression is a filtering condition rather than plain
    /// arithmetic or a bare value.
    pub fn is_filter_shaped(&self) -> bool {
        match self {
            FilterExpr::Comparison { .. } => true,
            FilterExpr::BooleanCombinator { operands, .. } => {
                operands.iter().any(|o| o.is_filter_shaped())
            }
            FilterExpr::Other { children, .. } => children.iter().any(|c| c.is_filter_shaped()),
            FilterExpr::Literal { .. } | FilterExpr::FieldRef { .. } => false,
        }
    }
}

pub fn parse_module(source: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|_| ParseError::NoTree)?;

    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    if tree.root_node().has_error() {
        let (line, detail) = first_syntax_error(&tree.root_node(), source);
        return Err(ParseError::Invalid { line, detail });
    }

    Ok(tree)
}

fn first_syntax_error(root: &Node, source: &str) -> (usize, String) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let line = node.start_position().row + 1;
            let snippet: String = source[node.byte_range()].chars().take(40).collect();
            let detail = if node.is_missing() {
                format!("missing {}", node.kind())
            } else if snippet.is_empty() {
                "unexpected end of input".to_string()
            } else {
                format!("unexpected `{}`", snippet.trim())
            };
            return (line, detail);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return (root.end_position().row + 1, "invalid syntax".to_string());
            }
        }
    }
}

/// Lowers a node (usually the module root) into the closed tree. The
/// `mapping_ident` is the configured lookup-table name: a call of the form
/// `<mapping_ident>.get("x", lit)` lowers to the literal `lit`, which is what
/// lets re-extraction of a transformed program re-derive the original
/// signature.
pub fn lower(node: Node, source: &str, mapping_ident: &str) -> FilterExpr {
    let span = SourceSpan::from_node(&node);
    match node.kind() {
        "comparison_operator" => lower_comparison(node, source, mapping_ident, span),
        "boolean_operator" => {
            let op = match node.child_by_field_name("operator").map(|n| n.kind()) {
                Some("or") => BoolOp::Or,
                _ => BoolOp::And,
            };
            let operands = [
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ]
            .into_iter()
            .flatten()
            .map(|n| lower(n, source, mapping_ident))
            .collect();
            FilterExpr::BooleanCombinator { op, operands, span }
        }
        "not_operator" => {
            let operands = node
                .child_by_field_name("argument")
                .map(|n| vec![lower(n, source, mapping_ident)])
                .unwrap_or_default();
            FilterExpr::BooleanCombinator {
                op: BoolOp::Not,
                operands,
                span,
            }
        }
        "binary_operator" => {
            let operator = node
                .child_by_field_name("operator")
                .map(|n| n.kind())
                .unwrap_or("");
            let operands: Vec<FilterExpr> = [
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ]
            .into_iter()
            .flatten()
            .map(|n| lower(n, source, mapping_ident))
            .collect();
            match operator {
                "&" => FilterExpr::BooleanCombinator {
                    op: BoolOp::And,
                    operands,
                    span,
                },
                "|" => FilterExpr::BooleanCombinator {
                    op: BoolOp::Or,
                    operands,
                    span,
                },
                _ => FilterExpr::Other {
                    children: operands,
                    span,
                },
            }
        }
        "unary_operator" => lower_unary(node, source, mapping_ident, span),
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => lower(inner, source, mapping_ident),
            None => FilterExpr::Other {
                children: Vec::new(),
                span,
            },
        },
        "subscript" => lower_subscript(node, source, mapping_ident, span),
        "attribute" => lower_attribute(node, source, mapping_ident, span),
        "call" => lower_call(node, source, mapping_ident, span),
        "integer" => match parse_int(&source[node.byte_range()]) {
            Some(v) => FilterExpr::Literal {
                value: LiteralValue::Int(v),
                span,
            },
            None => FilterExpr::Other {
                children: Vec::new(),
                span,
            },
        },
        "float" => match source[node.byte_range()].replace('_', "").parse::<f64>() {
            Ok(v) => FilterExpr::Literal {
                value: LiteralValue::Number(v),
                span,
            },
            Err(_) => FilterExpr::Other {
                children: Vec::new(),
                span,
            },
        },
        "string" => FilterExpr::Literal {
            value: LiteralValue::Str(strip_string_quotes(&source[node.byte_range()])),
            span,
        },
        "true" => FilterExpr::Literal {
            value: LiteralValue::Bool(true),
            span,
        },
        "false" => FilterExpr::Literal {
            value: LiteralValue::Bool(false),
            span,
        },
        _ => FilterExpr::Other {
            children: lower_named_children(node, source, mapping_ident),
            span,
        },
    }
}

fn lower_named_children(node: Node, source: &str, mapping_ident: &str) -> Vec<FilterExpr> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .map(|c| lower(c, source, mapping_ident))
        .collect()
}

/// Python chains comparisons (`0 < x < 9`); each adjacent operand pair is one
/// comparison, and a chain lowers to an AND over the pairs.
fn lower_comparison(node: Node, source: &str, mapping_ident: &str, span: SourceSpan) -> FilterExpr {
    let mut cursor = node.walk();
    let operands: Vec<Node> = node.named_children(&mut cursor).collect();
    let operators: Vec<String> = {
        let mut cursor = node.walk();
        node.children_by_field_name("operators", &mut cursor)
            .map(|n| source[n.byte_range()].to_string())
            .collect()
    };

    if operands.len() < 2 || operators.is_empty() {
        return FilterExpr::Other {
            children: lower_named_children(node, source, mapping_ident),
            span,
        };
    }

    let mut pairs = Vec::with_capacity(operators.len());
    for (i, token) in operators.iter().enumerate() {
        let (Some(left), Some(right)) = (operands.get(i), operands.get(i + 1)) else {
            break;
        };
        let pair_span = SourceSpan::new(
            left.start_byte(),
            right.end_byte(),
            left.start_position().row + 1,
            left.start_position().column,
        );
        match CompareOp::from_token(token) {
            Some(op) => pairs.push(FilterExpr::Comparison {
                op,
                left: Box::new(lower(*left, source, mapping_ident)),
                right: Box::new(lower(*right, source, mapping_ident)),
                span: pair_span,
            }),
            // `in`, `is`, `not in`: structurally a comparison, but not a
            // threshold comparison the engine parameterizes.
            None => pairs.push(FilterExpr::Other {
                children: vec![
                    lower(*left, source, mapping_ident),
                    lower(*right, source, mapping_ident),
                ],
                span: pair_span,
            }),
        }
    }

    if pairs.len() == 1 {
        pairs.into_iter().next().unwrap()
    } else {
        FilterExpr::BooleanCombinator {
            op: BoolOp::And,
            operands: pairs,
            span,
        }
    }
}

fn lower_unary(node: Node, source: &str, mapping_ident: &str, span: SourceSpan) -> FilterExpr {
    let operator = node
        .child_by_field_name("operator")
        .map(|n| n.kind())
        .unwrap_or("");
    let argument = node.child_by_field_name("argument");

    match (operator, argument) {
        ("~", Some(arg)) => FilterExpr::BooleanCombinator {
            op: BoolOp::Not,
            operands: vec![lower(arg, source, mapping_ident)],
            span,
        },
        // A negated numeric literal is one threshold, spanning the sign.
        ("-", Some(arg)) => match lower(arg, source, mapping_ident) {
            FilterExpr::Literal {
                value: LiteralValue::Int(v),
                ..
            } => FilterExpr::Literal {
                value: LiteralValue::Int(-v),
                span,
            },
            FilterExpr::Literal {
                value: LiteralValue::Number(v),
                ..
            } => FilterExpr::Literal {
                value: LiteralValue::Number(-v),
                span,
            },
            other => FilterExpr::Other {
                children: vec![other],
                span,
            },
        },
        (_, Some(arg)) => FilterExpr::Other {
            children: vec![lower(arg, source, mapping_ident)],
            span,
        },
        (_, None) => FilterExpr::Other {
            children: Vec::new(),
            span,
        },
    }
}

fn lower_subscript(node: Node, source: &str, mapping_ident: &str, span: SourceSpan) -> FilterExpr {
    let value = node.child_by_field_name("value");
    let key = node.child_by_field_name("subscript");

    if let (Some(value), Some(key)) = (value, key) {
        if value.kind() == "identifier" && key.kind() == "string" {
            return FilterExpr::FieldRef {
                base: source[value.byte_range()].to_string(),
                field: strip_string_quotes(&source[key.byte_range()]),
                span,
            };
        }
    }

    FilterExpr::Other {
        children: lower_named_children(node, source, mapping_ident),
        span,
    }
}

fn lower_attribute(node: Node, source: &str, mapping_ident: &str, span: SourceSpan) -> FilterExpr {
    let object = node.child_by_field_name("object");
    let attribute = node.child_by_field_name("attribute");

    if let (Some(object), Some(attribute)) = (object, attribute) {
        if object.kind() == "identifier" {
            return FilterExpr::FieldRef {
                base: source[object.byte_range()].to_string(),
                field: source[attribute.byte_range()].to_string(),
                span,
            };
        }
        // a comparison can hide inside the receiver, e.g. (df.gap > 0.5).any
        return FilterExpr::Other {
            children: vec![lower(object, source, mapping_ident)],
            span,
        };
    }

    FilterExpr::Other {
        children: Vec::new(),
        span,
    }
}

fn lower_call(node: Node, source: &str, mapping_ident: &str, span: SourceSpan) -> FilterExpr {
    if let Some(default) = externalized_lookup_default(node, source, mapping_ident) {
        return default;
    }

    FilterExpr::Other {
        children: lower_named_children(node, source, mapping_ident),
        span,
    }
}

/// Recognizes `<mapping_ident>.get("name", <literal>)` and yields the default
/// literal, spanned to the default argument so the threshold stays
/// addressable inside rewritten source.
fn externalized_lookup_default(node: Node, source: &str, mapping_ident: &str) -> Option<FilterExpr> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let object = function.child_by_field_name("object")?;
    let attribute = function.child_by_field_name("attribute")?;
    if object.kind() != "identifier"
        || &source[object.byte_range()] != mapping_ident
        || &source[attribute.byte_range()] != "get"
    {
        return None;
    }

    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let args: Vec<Node> = arguments.named_children(&mut cursor).collect();
    if args.len() != 2 || args[0].kind() != "string" {
        return None;
    }

    match lower(args[1], source, mapping_ident) {
        literal @ FilterExpr::Literal { .. } => Some(literal),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "");
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    cleaned.parse::<i64>().ok()
}

pub fn strip_string_quotes(text: &str) -> String {
    let trimmed = text
        .trim_start_matches(['r', 'b', 'u', 'f', 'R', 'B', 'U', 'F'])
        .trim();
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if trimmed.len() >= quote.len() * 2
            && trimmed.starts_with(quote)
            && trimmed.ends_with(quote)
        {
            return trimmed[quote.len()..trimmed.len() - quote.len()].to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_first_expr(source: &str) -> FilterExpr {
        let tree = parse_module(source).unwrap();
        lower(tree.root_node(), source, "params")
    }

    fn find_comparisons(expr: &FilterExpr, out: &mut Vec<CompareOp>) {
        match expr {
            FilterExpr::Comparison {
                op, left, right, ..
            } => {
                out.push(*op);
                find_comparisons(left, out);
                find_comparisons(right, out);
            }
            FilterExpr::BooleanCombinator { operands, .. } => {
                operands.iter().for_each(|o| find_comparisons(o, out))
            }
            FilterExpr::Other { children, .. } => {
                children.iter().for_each(|c| find_comparisons(c, out))
            }
            _ => {}
        }
    }

    #[test]
    fn test_malformed_source_is_a_parse_error() {
        let err = parse_module("filtered = df[(df['gap'] >= 0.5").unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn test_pandas_element_wise_operators_become_combinators() {
        let expr = lower_first_expr("mask = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)\n");
        let mut ops = Vec::new();
        find_comparisons(&expr, &mut ops);
        assert_eq!(ops, vec![CompareOp::Ge, CompareOp::Ge]);
    }

    #[test]
    fn test_chained_comparison_lowers_pairwise() {
        let expr = lower_first_expr("ok = 0.0 < df['gap'] < 9.5\n");
        let mut ops = Vec::new();
        find_comparisons(&expr, &mut ops);
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_lookup_call_lowers_to_default_literal() {
        let source = "mask = df['gap'] >= params.get(\"gap_min\", 0.5)\n";
        let expr = lower_first_expr(source);
        let mut found = false;
        fn visit(expr: &FilterExpr, source: &str, found: &mut bool) {
            if let FilterExpr::Comparison { right, .. } = expr {
                if let FilterExpr::Literal { value, span } = right.as_ref() {
                    assert_eq!(value, &LiteralValue::Number(0.5));
                    assert_eq!(&source[span.start..span.end], "0.5");
                    *found = true;
                }
            }
            match expr {
                FilterExpr::BooleanCombinator { operands, .. } => {
                    operands.iter().for_each(|o| visit(o, source, found))
                }
                FilterExpr::Other { children, .. } => {
                    children.iter().for_each(|c| visit(c, source, found))
                }
                _ => {}
            }
        }
        visit(&expr, source, &mut found);
        assert!(found);
    }

    #[test]
    fn test_foreign_mapping_get_is_not_a_literal() {
        let source = "mask = df['gap'] >= settings.get(\"gap_min\", 0.5)\n";
        let expr = lower_first_expr(source);
        let mut ops = Vec::new();
        find_comparisons(&expr, &mut ops);
        // the comparison survives, but its right side is Other, not Literal
        assert_eq!(ops, vec![CompareOp::Ge]);
    }

    #[test]
    fn test_negative_literal_spans_the_sign() {
        let source = "mask = df['change'] <= -2.5\n";
        let tree = parse_module(source).unwrap();
        let expr = lower(tree.root_node(), source, "params");
        let mut spans = Vec::new();
        fn visit(expr: &FilterExpr, spans: &mut Vec<(LiteralValue, SourceSpan)>) {
            match expr {
                FilterExpr::Literal { value, span } => spans.push((value.clone(), *span)),
                FilterExpr::Comparison { left, right, .. } => {
                    visit(left, spans);
                    visit(right, spans);
                }
                FilterExpr::BooleanCombinator { operands, .. } => {
                    operands.iter().for_each(|o| visit(o, spans))
                }
                FilterExpr::Other { children, .. } => {
                    children.iter().for_each(|c| visit(c, spans))
                }
                _ => {}
            }
        }
        visit(&expr, &mut spans);
        let (value, span) = &spans[0];
        assert_eq!(value, &LiteralValue::Number(-2.5));
        assert_eq!(&source[span.start..span.end], "-2.5");
    }

    #[test]
    fn test_string_quote_stripping() {
        assert_eq!(strip_string_quotes("'gap'"), "gap");
        assert_eq!(strip_string_quotes("\"volume\""), "volume");
        assert_eq!(strip_string_quotes("'''doc'''"), "doc");
    }
}
