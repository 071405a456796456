//! Structured reply format for the enrichment exchange.
//!
//! Replies are parsed leniently at the envelope level (models wrap JSON in
//! code fences) but strictly at the schema level: a body that does not
//! deserialize is `MalformedReply` and triggers fallback. Individual entries
//! that deserialize but carry an unusable value are dropped one by one.

use crate::core::{EnrichmentError, LiteralValue, ParameterBinding};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentReply {
    pub parameters: Vec<ProposedParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedParameter {
    pub name: String,

    pub value: serde_json::Value,

    pub confidence: f64,
}

impl EnrichmentReply {
    pub fn schema_definition() -> &'static str {
        r#"
{
  "parameters": [
    {
      "name": "string (snake_case, e.g. 'float_max')",
      "value": "number | string | boolean",
      "confidence": "number (0.0-1.0)"
    }
  ]
}
"#
    }

    pub fn parse(content: &str) -> Result<Self, EnrichmentError> {
        let body = extract_json_from_text(content);
        serde_json::from_str(body).map_err(|e| EnrichmentError::MalformedReply(e.to_string()))
    }
}

impl ProposedParameter {
    /// `None` when the value is not representable as a literal threshold
    /// (null, arrays, objects, non-finite numbers).
    pub fn to_binding(&self) -> Option<ParameterBinding> {
        let value = match &self.value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    LiteralValue::Int(i)
                } else {
                    let f = n.as_f64()?;
                    if !f.is_finite() {
                        return None;
                    }
                    LiteralValue::Number(f)
                }
            }
            serde_json::Value::String(s) => LiteralValue::Str(s.clone()),
            serde_json::Value::Bool(b) => LiteralValue::Bool(*b),
            _ => {
                debug!(name = %self.name, "dropping enrichment entry with unusable value");
                return None;
            }
        };
        Some(ParameterBinding::enriched(
            self.name.clone(),
            value,
            self.confidence,
        ))
    }
}

/// Models asked for JSON still fence it now and then; take the fenced block
/// when present, otherwise the first balanced object.
fn extract_json_from_text(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    if let Some(start) = text.find('{') {
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape_next = false;
        for (i, &byte) in bytes[start..].iter().enumerate() {
            if escape_next {
                escape_next = false;
                continue;
            }
            match byte {
                b'\\' if in_string => escape_next = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return &text[start..start + i + 1];
                    }
                }
                _ => {}
            }
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BindingOrigin;

    #[test]
    fn test_parse_plain_json() {
        let reply = EnrichmentReply::parse(
            r#"{"parameters": [{"name": "float_max", "value": 50000000, "confidence": 0.7}]}"#,
        )
        .unwrap();
        assert_eq!(reply.parameters.len(), 1);
        let binding = reply.parameters[0].to_binding().unwrap();
        assert_eq!(binding.origin, BindingOrigin::Enriched);
        assert_eq!(binding.value, LiteralValue::Int(50_000_000));
        assert!(binding.span.is_none());
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "Here you go:\n```json\n{\"parameters\": []}\n```\nDone.";
        let reply = EnrichmentReply::parse(content).unwrap();
        assert!(reply.parameters.is_empty());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(matches!(
            EnrichmentReply::parse("not json at all"),
            Err(EnrichmentError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_unusable_values_are_dropped_individually() {
        let reply = EnrichmentReply::parse(
            r#"{"parameters": [
                {"name": "good", "value": 1.5, "confidence": 0.8},
                {"name": "bad", "value": [1, 2], "confidence": 0.8},
                {"name": "also_bad", "value": null, "confidence": 0.8}
            ]}"#,
        )
        .unwrap();
        let bindings: Vec<_> = reply
            .parameters
            .iter()
            .filter_map(|p| p.to_binding())
            .collect();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "good");
    }
}
