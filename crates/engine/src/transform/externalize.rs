//! Rewrites extracted literals into configurable lookups.
//!
//! The only bytes that change are the recorded literal spans; each becomes
//! `<mapping>.get("<name>", <original literal text>)` with the default
//! reproduced byte-for-byte from the source. Splicing runs right-to-left so
//! earlier offsets stay valid without any re-indexing pass.

use crate::core::{ParameterBinding, Signature, SourceSpan, TransformResult};
use crate::extract::DEFAULT_MAPPING_IDENT;

#[derive(Debug, Clone)]
pub struct Externalizer {
    mapping_ident: String,
}

impl Default for Externalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Externalizer {
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

    pub fn transform(&self, source: &str, signature: &Signature) -> TransformResult {
        let mut warnings = Vec::new();

        // Enriched-only bindings are descriptive: no span, nothing to splice.
        let mut targets: Vec<(&ParameterBinding, SourceSpan)> = signature
            .bindings
            .values()
            .filter_map(|b| b.span.map(|span| (b, span)))
            .collect();

        targets.retain(|(binding, span)| {
            let ok = span.end <= source.len()
                && !span.is_empty()
                && source.is_char_boundary(span.start)
                && source.is_char_boundary(span.end);
            if !ok {
                warnings.push(format!(
                    "binding `{}` has an unusable span {}..{}; left untouched",
                    binding.name, span.start, span.end
                ));
            }
            ok
        });

        targets.sort_by_key(|(_, span)| span.start);
        let mut keep = vec![true; targets.len()];
        for i in 1..targets.len() {
            if targets[i - 1].1.overlaps(&targets[i].1) {
                warnings.push(format!(
                    "bindings `{}` and `{}` overlap in source; `{}` left untouched",
                    targets[i - 1].0.name,
                    targets[i].0.name,
                    targets[i].0.name
                ));
                keep[i] = false;
            }
        }

        let mut transformed = source.to_string();
        for (i, (binding, span)) in targets.iter().enumerate().rev() {
            if !keep[i] {
                continue;
            }
            let original = &source[span.start..span.end];
            let replacement = format!(
                "{}.get(\"{}\", {})",
                self.mapping_ident, binding.name, original
            );
            transformed.replace_range(span.start..span.end, &replacement);
        }

        TransformResult {
            transformed_source: transformed,
            signature: signature.clone(),
            warnings,
        }
    }
}
