//! Ordered parameter signatures and their content hash.
//!
//! A signature is the proof object for the no-drift guarantee: the transform
//! is accepted only when the rewritten source re-derives a signature with the
//! same hash. The hash covers the ordered (name, canonical value) pairs and
//! nothing else, so confidence scores and spans can differ between the two
//! sides without breaking verification.

use crate::core::binding::{LiteralValue, ParameterBinding};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScannerKind {
    /// A named filter-construction function drives the scan.
    FilterFunction,
    /// Thresholds live in a flat parameter table the scan reads from.
    ParamTable,
    Custom,
}

impl std::fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScannerKind::FilterFunction => write!(f, "filter-function"),
            ScannerKind::ParamTable => write!(f, "param-table"),
            ScannerKind::Custom => write!(f, "custom"),
        }
    }
}

/// Immutable once built; equality is hash equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub kind: ScannerKind,

    pub bindings: IndexMap<String, ParameterBinding>,

    pub content_hash: String,
}

impl Signature {
    pub fn new(kind: ScannerKind, bindings: Vec<ParameterBinding>) -> Self {
        let mut map = IndexMap::with_capacity(bindings.len());
        for binding in bindings {
            map.insert(binding.name.clone(), binding);
        }
        let content_hash = Self::hash_bindings(&map);
        Self {
            kind,
            bindings: map,
            content_hash,
        }
    }

    /// Digest over the ordered, canonicalized (name, value) pairs. Insertion
    /// order is significant: the same bindings in a different order hash
    /// differently.
    fn hash_bindings(bindings: &IndexMap<String, ParameterBinding>) -> String {
        let mut hasher = Sha256::new();
        for (name, binding) in bindings {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(binding.value.canonical().as_bytes());
            hasher.update(b";");
        }
        hex::encode(hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterBinding> {
        self.bindings.get(name)
    }

    pub fn structural_bindings(&self) -> impl Iterator<Item = &ParameterBinding> {
        self.bindings.values().filter(|b| b.is_structural())
    }

    pub fn value_of(&self, name: &str) -> Option<&LiteralValue> {
        self.bindings.get(name).map(|b| &b.value)
    }

    /// Rebuild with extra bindings appended. Existing names win collisions:
    /// a structural binding has a verifiable span, an enriched proposal is
    /// only additive.
    pub fn with_appended(&self, extra: Vec<ParameterBinding>) -> Self {
        let mut merged: Vec<ParameterBinding> = self.bindings.values().cloned().collect();
        for binding in extra {
            if self.bindings.contains_key(&binding.name) {
                tracing::debug!(name = %binding.name, "dropping enriched binding shadowed by structural");
                continue;
            }
            merged.push(binding);
        }
        Self::new(self.kind, merged)
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.content_hash == other.content_hash
    }
}

impl Eq for Signature {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binding::SourceSpan;

    fn binding(name: &str, value: LiteralValue) -> ParameterBinding {
        ParameterBinding::structural(name, value, SourceSpan::new(0, 1, 1, 0))
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = Signature::new(
            ScannerKind::Custom,
            vec![
                binding("gap_min", LiteralValue::Number(0.5)),
                binding("vol_min", LiteralValue::Int(1_000_000)),
            ],
        );
        let b = Signature::new(
            ScannerKind::Custom,
            vec![
                binding("vol_min", LiteralValue::Int(1_000_000)),
                binding("gap_min", LiteralValue::Number(0.5)),
            ],
        );
        assert_ne!(a.content_hash, b.content_hash);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_ignores_confidence_and_span() {
        let structural = binding("gap_min", LiteralValue::Number(0.5));
        let enriched = ParameterBinding::enriched("gap_min", LiteralValue::Number(0.5), 0.4);
        let a = Signature::new(ScannerKind::Custom, vec![structural]);
        let b = Signature::new(ScannerKind::Custom, vec![enriched]);
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_appended_keeps_structural_on_collision() {
        let base = Signature::new(
            ScannerKind::FilterFunction,
            vec![binding("gap_min", LiteralValue::Number(0.5))],
        );
        let merged = base.with_appended(vec![
            ParameterBinding::enriched("gap_min", LiteralValue::Number(9.9), 0.8),
            ParameterBinding::enriched("float_max", LiteralValue::Int(50_000_000), 0.7),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.value_of("gap_min"),
            Some(&LiteralValue::Number(0.5))
        );
        assert_eq!(merged.bindings["float_max"].confidence, 0.7);
    }
}
