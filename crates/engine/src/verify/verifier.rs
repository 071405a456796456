//! Integrity verification by re-extraction.
//!
//! The verifier never executes either program. It re-runs the structural
//! extractor on both texts and compares content hashes; a mismatch is
//! itemized name by name so nothing is silently dropped. Failure here is a
//! warning condition, not an error: the caller decides whether to accept an
//! unverified transform.

use crate::core::{ScannerKind, Signature, VerificationReport};
use crate::extract::StructuralExtractor;

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    extractor: StructuralExtractor,
}

impl Verifier {
    pub fn new(extractor: StructuralExtractor) -> Self {
        Self { extractor }
    }

    pub fn verify(&self, original: &str, transformed: &str) -> VerificationReport {
        let mut differences = Vec::new();

        let original_signature = match self.extractor.extract(original) {
            Ok(sig) => sig,
            Err(e) => {
                differences.push(format!("original source failed re-extraction: {}", e));
                Signature::new(ScannerKind::Custom, Vec::new())
            }
        };

        let transformed_signature = match self.extractor.extract(transformed) {
            Ok(sig) => sig,
            Err(e) => {
                differences.push(format!("transformed source failed re-extraction: {}", e));
                Signature::new(ScannerKind::Custom, Vec::new())
            }
        };

        let verified =
            differences.is_empty() && original_signature.content_hash == transformed_signature.content_hash;

        if !verified {
            differences.extend(itemize(&original_signature, &transformed_signature));
            tracing::warn!(
                differences = differences.len(),
                "signature mismatch after transform"
            );
        }

        VerificationReport {
            verified,
            original_signature,
            transformed_signature,
            differences,
        }
    }
}

fn itemize(original: &Signature, transformed: &Signature) -> Vec<String> {
    let mut differences = Vec::new();

    for (name, binding) in &original.bindings {
        match transformed.bindings.get(name) {
            None => differences.push(format!(
                "`{}` ({}) present only in original",
                name,
                binding.value.canonical()
            )),
            Some(other) if other.value.canonical() != binding.value.canonical() => {
                differences.push(format!(
                    "`{}` differs: original {} vs transformed {}",
                    name,
                    binding.value.canonical(),
                    other.value.canonical()
                ))
            }
            Some(_) => {}
        }
    }

    for (name, binding) in &transformed.bindings {
        if !original.bindings.contains_key(name) {
            differences.push(format!(
                "`{}` ({}) present only in transformed",
                name,
                binding.value.canonical()
            ));
        }
    }

    // Same pairs in a different order still hash differently; say so rather
    // than reporting an empty diff.
    if differences.is_empty() && original.content_hash != transformed.content_hash {
        differences.push("bindings agree by name and value but differ in order".to_string());
    }

    differences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::StructuralExtractor;
    use crate::transform::Externalizer;

    #[test]
    fn test_roundtrip_verifies() {
        let source = "mask = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)\n";
        let signature = StructuralExtractor::new().extract(source).unwrap();
        let result = Externalizer::new().transform(source, &signature);
        let report = Verifier::default().verify(source, &result.transformed_source);

        assert!(report.verified, "differences: {:?}", report.differences);
        assert_eq!(
            report.original_signature.content_hash,
            report.transformed_signature.content_hash
        );
    }

    #[test]
    fn test_mismatch_is_itemized() {
        let original = "mask = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)\n";
        let tampered = "mask = (df['gap'] >= 0.7) & (df['rsi'] >= 1000000)\n";
        let report = Verifier::default().verify(original, tampered);

        assert!(!report.verified);
        assert!(report.differences.iter().any(|d| d.contains("gap_min")));
        assert!(report.differences.iter().any(|d| d.contains("vol_min")));
        assert!(report.differences.iter().any(|d| d.contains("rsi_min")));
    }

    #[test]
    fn test_unparseable_transform_is_reported_not_panicked() {
        let original = "mask = df['gap'] >= 0.5\n";
        let report = Verifier::default().verify(original, "mask = (df['gap'] >= 0.5\n");
        assert!(!report.verified);
        assert!(report
            .differences
            .iter()
            .any(|d| d.contains("failed re-extraction")));
    }

    #[test]
    fn test_order_change_is_named_as_order() {
        let a = "m = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)\n";
        let b = "m = (df['vol'] >= 1000000) & (df['gap'] >= 0.5)\n";
        let report = Verifier::default().verify(a, b);
        assert!(!report.verified);
        assert!(report.differences.iter().any(|d| d.contains("order")));
    }
}
