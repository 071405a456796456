use paramlift_engine::{Externalizer, StructuralExtractor, Verifier};

const MOMENTUM_SCAN: &str = "\
import pandas as pd

def scan_momentum(df):
    liquid = df['vol'] >= 1000000
    mover = (df['gap'] >= 0.5) | (df['change'] >= 3.0)
    cheap = df['close'] <= 20.0
    return df[liquid & mover & cheap]
";

#[test]
fn test_transform_only_touches_recorded_spans() {
    let signature = StructuralExtractor::new().extract(MOMENTUM_SCAN).unwrap();
    let result = Externalizer::new().transform(MOMENTUM_SCAN, &signature);

    // walk both strings, skipping the replacement regions: every byte
    // outside the recorded spans must be unchanged
    let mut spans: Vec<_> = signature
        .bindings
        .values()
        .filter_map(|b| b.span)
        .collect();
    spans.sort_by_key(|s| s.start);

    let mut original_pos = 0usize;
    let mut transformed_pos = 0usize;
    let transformed = &result.transformed_source;
    for span in &spans {
        let unchanged = &MOMENTUM_SCAN[original_pos..span.start];
        assert!(
            transformed[transformed_pos..].starts_with(unchanged),
            "bytes before span at {} changed",
            span.start
        );
        transformed_pos += unchanged.len();

        // the replacement embeds the original literal verbatim and ends at
        // its closing paren
        let literal = &MOMENTUM_SCAN[span.start..span.end];
        let rest = &transformed[transformed_pos..];
        assert!(rest.starts_with("params.get(\""), "replacement shape");
        let literal_at = rest.find(literal).expect("original literal kept");
        assert_eq!(&rest[literal_at + literal.len()..literal_at + literal.len() + 1], ")");

        transformed_pos += literal_at + literal.len() + 1;
        original_pos = span.end;
    }
    assert_eq!(&MOMENTUM_SCAN[original_pos..], &transformed[transformed_pos..]);
}

#[test]
fn test_roundtrip_verification_holds() {
    let signature = StructuralExtractor::new().extract(MOMENTUM_SCAN).unwrap();
    let result = Externalizer::new().transform(MOMENTUM_SCAN, &signature);
    let report = Verifier::default().verify(MOMENTUM_SCAN, &result.transformed_source);

    assert!(report.verified, "differences: {:?}", report.differences);
    assert!(report.differences.is_empty());
}

#[test]
fn test_transformed_source_reextracts_identical_names_and_values() {
    let extractor = StructuralExtractor::new();
    let signature = extractor.extract(MOMENTUM_SCAN).unwrap();
    let result = Externalizer::new().transform(MOMENTUM_SCAN, &signature);
    let again = extractor.extract(&result.transformed_source).unwrap();

    let original: Vec<(&String, String)> = signature
        .bindings
        .iter()
        .map(|(n, b)| (n, b.value.canonical()))
        .collect();
    let reextracted: Vec<(&String, String)> = again
        .bindings
        .iter()
        .map(|(n, b)| (n, b.value.canonical()))
        .collect();
    assert_eq!(original, reextracted);
}

#[test]
fn test_transform_with_no_bindings_is_identity() {
    let source = "rows = df.dropna()\n";
    let signature = StructuralExtractor::new().extract(source).unwrap();
    let result = Externalizer::new().transform(source, &signature);
    assert_eq!(result.transformed_source, source);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_negative_threshold_roundtrip() {
    let source = "mask = df['change'] >= -2.5\n";
    let extractor = StructuralExtractor::new();
    let signature = extractor.extract(source).unwrap();
    let result = Externalizer::new().transform(source, &signature);

    assert!(result
        .transformed_source
        .contains("params.get(\"change_min\", -2.5)"));
    let report = Verifier::default().verify(source, &result.transformed_source);
    assert!(report.verified, "differences: {:?}", report.differences);
}
