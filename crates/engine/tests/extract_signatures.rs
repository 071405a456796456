use paramlift_engine::{LiteralValue, ParseError, ScannerKind, StructuralExtractor};

#[test]
fn test_two_threshold_scan_extracts_in_source_order() {
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
fn test_swapped_comparisons_change_order_and_hash() {
    let forward = "mask = (df['gap'] >= 0.5) & (df['vol'] >= 1000000)\n";
    let swapped = "mask = (df['vol'] >= 1000000) & (df['gap'] >= 0.5)\n";

    let extractor = StructuralExtractor::new();
    let a = extractor.extract(forward).unwrap();
    let b = extractor.extract(swapped).unwrap();

    let names_b: Vec<&str> = b.bindings.keys().map(String::as_str).collect();
    assert_eq!(names_b, vec!["vol_min", "gap_min"]);
    assert_ne!(a.content_hash, b.content_hash);
}

#[test]
fn test_extract_twice_yields_identical_hash() {
    let source = "\
def scan_momentum(df):
    hot = (df['gap'] >= 0.5) | (df['change'] >= 3.0)
    return df[hot & (df['vol'] >= 1000000)]
";
    let extractor = StructuralExtractor::new();
    let first = extractor.extract(source).unwrap();
    let second = extractor.extract(source).unwrap();
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(first.kind, ScannerKind::FilterFunction);
}

#[test]
fn test_lookup_table_literal_is_not_a_binding() {
    let source = "\
price_tiers = [1.0, 5.0, 20.0]
watchlist = df[df['sector'].isin(['Tech', 'Biotech'])]
";
    let sig = StructuralExtractor::new().extract(source).unwrap();
    assert_eq!(sig.len(), 0);
}

#[test]
fn test_unbalanced_parentheses_fail_extraction() {
    let source = "mask = (df['gap'] >= 0.5 & (df['vol'] >= 1000000)\n";
    let err = StructuralExtractor::new().extract(source).unwrap_err();
    assert!(matches!(err, ParseError::Invalid { .. }));
}

#[test]
fn test_deeply_nested_combinators_capture_every_threshold() {
    let source = "\
mask = ~((df['gap'] < 0.5) | ((df['vol'] < 1000000) & (df['close'] < 2.0))) & (df['rsi'] <= 70)
";
    let sig = StructuralExtractor::new().extract(source).unwrap();
    let names: Vec<&str> = sig.bindings.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["gap_max", "vol_max", "close_max", "rsi_max"]);
}

#[test]
fn test_string_and_bool_literals_qualify() {
    let source = "\
mask = (df['exchange'] == 'NASDAQ') & (df['is_etf'] != True)
";
    let sig = StructuralExtractor::new().extract(source).unwrap();
    assert_eq!(
        sig.value_of("exchange_eq"),
        Some(&LiteralValue::Str("NASDAQ".into()))
    );
    assert_eq!(sig.value_of("is_etf_ne"), Some(&LiteralValue::Bool(true)));
}

#[test]
fn test_param_table_kind_detection() {
    let source = "\
settings = {'gap_min': 0.5, 'vol_min': 1000000}
mask = df['gap'] >= 0.5
";
    let sig = StructuralExtractor::new().extract(source).unwrap();
    assert_eq!(sig.kind, ScannerKind::ParamTable);
}
