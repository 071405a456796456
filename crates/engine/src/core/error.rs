use thiserror::Error;

/// Fatal for the file it occurred on; the pipeline halts at EXTRACTED and
/// never retries automatically.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("source is not syntactically valid at line {line}: {detail}")]
    Invalid { line: usize, detail: String },

    #[error("parser failed to produce a tree")]
    NoTree,
}

/// Never fatal: every variant folds into `used_fallback = true` and the
/// pipeline proceeds with structural-only results.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment call timed out after {0} seconds")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("no enrichment provider configured")]
    Disabled,
}
