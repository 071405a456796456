//! paramlift - parameter-integrity transformation for scanner scripts
//!
//! Takes arbitrary source text implementing a tabular-data filtering routine,
//! extracts every literal threshold bound to a filtering comparison, rewrites
//! those literals into configurable lookups without touching any other byte,
//! and proves the rewrite drifted nothing by re-deriving the parameter
//! signature from the transformed text. Sources that encode several
//! independent filter patterns are split into standalone units with
//! non-overlapping parameter ownership.
//!
//! Every pipeline run is a pure function of its input: no global registries,
//! no cross-run caches, no shared mutable state. The one suspend point is the
//! optional enrichment call, which is best-effort and falls back to
//! structural-only results on any failure.

pub mod config;
pub mod core;
pub mod enrich;
pub mod extract;
pub mod pipeline;
pub mod split;
pub mod transform;
pub mod verify;

pub use config::{EngineConfig, EnrichmentSettings, SplitSettings};
pub use core::{
    BindingOrigin, EnrichmentError, EnrichmentResult, LiteralValue, ParameterBinding, ParseError,
    PipelineOutcome, PipelineState, ScannerKind, ScannerUnit, Signature, SourceSpan,
    TransformResult, UnitOutcome, VerificationReport,
};
pub use enrich::{EnrichmentExtractor, EnrichmentProvider, MockProvider, OpenAIProvider};
pub use extract::StructuralExtractor;
pub use pipeline::PipelineRunner;
pub use split::{SplitOutcome, Splitter};
pub use transform::Externalizer;
pub use verify::Verifier;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runner_builds() {
        let runner = PipelineRunner::new(EngineConfig::default());
        assert_eq!(runner.config().mapping_ident, "params");
    }
}
