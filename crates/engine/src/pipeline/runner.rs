//! Pipeline orchestration.
//!
//! One run is a pure function of one source text:
//! `INGESTED → EXTRACTED → {SPLIT | UNSPLIT} → TRANSFORMED → VERIFIED |
//! UNVERIFIED`, failing terminally only at extraction. The enrichment call is
//! the sole suspend point; everything else is synchronous, and a batch of
//! files is just independent runs — rayon fans them out with no shared
//! mutable state and no ordering requirements between files.

use crate::config::EngineConfig;
use crate::core::{
    ParameterBinding, ParseError, PipelineOutcome, PipelineState, ScannerKind, ScannerUnit,
    Signature, UnitOutcome,
};
use crate::enrich::{EnrichmentExtractor, EnrichmentProvider};
use crate::extract::StructuralExtractor;
use crate::split::{SplitOutcome, Splitter, WHOLE_FILE_UNIT};
use crate::transform::Externalizer;
use crate::verify::Verifier;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Duration;

pub struct PipelineRunner {
    config: EngineConfig,
    extractor: StructuralExtractor,
    externalizer: Externalizer,
    verifier: Verifier,
    splitter: Splitter,
    enrichment: Option<EnrichmentExtractor>,
}

impl PipelineRunner {
    pub fn new(config: EngineConfig) -> Self {
        let extractor = StructuralExtractor::with_mapping_ident(&config.mapping_ident);
        let externalizer = Externalizer::with_mapping_ident(&config.mapping_ident);
        let verifier = Verifier::new(extractor.clone());
        let splitter = Splitter::new(extractor.clone());
        Self {
            config,
            extractor,
            externalizer,
            verifier,
            splitter,
            enrichment: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn EnrichmentProvider>) -> Self {
        self.enrichment = Some(
            EnrichmentExtractor::new(provider)
                .with_threshold(self.config.enrichment.threshold_k)
                .with_timeout(Duration::from_secs(self.config.enrichment.timeout_seconds)),
        );
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full pipeline over one file, including the optional enrichment pass.
    pub async fn run(&self, source: &str) -> Result<PipelineOutcome, ParseError> {
        tracing::debug!(state = ?PipelineState::Ingested, bytes = source.len(), "pipeline state");
        let signature = self.extractor.extract(source)?;
        tracing::debug!(state = ?PipelineState::Extracted, bindings = signature.len(), "pipeline state");

        let mut warnings = Vec::new();
        let mut used_fallback = false;

        let signature = match &self.enrichment {
            Some(enrichment) => {
                let prior: Vec<ParameterBinding> = signature.bindings.values().cloned().collect();
                if enrichment.should_enrich(&prior) {
                    let result = enrichment.enrich(source, &prior).await;
                    used_fallback = result.used_fallback;
                    if used_fallback {
                        warnings.push(
                            "enrichment unavailable; proceeding with structural-only bindings"
                                .to_string(),
                        );
                    }
                    signature.with_appended(result.bindings)
                } else {
                    signature
                }
            }
            None => signature,
        };

        Ok(self.finish(source, signature, warnings, used_fallback))
    }

    /// Structural-only pipeline; never suspends. Behavior is identical to
    /// `run` on a runner without a provider.
    pub fn run_sync(&self, source: &str) -> Result<PipelineOutcome, ParseError> {
        tracing::debug!(state = ?PipelineState::Ingested, bytes = source.len(), "pipeline state");
        let signature = self.extractor.extract(source)?;
        tracing::debug!(state = ?PipelineState::Extracted, bindings = signature.len(), "pipeline state");
        Ok(self.finish(source, signature, Vec::new(), false))
    }

    /// N independent files, processed in parallel. Each entry is its own
    /// run: one bad file fails its own slot and nothing else.
    pub fn run_batch(&self, sources: &[String]) -> Vec<Result<PipelineOutcome, ParseError>> {
        sources
            .par_iter()
            .map(|source| self.run_sync(source))
            .collect()
    }

    fn finish(
        &self,
        source: &str,
        signature: Signature,
        mut warnings: Vec<String>,
        used_fallback: bool,
    ) -> PipelineOutcome {
        let split_outcome = if self.config.split.enabled {
            match self.splitter.split(source) {
                Ok(outcome) => outcome,
                Err(e) => {
                    // extraction succeeded, so this is unexpected; degrade
                    warnings.push(format!("split pass failed: {}; treating as one unit", e));
                    SplitOutcome {
                        units: vec![whole_file_unit(source, &signature)],
                        warnings: Vec::new(),
                    }
                }
            }
        } else {
            SplitOutcome {
                units: vec![whole_file_unit(source, &signature)],
                warnings: Vec::new(),
            }
        };

        let was_split = split_outcome.is_split();
        warnings.extend(split_outcome.warnings);
        let split_state = if was_split {
            PipelineState::Split
        } else {
            PipelineState::Unsplit
        };
        tracing::debug!(state = ?split_state, units = split_outcome.units.len(), "pipeline state");

        // An unsplit file is the parent itself: its unit carries the full
        // (possibly enriched) signature, not the splitter's structural view.
        let units = if was_split {
            split_outcome.units
        } else {
            vec![whole_file_unit(source, &signature)]
        };

        let mut outcomes = Vec::with_capacity(units.len());
        for unit in units {
            let (unit_signature, unit_source) = if was_split {
                // unit code has its own offsets; re-derive spans against it
                match self.extractor.extract(&unit.code) {
                    Ok(sig) => (sig, unit.code.clone()),
                    Err(e) => {
                        warnings.push(format!(
                            "unit `{}` failed re-extraction ({}); left untransformed",
                            unit.unit_name, e
                        ));
                        (
                            Signature::new(ScannerKind::Custom, Vec::new()),
                            unit.code.clone(),
                        )
                    }
                }
            } else {
                (signature.clone(), source.to_string())
            };

            let mut transform = self.externalizer.transform(&unit_source, &unit_signature);
            let verification = self
                .verifier
                .verify(&unit_source, &transform.transformed_source);
            if !verification.verified {
                transform.warnings.extend(
                    verification
                        .differences
                        .iter()
                        .map(|d| format!("verification mismatch: {}", d)),
                );
            }

            outcomes.push(UnitOutcome {
                unit,
                transform,
                verification,
            });
        }

        tracing::debug!(state = ?PipelineState::Transformed, "pipeline state");
        let state = if outcomes.iter().all(|o| o.verification.verified) {
            PipelineState::Verified
        } else {
            PipelineState::Unverified
        };
        tracing::debug!(state = ?state, "pipeline state");

        PipelineOutcome {
            state,
            units: outcomes,
            warnings,
            used_enrichment_fallback: used_fallback,
        }
    }
}

fn whole_file_unit(source: &str, signature: &Signature) -> ScannerUnit {
    ScannerUnit {
        unit_name: WHOLE_FILE_UNIT.to_string(),
        code: source.to_string(),
        bindings: signature.bindings.clone(),
    }
}
