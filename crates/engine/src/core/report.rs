use crate::core::binding::ParameterBinding;
use crate::core::signature::Signature;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Owned by the caller; the engine never retains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResult {
    pub transformed_source: String,

    pub signature: Signature,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

impl TransformResult {
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,

    pub original_signature: Signature,

    pub transformed_signature: Signature,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub differences: Vec<String>,
}

/// One independently-evaluable pattern carved out of a multi-pattern source.
/// Bindings are duplicated by value when two units share one, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerUnit {
    pub unit_name: String,

    pub code: String,

    pub bindings: IndexMap<String, ParameterBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub bindings: Vec<ParameterBinding>,

    pub used_fallback: bool,
}

impl EnrichmentResult {
    pub fn fallback() -> Self {
        Self {
            bindings: Vec::new(),
            used_fallback: true,
        }
    }
}

/// States of one file's trip through the pipeline. Everything after
/// `Extracted` is reachable only once extraction has succeeded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Ingested,
    Extracted,
    Split,
    Unsplit,
    Transformed,
    Verified,
    Unverified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit: ScannerUnit,

    pub transform: TransformResult,

    pub verification: VerificationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub state: PipelineState,

    pub units: Vec<UnitOutcome>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,

    pub used_enrichment_fallback: bool,
}

impl PipelineOutcome {
    pub fn all_verified(&self) -> bool {
        !self.units.is_empty() && self.units.iter().all(|u| u.verification.verified)
    }
}
