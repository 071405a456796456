//! Best-effort enrichment around the structural pass.
//!
//! The inference call is additive only: one attempt, bounded by a timeout,
//! and any failure degrades to the structural-only result. Structural
//! bindings win name collisions — they carry a verifiable span, a proposal
//! does not.

use crate::core::{EnrichmentResult, ParameterBinding};
use crate::enrich::provider::{EnrichmentProvider, EnrichmentRequest};
use crate::enrich::schemas::EnrichmentReply;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD_K: usize = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

#[derive(Clone)]
pub struct EnrichmentExtractor {
    provider: Arc<dyn EnrichmentProvider>,
    threshold_k: usize,
    timeout: Duration,
}

impl EnrichmentExtractor {
    pub fn new(provider: Arc<dyn EnrichmentProvider>) -> Self {
        Self {
            provider,
            threshold_k: DEFAULT_THRESHOLD_K,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_threshold(mut self, threshold_k: usize) -> Self {
        self.threshold_k = threshold_k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the structural pass found too few bindings to stand alone.
    pub fn should_enrich(&self, prior: &[ParameterBinding]) -> bool {
        prior.len() < self.threshold_k
    }

    pub async fn enrich(
        &self,
        source: &str,
        prior: &[ParameterBinding],
    ) -> EnrichmentResult {
        let request = EnrichmentRequest {
            source: source.to_string(),
            prior_names: prior.iter().map(|b| b.name.clone()).collect(),
        };

        let reply = match tokio::time::timeout(self.timeout, self.provider.propose(request)).await
        {
            Err(_) => {
                warn!(
                    timeout_seconds = self.timeout.as_secs(),
                    "enrichment timed out, falling back to structural-only"
                );
                return EnrichmentResult::fallback();
            }
            Ok(Err(e)) => {
                warn!(error = %e, "enrichment failed, falling back to structural-only");
                return EnrichmentResult::fallback();
            }
            Ok(Ok(reply)) => reply,
        };

        let parsed = match EnrichmentReply::parse(&reply.content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, model = %reply.model, "unparseable enrichment reply");
                return EnrichmentResult::fallback();
            }
        };

        let prior_names: HashSet<&str> = prior.iter().map(|b| b.name.as_str()).collect();
        let bindings: Vec<ParameterBinding> = parsed
            .parameters
            .iter()
            .filter_map(|p| p.to_binding())
            .filter(|b| !prior_names.contains(b.name.as_str()))
            .collect();

        debug!(
            proposed = parsed.parameters.len(),
            accepted = bindings.len(),
            "enrichment merged"
        );

        EnrichmentResult {
            bindings,
            used_fallback: false,
        }
    }
}
