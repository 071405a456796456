use crate::core::EnrichmentError;
use crate::enrich::provider::{EnrichmentProvider, EnrichmentRequest, ProviderReply};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Test double for the enrichment exchange: canned reply, hard failure, or a
/// stall long enough to trip the caller's timeout.
pub struct MockProvider {
    reply: Option<String>,
    delay: Option<Duration>,
    should_fail: bool,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn with_reply(content: &str) -> Self {
        Self {
            reply: Some(content.to_string()),
            delay: None,
            should_fail: false,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: None,
            should_fail: true,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self {
            reply: Some(r#"{"parameters": []}"#.to_string()),
            delay: Some(delay),
            should_fail: false,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentProvider for MockProvider {
    async fn propose(&self, _request: EnrichmentRequest) -> Result<ProviderReply, EnrichmentError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail {
            return Err(EnrichmentError::Transport(
                "mock provider configured to fail".to_string(),
            ));
        }

        Ok(ProviderReply {
            content: self.reply.clone().unwrap_or_default(),
            model: "mock-model".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
