use crate::core::EnrichmentError;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, ChatCompletionResponseFormat,
        ChatCompletionResponseFormatType, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub source: String,
    pub prior_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub content: String,
    pub model: String,
}

/// One synchronous request/response exchange with the inference service.
/// Implementations must not retry internally: the pipeline's latency bound
/// comes from a single bounded attempt, and any failure means fallback.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn propose(&self, request: EnrichmentRequest) -> Result<ProviderReply, EnrichmentError>;

    fn model_name(&self) -> &str;
}

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    pub fn new(model: Option<String>) -> Result<Self, EnrichmentError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EnrichmentError::Transport("OPENAI_API_KEY not set".to_string()))?;
        Ok(Self::with_config(
            api_key,
            model.unwrap_or_else(|| "gpt-4o".to_string()),
            0.2,
            1500,
        ))
    }

    pub fn with_config(api_key: String, model: String, temperature: f32, max_tokens: u32) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl EnrichmentProvider for OpenAIProvider {
    async fn propose(&self, request: EnrichmentRequest) -> Result<ProviderReply, EnrichmentError> {
        let system_message = ChatCompletionRequestSystemMessage {
            content: super::prompts::SYSTEM_PROMPT.to_string(),
            ..Default::default()
        };

        let user_message = ChatCompletionRequestUserMessage {
            content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                super::prompts::user_prompt(&request),
            ),
            ..Default::default()
        };

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_message),
                ChatCompletionRequestMessage::User(user_message),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens as u16)
            .response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            })
            .build()
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;

        debug!(model = %self.model, "sending enrichment request");

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                EnrichmentError::MalformedReply("no content in response".to_string())
            })?;

        Ok(ProviderReply {
            content,
            model: response.model,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
