//! Provider-neutral language model port.

use async_trait::async_trait;
use db::models::conversation::MessageRole;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("language model API key is not configured")]
    NotConfigured,
    #[error("language model rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("language model API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },
    #[error("network error talking to language model: {0}")]
    Network(String),
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("language model returned no text")]
    EmptyResponse,
}

impl LlmError {
    /// HTTP status of the upstream response, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } => Some(429),
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Blocked(_) | LlmError::EmptyResponse => Some(200),
            LlmError::NotConfigured | LlmError::Network(_) => None,
        }
    }
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system_instruction: String,
    /// Oldest first, not including `message`.
    pub history: Vec<ChatTurn>,
    pub message: String,
}

impl PromptRequest {
    /// Characters sent to the provider, for request logging.
    pub fn char_len(&self) -> usize {
        self.system_instruction.chars().count()
            + self
                .history
                .iter()
                .map(|t| t.content.chars().count())
                .sum::<usize>()
            + self.message.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub status_code: u16,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &PromptRequest) -> Result<ModelReply, LlmError>;

    fn model_name(&self) -> &str;

    /// False when no credentials are available; callers skip the call entirely.
    fn is_configured(&self) -> bool;
}
