//! Supportive chat backed by a hosted language model, with canned fallbacks.

pub mod fallback;
pub mod gemini;
pub mod llm;
pub mod prompt;
pub mod service;

pub use gemini::GeminiClient;
pub use llm::{ChatTurn, LanguageModel, LlmError, ModelReply, PromptRequest};
pub use service::{ChatError, ChatReply, ChatRequest, ChatbotService, ChatbotStatus};
