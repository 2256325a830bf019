use std::{sync::Arc, time::{Duration, Instant}};

use db::models::{
    api_log::{ApiLog, CreateApiLog},
    conversation::{
        Conversation, ConversationError, CreateMessage, Message, MessageRole, MessageSource,
    },
    mood_entry::{CreateMoodEntry, Emotion, MoodEntry, MoodSource},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use utils::text::{char_len, normalize, sha256_hex, truncate_chars};
use uuid::Uuid;

use super::{
    fallback::{CRISIS_REPLY, fallback_reply, is_crisis},
    llm::{LanguageModel, LlmError, PromptRequest},
    prompt::{self, HISTORY_LIMIT},
};
use crate::services::{
    cache::BoundedCache,
    mood::{MoodAnalysis, MoodService},
    rate_limit::RateLimiter,
};

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_REPLY_CHARS: usize = 4000;
pub const CONVERSATION_TITLE_CHARS: usize = 50;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
const PROVIDER: &str = "gemini";
const ENDPOINT: &str = "generateContent";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must be between 1 and {max} characters")]
    InvalidMessage { max: usize },
    #[error("too many chat messages, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("conversation not found")]
    NotFound,
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub conversation: Conversation,
    pub user_message: Message,
    pub assistant_message: Message,
    pub mood: MoodAnalysis,
    pub source: MessageSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatbotStatus {
    pub model: String,
    pub configured: bool,
}

#[derive(Clone)]
pub struct ChatbotService {
    model: Arc<dyn LanguageModel>,
    mood: MoodService,
    cache: BoundedCache<String, String>,
    limiter: RateLimiter,
}

impl ChatbotService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        mood: MoodService,
        cache_capacity: usize,
        rate_limit: u32,
    ) -> Self {
        Self {
            model,
            mood,
            cache: BoundedCache::new(cache_capacity),
            limiter: RateLimiter::new(rate_limit, RATE_LIMIT_WINDOW),
        }
    }

    pub fn status(&self) -> ChatbotStatus {
        ChatbotStatus {
            model: self.model.model_name().to_string(),
            configured: self.model.is_configured(),
        }
    }

    pub fn cached_replies(&self) -> usize {
        self.cache.len()
    }

    /// Forget rate-limit windows that have fully expired.
    pub fn prune_rate_limits(&self) {
        self.limiter.prune();
    }

    pub async fn reply(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        request: &ChatRequest,
    ) -> Result<ChatReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() || char_len(message) > MAX_MESSAGE_CHARS {
            return Err(ChatError::InvalidMessage {
                max: MAX_MESSAGE_CHARS,
            });
        }

        let existing = match request.conversation_id {
            Some(id) => Some(
                Conversation::find_for_user(pool, id, user_id)
                    .await?
                    .ok_or(ChatError::NotFound)?,
            ),
            None => None,
        };

        // Only requests that will be answered count against the window.
        self.limiter
            .check(user_id)
            .map_err(|wait| ChatError::RateLimited {
                retry_after_secs: wait.as_secs_f64().ceil().max(1.0) as u64,
            })?;

        let (conversation, history) = match existing {
            Some(conversation) => {
                let history = Message::recent(pool, conversation.id, HISTORY_LIMIT as i64).await?;
                (conversation, history)
            }
            None => {
                let title = truncate_chars(message, CONVERSATION_TITLE_CHARS);
                (Conversation::create(pool, user_id, &title).await?, vec![])
            }
        };

        let analyzed = self.mood.analyze(message);
        let mood = analyzed.clone().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Mood analysis failed for chat message");
            MoodAnalysis::neutral()
        });

        let normalized = normalize(message);
        let cache_key = sha256_hex(&normalized);
        let first_message = history.is_empty();

        let (text, source) = if is_crisis(&normalized) {
            tracing::info!(%user_id, conversation_id = %conversation.id, "Crisis language detected");
            (CRISIS_REPLY.to_string(), MessageSource::Crisis)
        } else if let Some(cached) = first_message.then(|| self.cache.get(&cache_key)).flatten() {
            (cached, MessageSource::Cache)
        } else {
            let prompt = prompt::build(&history, &mood, message);
            match self.call_model(pool, user_id, &prompt).await {
                Ok(text) => {
                    let text = truncate_chars(text.trim(), MAX_REPLY_CHARS);
                    if first_message {
                        self.cache.insert(cache_key, text.clone());
                    }
                    (text, MessageSource::Model)
                }
                Err(_) => (fallback_reply(mood.emotion).to_string(), MessageSource::Fallback),
            }
        };

        let user_message = Message::create(
            pool,
            &CreateMessage {
                conversation_id: conversation.id,
                role: MessageRole::User,
                content: message.to_string(),
                emotion: Some(mood.emotion),
                source: None,
            },
        )
        .await?;
        let assistant_message = Message::create(
            pool,
            &CreateMessage {
                conversation_id: conversation.id,
                role: MessageRole::Assistant,
                content: text,
                emotion: None,
                source: Some(source),
            },
        )
        .await?;
        Conversation::touch(pool, conversation.id).await?;
        let conversation = Conversation::find_for_user(pool, conversation.id, user_id)
            .await?
            .unwrap_or(conversation);

        if let Ok(analysis) = &analyzed
            && analysis.emotion != Emotion::Neutral
        {
            self.record_chat_mood(pool, user_id, analysis).await;
        }

        Ok(ChatReply {
            conversation,
            user_message,
            assistant_message,
            mood,
            source,
        })
    }

    /// Call the model and log the attempt. Returns `NotConfigured` without a
    /// network round trip when no API key is set.
    async fn call_model(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        prompt: &PromptRequest,
    ) -> Result<String, LlmError> {
        if !self.model.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let started = Instant::now();
        let result = self.model.generate(prompt).await;
        let latency_ms = started.elapsed().as_millis() as i64;

        let log = match &result {
            Ok(reply) => CreateApiLog {
                user_id: Some(user_id),
                provider: PROVIDER.to_string(),
                endpoint: ENDPOINT.to_string(),
                status_code: Some(i64::from(reply.status_code)),
                success: true,
                latency_ms,
                prompt_chars: prompt.char_len() as i64,
                response_chars: char_len(&reply.text) as i64,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, latency_ms, "Language model call failed, using fallback");
                CreateApiLog {
                    user_id: Some(user_id),
                    provider: PROVIDER.to_string(),
                    endpoint: ENDPOINT.to_string(),
                    status_code: e.status_code().map(i64::from),
                    success: false,
                    latency_ms,
                    prompt_chars: prompt.char_len() as i64,
                    response_chars: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        if let Err(e) = ApiLog::create(pool, &log).await {
            tracing::error!(error = %e, "Failed to record API call");
        }

        result.map(|reply| reply.text)
    }

    async fn record_chat_mood(&self, pool: &SqlitePool, user_id: Uuid, analysis: &MoodAnalysis) {
        let entry = CreateMoodEntry {
            user_id,
            journal_id: None,
            source: MoodSource::Chat,
            emotion: analysis.emotion,
            intensity: analysis.intensity,
            sentiment: analysis.sentiment,
            confidence: analysis.confidence,
            note: None,
            keywords: analysis.keywords.clone(),
        };
        if let Err(e) = MoodEntry::create(pool, &entry).await {
            tracing::warn!(error = %e, "Failed to record chat mood entry");
        }
    }
}
