//! Client for the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use db::models::conversation::MessageRole;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::llm::{LanguageModel, LlmError, ModelReply, PromptRequest};
use crate::services::config::LlmConfig;

pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 0.9;
pub const MAX_OUTPUT_TOKENS: u32 = 512;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

impl<'a> Content<'a> {
    fn new(role: Option<&'static str>, text: &'a str) -> Self {
        Self {
            role,
            parts: [Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<secret>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mirror-of-heart/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn error_for(response: reqwest::Response) -> LlmError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return LlmError::RateLimited { retry_after_secs };
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: &PromptRequest) -> Result<ModelReply, LlmError> {
        let Some(api_key) = &self.api_key else {
            return Err(LlmError::NotConfigured);
        };

        let mut contents: Vec<Content<'_>> = request
            .history
            .iter()
            .map(|turn| Content::new(Some(role_name(turn.role)), &turn.content))
            .collect();
        contents.push(Content::new(Some("user"), &request.message));

        let body = GenerateRequest {
            system_instruction: Content::new(None, &request.system_instruction),
            contents,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        // The key travels in the query string, so strip URLs from transport errors.
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::error_for(response).await;
            tracing::warn!(status = status.as_u16(), error = %err, "Gemini request failed");
            return Err(err);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.without_url().to_string()))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(LlmError::Blocked(reason));
        }

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(ModelReply {
            text: text.to_string(),
            status_code: status.as_u16(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
