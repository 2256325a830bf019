use std::sync::Arc;

use db::DBService;
use services::services::{
    auth::{AuthService, JwtService, PasswordHasher},
    chatbot::{ChatbotService, GeminiClient, LanguageModel},
    config::Config,
    mood::{MoodAnalyzer, MoodService},
    tasbih::TasbihService,
};
use sqlx::SqlitePool;

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub mood: MoodService,
    pub chatbot: ChatbotService,
    pub tasbih: TasbihService,
}

impl AppState {
    pub fn new(db: DBService, config: Config) -> anyhow::Result<Self> {
        let model = Arc::new(GeminiClient::new(&config.llm)?);
        if !model.is_configured() {
            tracing::warn!("GEMINI_API_KEY not set; chatbot will answer with fallbacks only");
        }
        Ok(Self::with_components(
            db,
            config,
            PasswordHasher::default(),
            model,
        ))
    }

    /// Assemble state from explicit parts. Tests use this to swap in a cheap
    /// password hasher and a scripted model.
    pub fn with_components(
        db: DBService,
        config: Config,
        hasher: PasswordHasher,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let jwt = JwtService::new(config.jwt_secret.clone(), config.token_ttl_hours);
        let auth = AuthService::new(hasher, jwt, config.admin_emails.clone());
        let mood = MoodService::new(MoodAnalyzer::new(config.cache_capacity));
        let chatbot = ChatbotService::new(
            model,
            mood.clone(),
            config.cache_capacity,
            config.chat_rate_limit,
        );

        Self {
            db,
            config: Arc::new(config),
            auth: Arc::new(auth),
            mood,
            chatbot,
            tasbih: TasbihService::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
