use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use db::{
    models::{
        conversation::ConversationError, journal::JournalError, mood_entry::MoodEntryError,
        user::UserError,
    },
    validation::ValidationError,
};
use services::services::{
    auth::AuthError, chatbot::ChatError, mood::MoodServiceError, tasbih::TasbihError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Mood(#[from] MoodServiceError),
    #[error(transparent)]
    MoodEntry(#[from] MoodEntryError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Tasbih(#[from] TasbihError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

fn database_status(e: &sqlx::Error) -> StatusCode {
    match e {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn user_status(e: &UserError) -> StatusCode {
    match e {
        UserError::NotFound => StatusCode::NOT_FOUND,
        UserError::Conflict(_) => StatusCode::CONFLICT,
        UserError::Validation(_) => StatusCode::BAD_REQUEST,
        UserError::Database(e) => database_status(e),
    }
}

fn journal_status(e: &JournalError) -> StatusCode {
    match e {
        JournalError::NotFound => StatusCode::NOT_FOUND,
        JournalError::Validation(_) => StatusCode::BAD_REQUEST,
        JournalError::Database(e) => database_status(e),
    }
}

fn mood_entry_status(e: &MoodEntryError) -> StatusCode {
    match e {
        MoodEntryError::NotFound => StatusCode::NOT_FOUND,
        MoodEntryError::Validation(_) => StatusCode::BAD_REQUEST,
        MoodEntryError::Database(e) => database_status(e),
    }
}

fn conversation_status(e: &ConversationError) -> StatusCode {
    match e {
        ConversationError::NotFound => StatusCode::NOT_FOUND,
        ConversationError::Validation(_) => StatusCode::BAD_REQUEST,
        ConversationError::Database(e) => database_status(e),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AccountDisabled => StatusCode::FORBIDDEN,
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::User(e) => user_status(e),
                AuthError::Database(e) => database_status(e),
                AuthError::Hash(_) | AuthError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::User(e) => user_status(e),
            ApiError::Journal(e) => journal_status(e),
            ApiError::Mood(e) => match e {
                MoodServiceError::Mood(_)
                | MoodServiceError::MissingInput
                | MoodServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                MoodServiceError::MoodEntry(e) => mood_entry_status(e),
                MoodServiceError::Journal(e) => journal_status(e),
                MoodServiceError::Database(e) => database_status(e),
            },
            ApiError::MoodEntry(e) => mood_entry_status(e),
            ApiError::Chat(e) => match e {
                ChatError::InvalidMessage { .. } => StatusCode::BAD_REQUEST,
                ChatError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                ChatError::NotFound => StatusCode::NOT_FOUND,
                ChatError::Conversation(e) => conversation_status(e),
                ChatError::Database(e) => database_status(e),
            },
            ApiError::Conversation(e) => conversation_status(e),
            ApiError::Tasbih(_) | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Database(e) => database_status(e),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else if status == StatusCode::NOT_FOUND
            && let ApiError::Database(_) = self
        {
            "not found".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ApiResponse::<()>::error(message))).into_response();
        if let ApiError::Chat(ChatError::RateLimited { retry_after_secs }) = &self
            && let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}
