use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use super::mood_entry::Emotion;
use crate::validation::{CONVERSATION_TITLE_MAX, ValidationError, validate_max_len};
use utils::text::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, EnumString, Display)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Where an assistant reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, EnumString, Display)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageSource {
    Model,
    Fallback,
    Cache,
    Crisis,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub emotion: Option<Emotion>,
    pub source: Option<MessageSource>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub emotion: Option<Emotion>,
    pub source: Option<MessageSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConversation {
    pub title: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const CONVERSATION_COLUMNS: &str = "id, user_id, title, is_archived, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, emotion, source, created_at";

fn clean_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required("title"));
    }
    validate_max_len("title", title, CONVERSATION_TITLE_MAX)?;
    Ok(title.to_string())
}

impl Conversation {
    /// Create a conversation. Titles longer than the column limit are cut
    /// rather than rejected since they are usually derived from a message.
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        title: &str,
    ) -> Result<Self, ConversationError> {
        let title = clean_title(&truncate_chars(title.trim(), CONVERSATION_TITLE_MAX))?;
        let now = Utc::now();

        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "INSERT INTO conversations (id, user_id, title, is_archived, created_at, updated_at)
             VALUES ($1, $2, $3, 0, $4, $4)
             RETURNING {CONVERSATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(conversation)
    }

    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Most recently active first.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let archived = if include_archived {
            ""
        } else {
            " AND is_archived = 0"
        };
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE user_id = $1{archived}
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateConversation,
    ) -> Result<Self, ConversationError> {
        let existing = Self::find_for_user(pool, id, user_id)
            .await?
            .ok_or(ConversationError::NotFound)?;
        let title = match &data.title {
            Some(title) => clean_title(title)?,
            None => existing.title,
        };
        let is_archived = data.is_archived.unwrap_or(existing.is_archived);

        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "UPDATE conversations SET title = $3, is_archived = $4, updated_at = $5
             WHERE id = $1 AND user_id = $2
             RETURNING {CONVERSATION_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(is_archived)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(conversation)
    }

    /// Bump `updated_at` after new messages arrive.
    pub async fn touch(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Deletes the conversation and, by cascade, its messages.
    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(pool)
            .await
    }
}

impl Message {
    pub async fn create(pool: &SqlitePool, data: &CreateMessage) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (id, conversation_id, role, content, emotion, source, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.conversation_id)
        .bind(data.role)
        .bind(&data.content)
        .bind(data.emotion)
        .bind(data.source)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Full transcript, oldest first.
    pub async fn find_by_conversation(
        pool: &SqlitePool,
        conversation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    /// The last `limit` messages, returned oldest first for prompt building.
    pub async fn recent(
        pool: &SqlitePool,
        conversation_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at DESC, rowid DESC
             LIMIT $2"
        ))
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        messages.reverse();
        Ok(messages)
    }

    pub async fn count_for_conversation(
        pool: &SqlitePool,
        conversation_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(pool)
            .await
    }
}
