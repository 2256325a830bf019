use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Type, types::Json};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use super::{Page, Pagination, like_pattern, mood_entry::Emotion};
use crate::validation::{
    JOURNAL_CONTENT_MAX, JOURNAL_TITLE_MAX, ValidationError, normalize_tags, validate_max_len,
    validate_media_url,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, EnumString, Display, Default,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryType {
    #[default]
    Text,
    Image,
    Audio,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub entry_type: EntryType,
    pub media_url: Option<String>,
    pub tags: Json<Vec<String>>,
    pub mood: Option<Emotion>,
    pub mood_score: Option<f64>,
    pub is_private: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateJournalEntry {
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub entry_type: EntryType,
    pub media_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_private: Option<bool>,
}

/// Partial update; `None` leaves a field untouched. An empty title or
/// media URL clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJournalEntry {
    pub title: Option<String>,
    pub content: Option<String>,
    pub entry_type: Option<EntryType>,
    pub media_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

/// Owner-side list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalFilter {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub entry_type: Option<EntryType>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal entry not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Field values after trimming and validation, ready to bind.
struct ValidatedFields {
    title: Option<String>,
    content: String,
    entry_type: EntryType,
    media_url: Option<String>,
    tags: Vec<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_fields(
    title: Option<&str>,
    content: &str,
    entry_type: EntryType,
    media_url: Option<&str>,
    tags: &[String],
) -> Result<ValidatedFields, ValidationError> {
    let title = non_empty(title);
    if let Some(title) = &title {
        validate_max_len("title", title, JOURNAL_TITLE_MAX)?;
    }

    let content = content.trim().to_string();
    validate_max_len("content", &content, JOURNAL_CONTENT_MAX)?;

    let media_url = non_empty(media_url);
    match entry_type {
        EntryType::Text if content.is_empty() => return Err(ValidationError::Required("content")),
        EntryType::Image | EntryType::Audio if media_url.is_none() => {
            return Err(ValidationError::Required("media_url"));
        }
        _ => {}
    }
    if let Some(url) = &media_url {
        validate_media_url(url)?;
    }

    Ok(ValidatedFields {
        title,
        content,
        entry_type,
        media_url,
        tags: normalize_tags(tags)?,
    })
}

const JOURNAL_COLUMNS: &str = "id, user_id, title, content, entry_type, media_url, tags, mood, mood_score, is_private, deleted_at, created_at, updated_at";

impl JournalEntry {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateJournalEntry,
    ) -> Result<Self, JournalError> {
        let fields = validate_fields(
            data.title.as_deref(),
            &data.content,
            data.entry_type,
            data.media_url.as_deref(),
            &data.tags,
        )?;
        let now = Utc::now();

        let entry = sqlx::query_as::<_, JournalEntry>(&format!(
            "INSERT INTO journal_entries (id, user_id, title, content, entry_type, media_url, tags, is_private, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {JOURNAL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.entry_type)
        .bind(fields.media_url)
        .bind(Json(fields.tags))
        .bind(data.is_private.unwrap_or(true))
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(entry)
    }

    /// Owner lookup. Soft-deleted entries and other users' entries are hidden.
    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, JournalEntry>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Admin lookup, including soft-deleted entries.
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, JournalEntry>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    fn push_user_filters(
        builder: &mut QueryBuilder<'_, Sqlite>,
        user_id: Uuid,
        filter: &JournalFilter,
    ) {
        builder
            .push(" WHERE user_id = ")
            .push_bind(user_id)
            .push(" AND deleted_at IS NULL");

        if let Some(tag) = filter
            .tag
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
        {
            builder
                .push(" AND EXISTS (SELECT 1 FROM json_each(journal_entries.tags) WHERE json_each.value = ")
                .push_bind(tag)
                .push(")");
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(term);
            builder
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR content LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(entry_type) = filter.entry_type {
            builder.push(" AND entry_type = ").push_bind(entry_type);
        }
    }

    /// Owner listing, newest first.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
        filter: &JournalFilter,
        pagination: &Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM journal_entries");
        Self::push_user_filters(&mut count, user_id, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {JOURNAL_COLUMNS} FROM journal_entries"));
        Self::push_user_filters(&mut select, user_id, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = select.build_query_as::<JournalEntry>().fetch_all(pool).await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Admin listing across all users.
    pub async fn list_all(
        pool: &SqlitePool,
        include_deleted: bool,
        pagination: &Pagination,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filter = if include_deleted {
            ""
        } else {
            " WHERE deleted_at IS NULL"
        };

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM journal_entries{filter}"))
                .fetch_one(pool)
                .await?;
        let items = sqlx::query_as::<_, JournalEntry>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries{filter}
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Apply a partial update to an owned entry. The merged record is
    /// re-validated as a whole, so switching to `image` without a media URL
    /// fails.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateJournalEntry,
    ) -> Result<Self, JournalError> {
        let existing = Self::find_for_user(pool, id, user_id)
            .await?
            .ok_or(JournalError::NotFound)?;

        let title = data.title.as_deref().or(existing.title.as_deref());
        let content = data.content.as_deref().unwrap_or(&existing.content);
        let entry_type = data.entry_type.unwrap_or(existing.entry_type);
        let media_url = data.media_url.as_deref().or(existing.media_url.as_deref());
        let tags = data.tags.as_ref().unwrap_or(&existing.tags.0);
        let fields = validate_fields(title, content, entry_type, media_url, tags)?;
        let is_private = data.is_private.unwrap_or(existing.is_private);

        let entry = sqlx::query_as::<_, JournalEntry>(&format!(
            "UPDATE journal_entries
             SET title = $3, content = $4, entry_type = $5, media_url = $6, tags = $7,
                 is_private = $8, updated_at = $9
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {JOURNAL_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.entry_type)
        .bind(fields.media_url)
        .bind(Json(fields.tags))
        .bind(is_private)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(JournalError::NotFound)?;
        Ok(entry)
    }

    /// Record the analyzed mood label and sentiment on an entry.
    pub async fn set_mood(
        pool: &SqlitePool,
        id: Uuid,
        mood: Option<Emotion>,
        mood_score: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE journal_entries SET mood = $2, mood_score = $3 WHERE id = $1")
            .bind(id)
            .bind(mood)
            .bind(mood_score)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE journal_entries SET deleted_at = $3
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn hard_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Tag usage across the user's live entries, most used first.
    pub async fn tag_counts(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<TagCount>, sqlx::Error> {
        sqlx::query_as::<_, TagCount>(
            "SELECT t.value AS tag, COUNT(*) AS count
             FROM journal_entries, json_each(journal_entries.tags) AS t
             WHERE journal_entries.user_id = $1 AND journal_entries.deleted_at IS NULL
             GROUP BY t.value
             ORDER BY count DESC, tag ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Live (not soft-deleted) entries across all users.
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await
    }
}
