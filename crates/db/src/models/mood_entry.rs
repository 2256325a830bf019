use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::{MOOD_NOTE_MAX, ValidationError, validate_max_len, validate_range};

/// The fixed emotion label set used by analysis, journals, mood entries and chat.
///
/// Declaration order doubles as the tie-break order when two labels score equally.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Type,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Anxious,
    Stressed,
    Calm,
    Grateful,
    Hopeful,
    Lonely,
    Excited,
    #[default]
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 11] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Anxious,
        Emotion::Stressed,
        Emotion::Calm,
        Emotion::Grateful,
        Emotion::Hopeful,
        Emotion::Lonely,
        Emotion::Excited,
        Emotion::Neutral,
    ];

    /// +1 for pleasant labels, -1 for unpleasant ones, 0 for neutral.
    pub fn valence(self) -> i8 {
        match self {
            Emotion::Happy
            | Emotion::Calm
            | Emotion::Grateful
            | Emotion::Hopeful
            | Emotion::Excited => 1,
            Emotion::Sad
            | Emotion::Angry
            | Emotion::Anxious
            | Emotion::Stressed
            | Emotion::Lonely => -1,
            Emotion::Neutral => 0,
        }
    }

    pub fn is_positive(self) -> bool {
        self.valence() > 0
    }

    pub fn is_negative(self) -> bool {
        self.valence() < 0
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, EnumString, Display, Default,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoodSource {
    #[default]
    Manual,
    Journal,
    Chat,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub journal_id: Option<Uuid>,
    pub source: MoodSource,
    pub emotion: Emotion,
    pub intensity: i64,
    pub sentiment: f64,
    pub confidence: f64,
    pub note: Option<String>,
    pub keywords: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMoodEntry {
    pub user_id: Uuid,
    pub journal_id: Option<Uuid>,
    pub source: MoodSource,
    pub emotion: Emotion,
    pub intensity: i64,
    pub sentiment: f64,
    pub confidence: f64,
    pub note: Option<String>,
    pub keywords: Vec<String>,
}

impl CreateMoodEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_range("intensity", self.intensity, 1, 10)?;
        if let Some(note) = &self.note {
            validate_max_len("note", note, MOOD_NOTE_MAX)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MoodEntryError {
    #[error("mood entry not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const MOOD_COLUMNS: &str = "id, user_id, journal_id, source, emotion, intensity, sentiment, confidence, note, keywords, created_at";

impl MoodEntry {
    pub async fn create(pool: &SqlitePool, data: &CreateMoodEntry) -> Result<Self, MoodEntryError> {
        data.validate()?;

        let note = data
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let entry = sqlx::query_as::<_, MoodEntry>(&format!(
            "INSERT INTO mood_entries (id, user_id, journal_id, source, emotion, intensity, sentiment, confidence, note, keywords, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {MOOD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.journal_id)
        .bind(data.source)
        .bind(data.emotion)
        .bind(data.intensity)
        .bind(data.sentiment.clamp(-1.0, 1.0))
        .bind(data.confidence.clamp(0.0, 1.0))
        .bind(note)
        .bind(Json(&data.keywords))
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(entry)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MoodEntry>(&format!(
            "SELECT {MOOD_COLUMNS} FROM mood_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Entries recorded at or after `since`, newest first.
    pub async fn find_for_user_since(
        pool: &SqlitePool,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MoodEntry>(&format!(
            "SELECT {MOOD_COLUMNS} FROM mood_entries
             WHERE user_id = $1 AND created_at >= $2
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Delete an entry only if it belongs to `user_id`.
    pub async fn delete_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mood_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop the journal-sourced entry before a journal is re-analyzed or removed.
    pub async fn delete_for_journal(pool: &SqlitePool, journal_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mood_entries WHERE journal_id = $1 AND source = 'journal'")
            .bind(journal_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM mood_entries")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Duration;

    use super::*;
    use crate::test_utils::{create_test_pool, create_test_user};

    fn manual(user_id: Uuid, emotion: Emotion, intensity: i64) -> CreateMoodEntry {
        CreateMoodEntry {
            user_id,
            journal_id: None,
            source: MoodSource::Manual,
            emotion,
            intensity,
            sentiment: 0.0,
            confidence: 1.0,
            note: None,
            keywords: vec![],
        }
    }

    #[test]
    fn emotion_labels_round_trip_through_strings() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_str(&emotion.to_string()).unwrap(), emotion);
        }
        assert_eq!(Emotion::from_str("HAPPY").unwrap(), Emotion::Happy);
        assert!(Emotion::from_str("elated").is_err());
    }

    #[test]
    fn valence_partitions_the_label_set() {
        let positive = Emotion::ALL.iter().filter(|e| e.is_positive()).count();
        let negative = Emotion::ALL.iter().filter(|e| e.is_negative()).count();
        assert_eq!((positive, negative), (5, 5));
        assert_eq!(Emotion::Neutral.valence(), 0);
    }

    #[tokio::test]
    async fn create_validates_and_clamps() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "mood_user").await;

        let err = MoodEntry::create(&pool, &manual(user.id, Emotion::Sad, 11))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodEntryError::Validation(_)));

        let mut data = manual(user.id, Emotion::Calm, 4);
        data.sentiment = 3.0;
        data.note = Some("   ".into());
        data.keywords = vec!["peaceful".into()];
        let entry = MoodEntry::create(&pool, &data).await.unwrap();
        assert_eq!(entry.sentiment, 1.0);
        assert_eq!(entry.note, None);
        assert_eq!(entry.keywords.0, vec!["peaceful"]);
        assert_eq!(entry.emotion, Emotion::Calm);
    }

    #[tokio::test]
    async fn window_query_and_owner_delete() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "tracker").await;
        let other = create_test_user(&pool, "stranger").await;

        let first = MoodEntry::create(&pool, &manual(user.id, Emotion::Happy, 6))
            .await
            .unwrap();
        MoodEntry::create(&pool, &manual(user.id, Emotion::Sad, 3))
            .await
            .unwrap();
        MoodEntry::create(&pool, &manual(other.id, Emotion::Angry, 9))
            .await
            .unwrap();

        let since = Utc::now() - Duration::days(1);
        let entries = MoodEntry::find_for_user_since(&pool, user.id, since, 100)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].emotion, Emotion::Sad, "newest first");

        let future = Utc::now() + Duration::days(1);
        assert!(
            MoodEntry::find_for_user_since(&pool, user.id, future, 100)
                .await
                .unwrap()
                .is_empty()
        );

        assert_eq!(MoodEntry::delete_for_user(&pool, first.id, other.id).await.unwrap(), 0);
        assert_eq!(MoodEntry::delete_for_user(&pool, first.id, user.id).await.unwrap(), 1);
        assert_eq!(MoodEntry::count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_for_journal_only_touches_journal_entries() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "journaler").await;
        let journal_id = Uuid::new_v4();

        let mut from_journal = manual(user.id, Emotion::Grateful, 5);
        from_journal.source = MoodSource::Journal;
        from_journal.journal_id = Some(journal_id);
        let created = MoodEntry::create(&pool, &from_journal).await.unwrap();
        MoodEntry::create(&pool, &manual(user.id, Emotion::Grateful, 5))
            .await
            .unwrap();

        assert_eq!(MoodEntry::delete_for_journal(&pool, journal_id).await.unwrap(), 1);
        assert!(MoodEntry::find_by_id(&pool, created.id).await.unwrap().is_none());
        assert_eq!(MoodEntry::count(&pool).await.unwrap(), 1);
    }
}
