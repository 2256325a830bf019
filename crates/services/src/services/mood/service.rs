use chrono::{Duration, NaiveTime, Utc};
use db::{
    models::{
        journal::{JournalEntry, JournalError},
        mood_entry::{CreateMoodEntry, Emotion, MoodEntry, MoodEntryError, MoodSource},
    },
    validation::ValidationError,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use utils::text::truncate_chars;
use uuid::Uuid;

use super::{MAX_TEXT_CHARS, MoodAnalysis, MoodAnalyzer, MoodError, MoodInsights};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;
const MAX_ENTRIES_PER_QUERY: i64 = 5000;
const DEFAULT_MANUAL_INTENSITY: i64 = 5;

#[derive(Debug, Error)]
pub enum MoodServiceError {
    #[error(transparent)]
    Mood(#[from] MoodError),
    #[error("either an emotion or a note is required")]
    MissingInput,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    MoodEntry(#[from] MoodEntryError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Body of a manual mood check-in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMoodRequest {
    pub emotion: Option<Emotion>,
    pub intensity: Option<i64>,
    pub note: Option<String>,
}

/// Mood analysis wired to persistence.
#[derive(Clone)]
pub struct MoodService {
    analyzer: std::sync::Arc<MoodAnalyzer>,
}

impl MoodService {
    pub fn new(analyzer: MoodAnalyzer) -> Self {
        Self {
            analyzer: std::sync::Arc::new(analyzer),
        }
    }

    pub fn analyzer(&self) -> &MoodAnalyzer {
        &self.analyzer
    }

    pub fn analyze(&self, text: &str) -> Result<MoodAnalysis, MoodError> {
        self.analyzer.analyze(text)
    }

    /// Re-derive the mood of a journal entry from its content.
    ///
    /// Any previous journal-sourced mood entry is replaced. Entries without
    /// text (image or audio only) end up with no mood. Content longer than
    /// the analyzer accepts is judged by its first `MAX_TEXT_CHARS` chars.
    pub async fn analyze_journal(
        &self,
        pool: &SqlitePool,
        entry: &JournalEntry,
    ) -> Result<Option<MoodAnalysis>, MoodServiceError> {
        let text = truncate_chars(&entry.content, MAX_TEXT_CHARS);
        let analysis = match self.analyzer.analyze(&text) {
            Ok(analysis) => analysis,
            Err(MoodError::EmptyText) => {
                MoodEntry::delete_for_journal(pool, entry.id).await?;
                JournalEntry::set_mood(pool, entry.id, None, None).await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        MoodEntry::delete_for_journal(pool, entry.id).await?;

        MoodEntry::create(
            pool,
            &CreateMoodEntry {
                user_id: entry.user_id,
                journal_id: Some(entry.id),
                source: MoodSource::Journal,
                emotion: analysis.emotion,
                intensity: analysis.intensity,
                sentiment: analysis.sentiment,
                confidence: analysis.confidence,
                note: None,
                keywords: analysis.keywords.clone(),
            },
        )
        .await?;
        JournalEntry::set_mood(pool, entry.id, Some(analysis.emotion), Some(analysis.sentiment))
            .await?;

        tracing::debug!(
            journal_id = %entry.id,
            emotion = %analysis.emotion,
            confidence = analysis.confidence,
            "Analyzed journal entry"
        );
        Ok(Some(analysis))
    }

    /// Record a manual check-in. A given emotion wins over the analyzed one;
    /// the note, when present, still supplies sentiment and keywords.
    pub async fn record(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        req: &CreateMoodRequest,
    ) -> Result<MoodEntry, MoodServiceError> {
        let note = req
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let analysis = note.map(|n| self.analyzer.analyze(n)).transpose()?;

        let data = match (req.emotion, analysis) {
            (None, None) => return Err(MoodServiceError::MissingInput),
            (Some(emotion), None) => CreateMoodEntry {
                user_id,
                journal_id: None,
                source: MoodSource::Manual,
                emotion,
                intensity: req.intensity.unwrap_or(DEFAULT_MANUAL_INTENSITY),
                sentiment: f64::from(emotion.valence()) * 0.5,
                confidence: 1.0,
                note: None,
                keywords: vec![],
            },
            (emotion, Some(analysis)) => CreateMoodEntry {
                user_id,
                journal_id: None,
                source: MoodSource::Manual,
                emotion: emotion.unwrap_or(analysis.emotion),
                intensity: req.intensity.unwrap_or(analysis.intensity),
                sentiment: analysis.sentiment,
                confidence: if emotion.is_some() { 1.0 } else { analysis.confidence },
                note: note.map(str::to_string),
                keywords: analysis.keywords,
            },
        };

        Ok(MoodEntry::create(pool, &data).await?)
    }

    /// Entries from the last `days` days, newest first.
    pub async fn list(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        days: i64,
    ) -> Result<Vec<MoodEntry>, MoodServiceError> {
        let days = validate_days(days)?;
        let since = Utc::now() - Duration::days(days);
        Ok(MoodEntry::find_for_user_since(pool, user_id, since, MAX_ENTRIES_PER_QUERY).await?)
    }

    pub async fn insights(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        days: i64,
    ) -> Result<MoodInsights, MoodServiceError> {
        let days = validate_days(days)?;
        let today = Utc::now().date_naive();
        let since = (today - Duration::days(days - 1))
            .and_time(NaiveTime::MIN)
            .and_utc();
        let entries =
            MoodEntry::find_for_user_since(pool, user_id, since, MAX_ENTRIES_PER_QUERY).await?;
        Ok(MoodInsights::from_entries(&entries, days, today))
    }

    pub async fn delete(
        &self,
        pool: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), MoodServiceError> {
        match MoodEntry::delete_for_user(pool, id, user_id).await? {
            0 => Err(MoodEntryError::NotFound.into()),
            _ => Ok(()),
        }
    }
}

impl Default for MoodService {
    fn default() -> Self {
        Self::new(MoodAnalyzer::default())
    }
}

fn validate_days(days: i64) -> Result<i64, ValidationError> {
    db::validation::validate_range("days", days, 1, MAX_WINDOW_DAYS)?;
    Ok(days)
}

#[cfg(test)]
mod tests {
    use db::{
        models::journal::{CreateJournalEntry, EntryType, UpdateJournalEntry},
        test_utils::{create_test_pool, create_test_user},
    };

    use super::*;

    fn journal(content: &str) -> CreateJournalEntry {
        CreateJournalEntry {
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn journal_analysis_records_one_entry_per_journal() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "writer").await;
        let service = MoodService::default();

        let entry = JournalEntry::create(&pool, user.id, &journal("I am so grateful and thankful today"))
            .await
            .unwrap();
        let analysis = service.analyze_journal(&pool, &entry).await.unwrap().unwrap();
        assert_eq!(analysis.emotion, Emotion::Grateful);

        let stored = JournalEntry::find_for_user(&pool, entry.id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.mood, Some(Emotion::Grateful));
        assert_eq!(stored.mood_score, Some(analysis.sentiment));

        let updated = JournalEntry::update(
            &pool,
            entry.id,
            user.id,
            &UpdateJournalEntry {
                content: Some("I feel lonely and isolated".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        service.analyze_journal(&pool, &updated).await.unwrap();

        let entries = service.list(&pool, user.id, 30).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].emotion, Emotion::Lonely);
        assert_eq!(entries[0].source, MoodSource::Journal);
        assert_eq!(entries[0].journal_id, Some(entry.id));
    }

    #[tokio::test]
    async fn long_journal_is_judged_by_its_opening() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "novelist").await;
        let service = MoodService::default();

        let entry = JournalEntry::create(&pool, user.id, &journal("I am so happy"))
            .await
            .unwrap();
        service.analyze_journal(&pool, &entry).await.unwrap();

        let long = format!("I am so sad {}", "word ".repeat(2500));
        assert!(long.chars().count() > MAX_TEXT_CHARS);
        let updated = JournalEntry::update(
            &pool,
            entry.id,
            user.id,
            &UpdateJournalEntry {
                content: Some(long),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let analysis = service.analyze_journal(&pool, &updated).await.unwrap().unwrap();
        assert_eq!(analysis.emotion, Emotion::Sad);

        let stored = JournalEntry::find_for_user(&pool, entry.id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.mood, Some(Emotion::Sad));
        let entries = service.list(&pool, user.id, 30).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].emotion, Emotion::Sad);
    }

    #[tokio::test]
    async fn media_journal_without_text_has_no_mood() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "painter").await;
        let service = MoodService::default();

        let entry = JournalEntry::create(
            &pool,
            user.id,
            &CreateJournalEntry {
                entry_type: EntryType::Image,
                media_url: Some("https://example.com/sunset.jpg".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(service.analyze_journal(&pool, &entry).await.unwrap().is_none());
        assert_eq!(MoodEntry::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn manual_record_needs_emotion_or_note() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "checkin").await;
        let service = MoodService::default();

        let err = service
            .record(
                &pool,
                user.id,
                &CreateMoodRequest {
                    note: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MoodServiceError::MissingInput));

        let calm = service
            .record(
                &pool,
                user.id,
                &CreateMoodRequest {
                    emotion: Some(Emotion::Calm),
                    intensity: Some(3),
                    note: None,
                },
            )
            .await
            .unwrap();
        assert_eq!((calm.emotion, calm.intensity), (Emotion::Calm, 3));
        assert_eq!(calm.sentiment, 0.5);
        assert_eq!(calm.confidence, 1.0);

        let analyzed = service
            .record(
                &pool,
                user.id,
                &CreateMoodRequest {
                    note: Some("Feeling really anxious about tomorrow".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(analyzed.emotion, Emotion::Anxious);
        assert_eq!(analyzed.note.as_deref(), Some("Feeling really anxious about tomorrow"));
        assert!(analyzed.keywords.0.contains(&"anxious".to_string()));
    }

    #[tokio::test]
    async fn out_of_range_intensity_is_rejected() {
        let (pool, _tmp) = create_test_pool().await;
        let user = create_test_user(&pool, "loud").await;
        let err = MoodService::default()
            .record(
                &pool,
                user.id,
                &CreateMoodRequest {
                    emotion: Some(Emotion::Excited),
                    intensity: Some(11),
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MoodServiceError::MoodEntry(MoodEntryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn window_and_ownership_checks() {
        let (pool, _tmp) = create_test_pool().await;
        let owner = create_test_user(&pool, "owner").await;
        let other = create_test_user(&pool, "other").await;
        let service = MoodService::default();

        assert!(matches!(
            service.list(&pool, owner.id, 0).await,
            Err(MoodServiceError::Validation(_))
        ));
        assert!(matches!(
            service.insights(&pool, owner.id, 366).await,
            Err(MoodServiceError::Validation(_))
        ));

        let entry = service
            .record(
                &pool,
                owner.id,
                &CreateMoodRequest {
                    emotion: Some(Emotion::Happy),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let insights = service.insights(&pool, owner.id, 7).await.unwrap();
        assert_eq!(insights.total, 1);
        assert_eq!(insights.current_streak, 1);

        assert!(matches!(
            service.delete(&pool, other.id, entry.id).await,
            Err(MoodServiceError::MoodEntry(MoodEntryError::NotFound))
        ));
        service.delete(&pool, owner.id, entry.id).await.unwrap();
        assert!(service.list(&pool, owner.id, 30).await.unwrap().is_empty());
    }
}
