//! Mood analysis: a fixed emotion lexicon, a heuristic analyzer, and
//! aggregate insights over recorded mood entries.

use thiserror::Error;

pub mod analyzer;
pub mod insights;
pub mod lexicon;
pub mod service;

pub use analyzer::{MAX_TEXT_CHARS, MoodAnalysis, MoodAnalyzer};
pub use insights::{DailyMood, MoodInsights};
pub use service::{
    CreateMoodRequest, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, MoodService, MoodServiceError,
};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MoodError {
    #[error("text to analyze is empty")]
    EmptyText,
    #[error("text is too long to analyze (max {max} characters)")]
    TextTooLong { max: usize },
}
