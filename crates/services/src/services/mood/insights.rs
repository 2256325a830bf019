//! Aggregates over a user's recent mood entries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use db::models::mood_entry::{Emotion, MoodEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMood {
    pub date: NaiveDate,
    pub count: i64,
    pub average_sentiment: f64,
    pub dominant: Emotion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodInsights {
    pub days: i64,
    pub total: i64,
    pub distribution: BTreeMap<Emotion, i64>,
    pub dominant: Option<Emotion>,
    pub average_sentiment: Option<f64>,
    pub average_intensity: Option<f64>,
    /// Only days with at least one entry, oldest first.
    pub daily: Vec<DailyMood>,
    /// Consecutive days with entries, ending today or yesterday.
    pub current_streak: i64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Most frequent label; earlier labels win ties.
fn dominant(distribution: &BTreeMap<Emotion, i64>) -> Option<Emotion> {
    let mut best: Option<(Emotion, i64)> = None;
    for (&emotion, &count) in distribution {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((emotion, count));
        }
    }
    best.map(|(emotion, _)| emotion)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| round2(sum / n as f64))
}

impl MoodInsights {
    /// Summarize `entries` that fall within the `days`-day window ending on
    /// `today` (UTC dates).
    pub fn from_entries(entries: &[MoodEntry], days: i64, today: NaiveDate) -> Self {
        let days = days.max(1);
        let first_day = today - Duration::days(days - 1);
        let in_window: Vec<&MoodEntry> = entries
            .iter()
            .filter(|e| {
                let date = e.created_at.date_naive();
                date >= first_day && date <= today
            })
            .collect();

        let mut distribution: BTreeMap<Emotion, i64> = BTreeMap::new();
        let mut by_day: BTreeMap<NaiveDate, Vec<&MoodEntry>> = BTreeMap::new();
        for entry in &in_window {
            *distribution.entry(entry.emotion).or_default() += 1;
            by_day
                .entry(entry.created_at.date_naive())
                .or_default()
                .push(entry);
        }

        let daily = by_day
            .iter()
            .map(|(&date, day_entries)| {
                let mut day_distribution = BTreeMap::new();
                for entry in day_entries {
                    *day_distribution.entry(entry.emotion).or_default() += 1;
                }
                DailyMood {
                    date,
                    count: day_entries.len() as i64,
                    average_sentiment: mean(day_entries.iter().map(|e| e.sentiment))
                        .unwrap_or_default(),
                    dominant: dominant(&day_distribution).unwrap_or_default(),
                }
            })
            .collect();

        let active_days: BTreeSet<NaiveDate> = by_day.keys().copied().collect();

        Self {
            days,
            total: in_window.len() as i64,
            dominant: dominant(&distribution),
            distribution,
            average_sentiment: mean(in_window.iter().map(|e| e.sentiment)),
            average_intensity: mean(in_window.iter().map(|e| e.intensity as f64)),
            daily,
            current_streak: current_streak(&active_days, today),
        }
    }
}

fn current_streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> i64 {
    let yesterday = today - Duration::days(1);
    let mut day = if active_days.contains(&today) {
        today
    } else if active_days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while active_days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
