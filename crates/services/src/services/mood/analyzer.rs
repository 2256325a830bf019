//! Keyword and sentiment heuristics that turn free text into a mood label.

use std::collections::BTreeMap;

use db::models::mood_entry::Emotion;
use serde::{Deserialize, Serialize};
use utils::text::{char_len, normalize, sha256_hex};

use super::{
    MoodError,
    lexicon::{
        EMOJI, EMOJI_WEIGHT, INTENSIFIER_FACTOR, INTENSIFIERS, LEXICON, NEGATION_WINDOW,
        NEGATORS, suggestions,
    },
};
use crate::services::cache::BoundedCache;

pub const MAX_TEXT_CHARS: usize = 10_000;

const KEYWORD_SHARE: f64 = 0.7;
const SENTIMENT_SHARE: f64 = 0.3;
const SECONDARY_RATIO: f64 = 0.5;
const SENTIMENT_THRESHOLD: f64 = 0.2;
const EXCLAMATION_BOOST: f64 = 0.05;
const MAX_EXCLAMATION_BOOST: f64 = 0.2;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    pub emotion: Emotion,
    pub secondary: Option<Emotion>,
    /// 0..=1, two decimals.
    pub confidence: f64,
    /// -1..=1, two decimals.
    pub sentiment: f64,
    pub intensity: i64,
    pub keywords: Vec<String>,
    /// Combined score per label that had keyword hits.
    pub scores: BTreeMap<Emotion, f64>,
    pub suggestions: Vec<String>,
}

impl MoodAnalysis {
    /// Used when analysis is unavailable but a label is still needed.
    pub fn neutral() -> Self {
        Self::from_parts(Emotion::Neutral, None, NEUTRAL_CONFIDENCE, 0.0, 1, vec![], BTreeMap::new())
    }

    fn from_parts(
        emotion: Emotion,
        secondary: Option<Emotion>,
        confidence: f64,
        sentiment: f64,
        intensity: i64,
        keywords: Vec<String>,
        scores: BTreeMap<Emotion, f64>,
    ) -> Self {
        Self {
            emotion,
            secondary,
            confidence: round2(confidence),
            sentiment: round2(sentiment),
            intensity,
            keywords,
            scores,
            suggestions: suggestions(emotion).iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug)]
struct Hit {
    term: &'static str,
    emotion: Emotion,
    weight: f64,
    negated: bool,
}

/// Split into word tokens, keeping inner apostrophes ("can't").
pub(crate) fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Scan tokens left to right against the lexicon.
///
/// Negators that belong to an already matched phrase ("can't wait") do not
/// negate later hits.
fn find_hits(tokens: &[&str]) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut in_phrase = vec![false; tokens.len()];

    for i in 0..tokens.len() {
        for &(term, emotion, weight) in LEXICON {
            let len = term.split(' ').count();
            if i + len > tokens.len() || !term.split(' ').eq(tokens[i..i + len].iter().copied()) {
                continue;
            }

            let mut weight = f64::from(weight);
            if i > 0 && INTENSIFIERS.contains(&tokens[i - 1]) {
                weight *= INTENSIFIER_FACTOR;
            }
            let negated = (i.saturating_sub(NEGATION_WINDOW)..i)
                .any(|j| !in_phrase[j] && NEGATORS.contains(&tokens[j]));
            if len > 1 {
                in_phrase[i..i + len].iter_mut().for_each(|flag| *flag = true);
            }

            hits.push(Hit {
                term,
                emotion,
                weight,
                negated,
            });
        }
    }
    hits
}

/// Valence-weighted totals feeding the sentiment score.
#[derive(Default)]
struct Polarity {
    positive: f64,
    negative: f64,
}

impl Polarity {
    fn add(&mut self, valence: i8, weight: f64) {
        match valence {
            v if v > 0 => self.positive += weight,
            v if v < 0 => self.negative += weight,
            _ => {}
        }
    }

    fn sentiment(&self, exclamations: usize) -> f64 {
        let total = self.positive + self.negative;
        if total == 0.0 {
            return 0.0;
        }
        let base = (self.positive - self.negative) / total;
        let boost = 1.0 + (EXCLAMATION_BOOST * exclamations as f64).min(MAX_EXCLAMATION_BOOST);
        (base * boost).clamp(-1.0, 1.0)
    }
}

fn align(emotion: Emotion, sentiment: f64) -> f64 {
    if f64::from(emotion.valence()) * sentiment > 0.0 {
        sentiment.abs()
    } else {
        0.0
    }
}

/// Pure analysis of already normalized text.
fn analyze_normalized(text: &str) -> MoodAnalysis {
    let tokens = tokenize(text);
    let exclamations = text.matches('!').count();

    let mut keyword_weights: BTreeMap<Emotion, f64> = BTreeMap::new();
    let mut polarity = Polarity::default();
    let mut keywords: Vec<String> = Vec::new();

    for hit in find_hits(&tokens) {
        let valence = hit.emotion.valence();
        if hit.negated {
            polarity.add(-valence, hit.weight);
            continue;
        }
        *keyword_weights.entry(hit.emotion).or_default() += hit.weight;
        polarity.add(valence, hit.weight);
        if !keywords.iter().any(|k| k == hit.term) {
            keywords.push(hit.term.to_string());
        }
    }

    for &(emoji, emotion) in EMOJI {
        let count = text.matches(emoji).count();
        if count > 0 {
            let weight = EMOJI_WEIGHT * count as f64;
            *keyword_weights.entry(emotion).or_default() += weight;
            polarity.add(emotion.valence(), weight);
        }
    }

    let sentiment = polarity.sentiment(exclamations);
    let total_weight: f64 = keyword_weights.values().sum();

    if total_weight == 0.0 {
        let (emotion, confidence) = if sentiment >= SENTIMENT_THRESHOLD {
            (Emotion::Happy, NEUTRAL_CONFIDENCE + sentiment.abs() / 4.0)
        } else if sentiment <= -SENTIMENT_THRESHOLD {
            (Emotion::Sad, NEUTRAL_CONFIDENCE + sentiment.abs() / 4.0)
        } else {
            (Emotion::Neutral, NEUTRAL_CONFIDENCE)
        };
        let intensity = if emotion == Emotion::Neutral {
            1
        } else {
            intensity_for(0.0, exclamations)
        };
        return MoodAnalysis::from_parts(
            emotion,
            None,
            confidence,
            sentiment,
            intensity,
            keywords,
            BTreeMap::new(),
        );
    }

    let scores: BTreeMap<Emotion, f64> = keyword_weights
        .iter()
        .map(|(&emotion, &weight)| {
            let score =
                KEYWORD_SHARE * weight / total_weight + SENTIMENT_SHARE * align(emotion, sentiment);
            (emotion, score)
        })
        .collect();

    // BTreeMap iterates in label order, so strict comparison keeps the
    // earlier label on ties.
    let mut ranked: Vec<(Emotion, f64)> = scores.iter().map(|(&e, &s)| (e, s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (primary, primary_score) = ranked[0];
    let secondary = ranked
        .get(1)
        .filter(|(_, score)| *score >= SECONDARY_RATIO * primary_score)
        .map(|(emotion, _)| *emotion);

    let score_sum: f64 = scores.values().sum();
    let confidence = if score_sum > 0.0 {
        primary_score / score_sum
    } else {
        NEUTRAL_CONFIDENCE
    };

    let intensity = if primary == Emotion::Neutral {
        1
    } else {
        intensity_for(keyword_weights[&primary], exclamations)
    };

    MoodAnalysis::from_parts(
        primary,
        secondary,
        confidence,
        sentiment,
        intensity,
        keywords,
        scores.into_iter().map(|(e, s)| (e, round2(s))).collect(),
    )
}

fn intensity_for(primary_weight: f64, exclamations: usize) -> i64 {
    let raw = 1.0 + 1.5 * primary_weight + 0.5 * exclamations.min(4) as f64;
    (raw.round() as i64).clamp(1, 10)
}

/// Mood analyzer with a bounded result cache keyed by normalized text.
#[derive(Clone)]
pub struct MoodAnalyzer {
    cache: BoundedCache<String, MoodAnalysis>,
}

impl MoodAnalyzer {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(cache_capacity),
        }
    }

    pub fn analyze(&self, text: &str) -> Result<MoodAnalysis, MoodError> {
        let normalized = normalize(&text.replace(['\u{2019}', '\u{2018}'], "'"));
        if normalized.is_empty() {
            return Err(MoodError::EmptyText);
        }
        if char_len(&normalized) > MAX_TEXT_CHARS {
            return Err(MoodError::TextTooLong {
                max: MAX_TEXT_CHARS,
            });
        }

        let key = sha256_hex(&normalized);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let analysis = analyze_normalized(&normalized);
        self.cache.insert(key, analysis.clone());
        Ok(analysis)
    }

    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }
}

impl Default for MoodAnalyzer {
    fn default() -> Self {
        Self::new(crate::services::config::DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> MoodAnalysis {
        MoodAnalyzer::new(16).analyze(text).unwrap()
    }

    #[test]
    fn empty_and_oversized_text_is_rejected() {
        let analyzer = MoodAnalyzer::new(4);
        assert_eq!(analyzer.analyze("   \n\t").unwrap_err(), MoodError::EmptyText);
        assert_eq!(
            analyzer.analyze(&"a ".repeat(6000)).unwrap_err(),
            MoodError::TextTooLong { max: MAX_TEXT_CHARS }
        );
    }

    #[test]
    fn intensifier_scales_a_single_hit() {
        let result = analyze("I am SO happy today!");
        assert_eq!(result.emotion, Emotion::Happy);
        assert_eq!(result.secondary, None);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.sentiment, 1.0);
        // 1 + 1.5 * (2 * 1.5) + 0.5 * 1
        assert_eq!(result.intensity, 6);
        assert_eq!(result.keywords, vec!["happy"]);
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn mixed_negative_labels_pick_primary_and_secondary() {
        let result = analyze("I feel anxious and stressed about the deadline");
        assert_eq!(result.emotion, Emotion::Stressed);
        assert_eq!(result.secondary, Some(Emotion::Anxious));
        assert_eq!(result.sentiment, -1.0);
        assert_eq!(result.confidence, 0.55);
        assert_eq!(result.intensity, 6);
        assert_eq!(result.keywords, vec!["anxious", "stressed", "deadline"]);
        assert_eq!(result.scores[&Emotion::Stressed], 0.72);
        assert_eq!(result.scores[&Emotion::Anxious], 0.58);
    }

    #[test]
    fn ties_resolve_by_label_order() {
        let result = analyze("grateful but lonely");
        assert_eq!(result.sentiment, 0.0);
        assert_eq!(result.emotion, Emotion::Grateful);
        assert_eq!(result.secondary, Some(Emotion::Lonely));
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn negation_voids_the_hit_and_flips_sentiment() {
        let result = analyze("I am not happy");
        assert_eq!(result.emotion, Emotion::Sad);
        assert_eq!(result.sentiment, -1.0);
        assert_eq!(result.confidence, 0.75);
        assert!(result.keywords.is_empty());
        assert!(result.scores.is_empty());
    }

    #[test]
    fn negation_only_reaches_three_tokens_back() {
        let result = analyze("not that it matters but happy");
        assert_eq!(result.emotion, Emotion::Happy);
        assert_eq!(result.keywords, vec!["happy"]);
    }

    #[test]
    fn phrase_negators_do_not_negate_later_words() {
        let result = analyze("Can't wait, so excited!!");
        assert_eq!(result.emotion, Emotion::Excited);
        assert_eq!(result.keywords, vec!["can't wait", "excited"]);
        assert_eq!(result.intensity, 10);
    }

    #[test]
    fn curly_apostrophes_are_normalized() {
        let result = analyze("I can\u{2019}t wait");
        assert_eq!(result.keywords, vec!["can't wait"]);
    }

    #[test]
    fn emoji_count_toward_their_label() {
        let result = analyze("😊");
        assert_eq!(result.emotion, Emotion::Happy);
        assert_eq!(result.intensity, 4);
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn no_signal_is_neutral() {
        let result = analyze("The meeting moved to Thursday.");
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.sentiment, 0.0);
        assert_eq!(result.intensity, 1);
    }

    #[test]
    fn keywords_are_deduplicated_in_order() {
        let result = analyze("sad, so sad, and lonely and sad");
        assert_eq!(result.keywords, vec!["sad", "lonely"]);
        assert_eq!(result.emotion, Emotion::Sad);
    }

    #[test]
    fn results_are_cached_by_normalized_text() {
        let analyzer = MoodAnalyzer::new(8);
        let first = analyzer.analyze("Feeling  calm").unwrap();
        let second = analyzer.analyze("feeling calm").unwrap();
        assert_eq!(first, second);
        assert_eq!(analyzer.cached_results(), 1);
    }
}
