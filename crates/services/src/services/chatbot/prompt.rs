use db::models::conversation::Message;

use super::llm::{ChatTurn, PromptRequest};
use crate::services::mood::MoodAnalysis;

/// Number of prior messages replayed to the model.
pub const HISTORY_LIMIT: usize = 10;

pub const PERSONA: &str = "You are Mirror of Heart, a warm and supportive wellness companion. \
Listen carefully, reflect the user's feelings back with empathy, and offer gentle, practical \
suggestions when they help. Keep replies short and conversational. You are not a therapist or \
a doctor; when someone may be in danger, encourage them to contact local emergency services or \
a crisis helpline.";

pub fn mood_context(mood: &MoodAnalysis) -> String {
    format!(
        "The user currently seems to feel {} (intensity {}/10).",
        mood.emotion, mood.intensity
    )
}

/// Assemble the request for one reply. `history` is oldest first; only the
/// last [`HISTORY_LIMIT`] messages are kept.
pub fn build(history: &[Message], mood: &MoodAnalysis, message: &str) -> PromptRequest {
    let skip = history.len().saturating_sub(HISTORY_LIMIT);
    PromptRequest {
        system_instruction: format!("{PERSONA}\n\n{}", mood_context(mood)),
        history: history
            .iter()
            .skip(skip)
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect(),
        message: message.to_string(),
    }
}
