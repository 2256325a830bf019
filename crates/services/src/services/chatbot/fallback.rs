//! Canned replies used when the model is unavailable, plus crisis detection.

use db::models::mood_entry::Emotion;
use rand::seq::IndexedRandom;

use crate::services::mood::analyzer::tokenize;

/// Matched as whole-word sequences against normalized text. Hyphens split
/// tokens, so "self harm" also covers "self-harm".
pub const CRISIS_PHRASES: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "end it all",
    "self harm",
    "want to die",
    "hurt myself",
    "no reason to live",
];

pub const CRISIS_REPLY: &str = "I'm really sorry you're feeling this much pain, and I'm glad you told me. \
You don't have to go through this alone. If you are in immediate danger, please call your local \
emergency number right now. You can also reach a crisis line, such as 988 in the US or Samaritans \
on 116 123 in the UK; https://findahelpline.com lists helplines in other countries. \
If you can, let someone you trust know how you're feeling.";

pub fn is_crisis(normalized: &str) -> bool {
    let tokens = tokenize(normalized);
    CRISIS_PHRASES.iter().any(|phrase| {
        let words: Vec<&str> = phrase.split(' ').collect();
        tokens.windows(words.len()).any(|window| window == words.as_slice())
    })
}

pub fn replies_for(emotion: Emotion) -> &'static [&'static str; 3] {
    match emotion {
        Emotion::Happy => &[
            "That's wonderful to hear! What's been bringing you this joy?",
            "I love that you're feeling good. Take a moment to really savor it.",
            "Your happiness comes through. What would help you carry this feeling forward?",
        ],
        Emotion::Sad => &[
            "I'm sorry you're feeling down. I'm here to listen if you want to share more.",
            "It's okay to feel sad. Would it help to talk about what's weighing on you?",
            "Sadness can feel heavy. Be gentle with yourself today.",
        ],
        Emotion::Angry => &[
            "It sounds like something really frustrated you. What happened?",
            "Anger is a valid feeling. Taking a few slow breaths might help before deciding what to do next.",
            "I hear how upset you are. Do you want to walk me through it?",
        ],
        Emotion::Anxious => &[
            "That sounds stressful to carry. Try breathing in for four counts and out for six.",
            "Worry can make everything feel urgent. What is one small thing within your control right now?",
            "I'm here with you. Would it help to name what you're most worried about?",
        ],
        Emotion::Stressed => &[
            "You have a lot on your plate. Could you break it into one next small step?",
            "Stress is exhausting. Remember that a short break is allowed.",
            "That sounds overwhelming. What would make today a little lighter?",
        ],
        Emotion::Calm => &[
            "It's lovely that you're feeling at peace. What helped you get here?",
            "Moments of calm are worth noticing. Enjoy this one.",
            "That sense of ease is a good place to reflect from. Anything on your mind?",
        ],
        Emotion::Grateful => &[
            "Gratitude is powerful. Thank you for sharing what you appreciate.",
            "It's beautiful that you're noticing the good things. Tell me more.",
            "Holding onto gratitude like this can really lift a day.",
        ],
        Emotion::Hopeful => &[
            "I'm glad you're feeling hopeful. What are you looking forward to?",
            "Hope is a great starting point. What's one step toward it?",
            "That optimism is worth holding onto. Keep going.",
        ],
        Emotion::Lonely => &[
            "Feeling lonely is hard. I'm here, and I'm listening.",
            "You matter, even when it feels like no one notices. Is there someone you could reach out to today?",
            "Thank you for telling me. Would you like to talk about what's been missing lately?",
        ],
        Emotion::Excited => &[
            "That sounds exciting! Tell me everything.",
            "Your energy is contagious. What are you most looking forward to?",
            "How fun! What made this happen?",
        ],
        Emotion::Neutral => &[
            "Thanks for sharing. How has your day been so far?",
            "I'm here to listen. What's on your mind?",
            "Tell me a bit more about how you're feeling.",
        ],
    }
}

/// A random canned reply suited to `emotion`.
pub fn fallback_reply(emotion: Emotion) -> &'static str {
    let replies = replies_for(emotion);
    replies
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(replies[0])
}
