//! Static word lists behind the mood analyzer.

use db::models::mood_entry::Emotion;

/// `(term, emotion, weight)`. Multi-word terms are matched token by token.
pub const LEXICON: &[(&str, Emotion, u8)] = &[
    // happy
    ("happy", Emotion::Happy, 2),
    ("glad", Emotion::Happy, 2),
    ("joy", Emotion::Happy, 3),
    ("joyful", Emotion::Happy, 3),
    ("cheerful", Emotion::Happy, 2),
    ("delighted", Emotion::Happy, 3),
    ("great", Emotion::Happy, 1),
    ("good", Emotion::Happy, 1),
    ("wonderful", Emotion::Happy, 2),
    ("smile", Emotion::Happy, 1),
    ("smiling", Emotion::Happy, 1),
    ("laugh", Emotion::Happy, 1),
    ("laughed", Emotion::Happy, 1),
    ("fun", Emotion::Happy, 1),
    ("love", Emotion::Happy, 2),
    ("content", Emotion::Happy, 1),
    ("blessed", Emotion::Happy, 2),
    // sad
    ("sad", Emotion::Sad, 2),
    ("unhappy", Emotion::Sad, 2),
    ("down", Emotion::Sad, 1),
    ("depressed", Emotion::Sad, 3),
    ("miserable", Emotion::Sad, 3),
    ("heartbroken", Emotion::Sad, 3),
    ("crying", Emotion::Sad, 2),
    ("cried", Emotion::Sad, 2),
    ("tears", Emotion::Sad, 2),
    ("grief", Emotion::Sad, 3),
    ("grieving", Emotion::Sad, 3),
    ("hopeless", Emotion::Sad, 3),
    ("disappointed", Emotion::Sad, 2),
    ("hurt", Emotion::Sad, 2),
    ("lost", Emotion::Sad, 1),
    ("empty", Emotion::Sad, 2),
    ("upset", Emotion::Sad, 2),
    // angry
    ("angry", Emotion::Angry, 2),
    ("mad", Emotion::Angry, 2),
    ("furious", Emotion::Angry, 3),
    ("annoyed", Emotion::Angry, 1),
    ("irritated", Emotion::Angry, 1),
    ("frustrated", Emotion::Angry, 2),
    ("hate", Emotion::Angry, 3),
    ("rage", Emotion::Angry, 3),
    ("resent", Emotion::Angry, 2),
    ("unfair", Emotion::Angry, 1),
    ("fed up", Emotion::Angry, 2),
    ("pissed", Emotion::Angry, 2),
    // anxious
    ("anxious", Emotion::Anxious, 2),
    ("anxiety", Emotion::Anxious, 2),
    ("worried", Emotion::Anxious, 2),
    ("worry", Emotion::Anxious, 2),
    ("nervous", Emotion::Anxious, 2),
    ("scared", Emotion::Anxious, 2),
    ("afraid", Emotion::Anxious, 2),
    ("fear", Emotion::Anxious, 2),
    ("panic", Emotion::Anxious, 3),
    ("uneasy", Emotion::Anxious, 1),
    ("restless", Emotion::Anxious, 1),
    ("on edge", Emotion::Anxious, 2),
    ("overthinking", Emotion::Anxious, 2),
    // stressed
    ("stressed", Emotion::Stressed, 2),
    ("stress", Emotion::Stressed, 2),
    ("overwhelmed", Emotion::Stressed, 3),
    ("pressure", Emotion::Stressed, 1),
    ("exhausted", Emotion::Stressed, 2),
    ("tired", Emotion::Stressed, 1),
    ("busy", Emotion::Stressed, 1),
    ("deadline", Emotion::Stressed, 1),
    ("deadlines", Emotion::Stressed, 1),
    ("burned out", Emotion::Stressed, 3),
    ("burnt out", Emotion::Stressed, 3),
    ("drained", Emotion::Stressed, 2),
    ("too much", Emotion::Stressed, 1),
    // calm
    ("calm", Emotion::Calm, 2),
    ("peaceful", Emotion::Calm, 2),
    ("peace", Emotion::Calm, 2),
    ("relaxed", Emotion::Calm, 2),
    ("serene", Emotion::Calm, 3),
    ("rested", Emotion::Calm, 1),
    ("quiet", Emotion::Calm, 1),
    ("tranquil", Emotion::Calm, 3),
    ("at ease", Emotion::Calm, 2),
    ("at peace", Emotion::Calm, 3),
    // grateful
    ("grateful", Emotion::Grateful, 3),
    ("thankful", Emotion::Grateful, 3),
    ("thanks", Emotion::Grateful, 1),
    ("thank you", Emotion::Grateful, 2),
    ("appreciate", Emotion::Grateful, 2),
    ("appreciated", Emotion::Grateful, 2),
    ("gratitude", Emotion::Grateful, 3),
    ("alhamdulillah", Emotion::Grateful, 3),
    // hopeful
    ("hopeful", Emotion::Hopeful, 3),
    ("hope", Emotion::Hopeful, 2),
    ("optimistic", Emotion::Hopeful, 3),
    ("better", Emotion::Hopeful, 1),
    ("looking forward", Emotion::Hopeful, 2),
    ("believe", Emotion::Hopeful, 1),
    ("inshallah", Emotion::Hopeful, 2),
    ("motivated", Emotion::Hopeful, 2),
    // lonely
    ("lonely", Emotion::Lonely, 3),
    ("alone", Emotion::Lonely, 2),
    ("isolated", Emotion::Lonely, 3),
    ("left out", Emotion::Lonely, 2),
    ("nobody", Emotion::Lonely, 1),
    ("ignored", Emotion::Lonely, 2),
    ("miss", Emotion::Lonely, 1),
    ("missing", Emotion::Lonely, 1),
    // excited
    ("excited", Emotion::Excited, 3),
    ("thrilled", Emotion::Excited, 3),
    ("amazing", Emotion::Excited, 2),
    ("awesome", Emotion::Excited, 2),
    ("ecstatic", Emotion::Excited, 3),
    ("pumped", Emotion::Excited, 2),
    ("can't wait", Emotion::Excited, 2),
    ("cant wait", Emotion::Excited, 2),
    // neutral
    ("okay", Emotion::Neutral, 1),
    ("ok", Emotion::Neutral, 1),
    ("fine", Emotion::Neutral, 1),
    ("meh", Emotion::Neutral, 1),
    ("alright", Emotion::Neutral, 1),
];

/// Words that multiply the weight of an immediately following hit by 1.5.
pub const INTENSIFIERS: &[&str] = &[
    "very",
    "really",
    "so",
    "extremely",
    "incredibly",
    "super",
    "totally",
    "deeply",
];

/// Words that void a hit when they appear within the three preceding tokens.
pub const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "isn't", "wasn't", "can't", "cannot", "hardly",
    "without",
];

pub const NEGATION_WINDOW: usize = 3;
pub const INTENSIFIER_FACTOR: f64 = 1.5;
pub const EMOJI_WEIGHT: f64 = 2.0;

pub const EMOJI: &[(&str, Emotion)] = &[
    ("😊", Emotion::Happy),
    ("😀", Emotion::Happy),
    ("😄", Emotion::Happy),
    ("🙂", Emotion::Happy),
    ("❤️", Emotion::Happy),
    ("😢", Emotion::Sad),
    ("😭", Emotion::Sad),
    ("😞", Emotion::Sad),
    ("💔", Emotion::Sad),
    ("😠", Emotion::Angry),
    ("😡", Emotion::Angry),
    ("🤬", Emotion::Angry),
    ("😰", Emotion::Anxious),
    ("😨", Emotion::Anxious),
    ("😟", Emotion::Anxious),
    ("😫", Emotion::Stressed),
    ("😩", Emotion::Stressed),
    ("😌", Emotion::Calm),
    ("🧘", Emotion::Calm),
    ("🙏", Emotion::Grateful),
    ("🌈", Emotion::Hopeful),
    ("🤞", Emotion::Hopeful),
    ("🥺", Emotion::Lonely),
    ("🤩", Emotion::Excited),
    ("🎉", Emotion::Excited),
];

pub fn suggestions(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &[
            "Write down what made today good so you can return to it later.",
            "Share the moment with someone you care about.",
        ],
        Emotion::Sad => &[
            "Be gentle with yourself; sadness passes more easily when it is allowed.",
            "Reach out to a friend or family member, even with a short message.",
            "A short walk outside can soften a heavy mood.",
        ],
        Emotion::Angry => &[
            "Pause and take five slow breaths before responding.",
            "Write the anger out on paper, then decide what you actually want to say.",
            "Physical movement helps release tension.",
        ],
        Emotion::Anxious => &[
            "Try the 5-4-3-2-1 grounding exercise: name what you can see and hear around you.",
            "Breathe in for four counts, hold for four, and out for six.",
            "Separate what you can control from what you cannot.",
        ],
        Emotion::Stressed => &[
            "Break the next task into one small step and do only that.",
            "Schedule a real break, away from screens.",
            "Protect your sleep tonight; everything is harder when tired.",
        ],
        Emotion::Calm => &[
            "Notice what helped you feel settled so you can repeat it.",
            "Use this clarity for a short reflection or prayer.",
        ],
        Emotion::Grateful => &[
            "Add three things to a gratitude list.",
            "Tell someone you appreciate them.",
        ],
        Emotion::Hopeful => &[
            "Turn the hope into one concrete intention for tomorrow.",
            "Write down what you are looking forward to.",
        ],
        Emotion::Lonely => &[
            "Send a message to someone you have not talked to in a while.",
            "Spend time somewhere with other people around, like a library or a mosque.",
            "Remember that reaching out first is a strength.",
        ],
        Emotion::Excited => &[
            "Channel the energy into planning your next step.",
            "Capture this feeling in your journal while it is fresh.",
        ],
        Emotion::Neutral => &[
            "A short check-in with yourself can reveal more than it seems.",
            "Consider a few minutes of journaling about your day.",
        ],
    }
}
