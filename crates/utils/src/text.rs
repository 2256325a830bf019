//! Small string helpers shared by the validation and analysis code.

use sha2::{Digest, Sha256};

/// Lowercase and collapse runs of whitespace into single spaces.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// Hex encoded SHA-256 digest, used as a compact cache key.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

pub fn char_len(input: &str) -> usize {
    input.chars().count()
}
