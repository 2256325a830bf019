//! Field-level validation for user supplied record data.
//!
//! SQLite only enforces NOT NULL / UNIQUE here; lengths, ranges and formats
//! are checked before anything reaches a query.

use thiserror::Error;
use utils::text::char_len;

/// Validation errors for record fields
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("{field} is invalid: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const EMAIL_MAX: usize = 254;
pub const JOURNAL_TITLE_MAX: usize = 120;
pub const JOURNAL_CONTENT_MAX: usize = 20_000;
pub const MEDIA_URL_MAX: usize = 2048;
pub const MAX_TAGS: usize = 10;
pub const TAG_MAX: usize = 30;
pub const MOOD_NOTE_MAX: usize = 2000;
pub const CONVERSATION_TITLE_MAX: usize = 80;

/// Check that `value` has at most `max` characters.
pub fn validate_max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if char_len(value) > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

/// Check an integer against an inclusive range.
pub fn validate_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

/// Usernames are 3-30 characters of ASCII letters, digits and underscores.
///
/// # Examples
/// ```
/// use db::validation::validate_username;
///
/// assert!(validate_username("quiet_river").is_ok());
/// assert!(validate_username("no spaces").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = char_len(username);
    if len == 0 {
        return Err(ValidationError::Required("username"));
    }
    if len < USERNAME_MIN {
        return Err(ValidationError::TooShort {
            field: "username",
            min: USERNAME_MIN,
        });
    }
    validate_max_len("username", username, USERNAME_MAX)?;
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username",
            reason: "only letters, digits and underscores are allowed",
        });
    }
    Ok(())
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    validate_max_len("email", email, EMAIL_MAX)?;

    let invalid = ValidationError::InvalidFormat {
        field: "email",
        reason: "expected an address like name@example.com",
    };
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid);
    };
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid);
    }
    Ok(())
}

/// Media references must be http(s) URLs or paths under `/uploads/`.
pub fn validate_media_url(url: &str) -> Result<(), ValidationError> {
    validate_max_len("media_url", url, MEDIA_URL_MAX)?;
    if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("/uploads/") {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "media_url",
            reason: "must be an http(s) URL or an /uploads/ path",
        })
    }
}

/// Trim, lowercase and de-duplicate tags, preserving first-seen order.
///
/// Empty tags are dropped.
///
/// # Examples
/// ```
/// use db::validation::normalize_tags;
///
/// let tags = normalize_tags(&[" Family ".into(), "family".into(), "work".into()]).unwrap();
/// assert_eq!(tags, vec!["family", "work"]);
/// ```
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        validate_max_len("tag", &tag, TAG_MAX)?;
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    if normalized.len() > MAX_TAGS {
        return Err(ValidationError::OutOfRange {
            field: "tags",
            min: 0,
            max: MAX_TAGS as i64,
        });
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("abc").is_ok());
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::TooShort {
                field: "username",
                min: 3
            })
        );
        assert_eq!(validate_username(""), Err(ValidationError::Required("username")));
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("dash-name").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("me@example.com").is_ok());
        assert!(validate_email("me@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("me@@example.com").is_err());
        assert!(validate_email("me @example.com").is_err());
        assert!(validate_email("me@.com").is_err());
    }

    #[test]
    fn media_url_rules() {
        assert!(validate_media_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_media_url("/uploads/voice.webm").is_ok());
        assert!(validate_media_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn tags_are_normalized_and_bounded() {
        let tags = normalize_tags(&["A".into(), " ".into(), "a".into(), "b".into()]).unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let too_many: Vec<String> = (0..11).map(|i| format!("tag{i}")).collect();
        assert!(normalize_tags(&too_many).is_err());

        assert!(normalize_tags(&["x".repeat(31)]).is_err());
    }

    #[test]
    fn range_check_is_inclusive() {
        assert!(validate_range("intensity", 1, 1, 10).is_ok());
        assert!(validate_range("intensity", 10, 1, 10).is_ok());
        assert!(validate_range("intensity", 11, 1, 10).is_err());
    }
}
