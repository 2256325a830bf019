//! Process configuration, read once at startup from the environment.

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use utils::{assets::database_path, path::expand_tilde};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CHAT_RATE_LIMIT: u32 = 20;
pub const DEFAULT_CACHE_CAPACITY: usize = 500;
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Used only by debug builds when `MOH_JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "mirror-of-heart-development-secret-not-for-production";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the generative-language provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
    /// Lowercased; registering with one of these grants the admin role.
    pub admin_emails: Vec<String>,
    pub llm: LlmConfig,
    pub chat_rate_limit: u32,
    pub cache_capacity: usize,
    pub static_dir: Option<PathBuf>,
}

fn parse<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_positive<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + ToString,
{
    let value = parse(key, raw, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("MOH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port_key = if get("MOH_PORT").is_some() {
            "MOH_PORT"
        } else {
            "PORT"
        };
        let port = parse(port_key, get(port_key), DEFAULT_PORT)?;

        let database_path = get("MOH_DATABASE_PATH")
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(database_path);

        let jwt_secret = match get("MOH_JWT_SECRET") {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                return Err(ConfigError::Invalid {
                    key: "MOH_JWT_SECRET",
                    value: format!("<{} bytes, need at least {MIN_JWT_SECRET_LEN}>", secret.len()),
                });
            }
            Some(secret) => SecretString::from(secret),
            None if cfg!(debug_assertions) => {
                tracing::warn!("MOH_JWT_SECRET not set; using the development secret");
                SecretString::from(DEV_JWT_SECRET)
            }
            None => return Err(ConfigError::Missing("MOH_JWT_SECRET")),
        };

        let token_ttl_hours = parse_positive(
            "MOH_TOKEN_TTL_HOURS",
            get("MOH_TOKEN_TTL_HOURS"),
            DEFAULT_TOKEN_TTL_HOURS,
        )?;
        if token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid {
                key: "MOH_TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        let admin_emails = get("MOH_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let llm = LlmConfig {
            api_key: get("GEMINI_API_KEY").map(SecretString::from),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_positive(
                "MOH_LLM_TIMEOUT_SECS",
                get("MOH_LLM_TIMEOUT_SECS"),
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
        };

        let chat_rate_limit = parse_positive(
            "MOH_CHAT_RATE_LIMIT",
            get("MOH_CHAT_RATE_LIMIT"),
            DEFAULT_CHAT_RATE_LIMIT,
        )?;
        let cache_capacity = parse_positive(
            "MOH_CACHE_CAPACITY",
            get("MOH_CACHE_CAPACITY"),
            DEFAULT_CACHE_CAPACITY,
        )?;
        let static_dir = get("MOH_STATIC_DIR").map(|p| expand_tilde(&p));

        Ok(Self {
            host,
            port,
            database_path,
            jwt_secret,
            token_ttl_hours,
            admin_emails,
            llm,
            chat_rate_limit,
            cache_capacity,
            static_dir,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "MOH_HOST",
                value: self.host.clone(),
            })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.llm.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.llm.timeout, Duration::from_secs(30));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.chat_rate_limit, 20);
        assert_eq!(config.cache_capacity, 500);
        assert!(config.static_dir.is_none());
        assert!(config.jwt_secret_bytes().len() >= MIN_JWT_SECRET_LEN);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("MOH_HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("MOH_ADMIN_EMAILS", " Admin@Example.com, ,ops@example.com"),
            ("GEMINI_API_KEY", "key-123"),
            ("GEMINI_BASE_URL", "http://localhost:9999/"),
            ("MOH_CHAT_RATE_LIMIT", "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.admin_emails, vec!["admin@example.com", "ops@example.com"]);
        assert!(config.is_admin_email("ADMIN@example.com "));
        assert!(!config.is_admin_email("someone@example.com"));
        assert_eq!(config.llm.base_url, "http://localhost:9999");
        assert_eq!(
            config.llm.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("key-123".to_string())
        );
        assert_eq!(config.chat_rate_limit, 5);
    }

    #[test]
    fn token_ttl_has_an_upper_bound() {
        let err = Config::from_lookup(lookup(&[(
            "MOH_TOKEN_TTL_HOURS",
            "9223372036854775807",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "MOH_TOKEN_TTL_HOURS",
                value: "9223372036854775807".into()
            }
        );

        let max = MAX_TOKEN_TTL_HOURS.to_string();
        let config =
            Config::from_lookup(lookup(&[("MOH_TOKEN_TTL_HOURS", max.as_str())])).unwrap();
        assert_eq!(config.token_ttl_hours, MAX_TOKEN_TTL_HOURS);
    }

    #[test]
    fn moh_port_wins_over_port() {
        let config =
            Config::from_lookup(lookup(&[("MOH_PORT", "4000"), ("PORT", "5000")])).unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn invalid_numbers_are_reported_with_their_key() {
        let err = Config::from_lookup(lookup(&[("MOH_PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "MOH_PORT",
                value: "eighty".into()
            }
        );

        let err = Config::from_lookup(lookup(&[("MOH_CACHE_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MOH_CACHE_CAPACITY", .. }));
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let err = Config::from_lookup(lookup(&[("MOH_JWT_SECRET", "too-short")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MOH_JWT_SECRET", .. }));
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe {
            std::env::set_var("MOH_TOKEN_TTL_HOURS", "12");
        }
        let config = Config::from_env();
        unsafe {
            std::env::remove_var("MOH_TOKEN_TTL_HOURS");
        }
        assert_eq!(config.unwrap().token_ttl_hours, 12);
    }
}
