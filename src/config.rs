// src/config.rs
//! Process-wide settings, read once from the environment at startup.

use base64::Engine;
use rand::RngCore;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3-0324";
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub inference: InferenceConfig,
    pub session: SessionConfig,
    pub admin_email: Option<String>,
    pub history_capacity: usize,
    pub assistant_name: String,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
    pub retry_window: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
    /// False when the secret was generated at startup.
    pub secret_from_env: bool,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (secret, secret_from_env) = match get("SESSION_SECRET") {
            Some(secret) => (secret, true),
            None => (generate_secret(), false),
        };

        let history_capacity = parse_or(&get, "HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?;
        if history_capacity < 2 {
            return Err(ConfigError::InvalidValue {
                key: "HISTORY_CAPACITY",
                value: history_capacity.to_string(),
            });
        }

        let ttl_hours = parse_or(&get, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }

        Ok(Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL"),
            inference: InferenceConfig {
                api_token: get("HF_API_TOKEN"),
                base_url: get("INFERENCE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_INFERENCE_BASE_URL.to_string()),
                model: get("INFERENCE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                request_timeout: Duration::from_secs(parse_or(&get, "INFERENCE_TIMEOUT_SECS", 60)?),
                retry_window: Duration::from_secs(parse_or(&get, "INFERENCE_RETRY_WINDOW_SECS", 90)?),
            },
            session: SessionConfig {
                secret,
                ttl_hours,
                secret_from_env,
                bcrypt_cost: parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            admin_email: get("ADMIN_EMAIL"),
            history_capacity,
            assistant_name: get("ASSISTANT_NAME").unwrap_or_else(|| "Assistant".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

/// 256 random bits, base64 encoded.
pub fn generate_secret() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.history_capacity, 60);
        assert_eq!(config.inference.model, DEFAULT_MODEL);
        assert!(config.inference.api_token.is_none());
        assert!(config.database_url.is_none());
        assert!(config.admin_email.is_none());
        assert!(!config.session.secret_from_env);
        assert!(!config.session.secret.is_empty());
    }

    #[test]
    fn test_values_are_read_from_lookup() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("ADMIN_EMAIL", "Boss@example.com"),
            ("SESSION_SECRET", "s3cret"),
            ("INFERENCE_TIMEOUT_SECS", "30"),
            ("HISTORY_CAPACITY", "10"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_email.as_deref(), Some("Boss@example.com"));
        assert_eq!(config.session.secret, "s3cret");
        assert!(config.session.secret_from_env);
        assert_eq!(config.inference.request_timeout, Duration::from_secs(30));
        assert_eq!(config.history_capacity, 10);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("HF_API_TOKEN", "  "), ("ADMIN_EMAIL", "")]).unwrap();
        assert!(config.inference.api_token.is_none());
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue { key: "PORT", value: "http".to_string() }
        );
        assert!(config_from(&[("HISTORY_CAPACITY", "1")]).is_err());
    }

    #[test]
    fn test_session_ttl_must_be_positive_and_bounded() {
        for bad in ["0", "-1", "3000000000000"] {
            assert_eq!(
                config_from(&[("SESSION_TTL_HOURS", bad)]).unwrap_err(),
                ConfigError::InvalidValue { key: "SESSION_TTL_HOURS", value: bad.to_string() }
            );
        }
        assert_eq!(config_from(&[]).unwrap().session.ttl_hours, DEFAULT_SESSION_TTL_HOURS);
        let config = config_from(&[("SESSION_TTL_HOURS", "8760")]).unwrap();
        assert_eq!(config.session.ttl_hours, MAX_SESSION_TTL_HOURS);
    }
}
