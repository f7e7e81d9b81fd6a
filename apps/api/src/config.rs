use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    /// Public base URL the telephony provider uses to reach our webhooks.
    pub base_url: String,
    /// Applicant-tracking webhook. When unset, completed results are only logged.
    pub ats_webhook_url: Option<String>,
    /// 0 disables the answered-turn limit.
    pub max_interview_turns: usize,
    /// Sessions older than this are swept even if no terminal status arrived.
    pub session_ttl_secs: i64,
    /// How long an `Idempotency-Key` keeps returning the same call.
    pub idempotency_ttl_secs: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            twilio_account_sid: require_env("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: require_env("TWILIO_AUTH_TOKEN")?,
            twilio_phone_number: require_env("TWILIO_PHONE_NUMBER")?,
            base_url: require_env("BASE_URL")?,
            ats_webhook_url: non_blank(std::env::var("ATS_WEBHOOK_URL").ok()),
            max_interview_turns: parse_or_default(
                "MAX_INTERVIEW_TURNS",
                std::env::var("MAX_INTERVIEW_TURNS").ok(),
                8,
            )?,
            session_ttl_secs: parse_or_default(
                "SESSION_TTL_SECS",
                std::env::var("SESSION_TTL_SECS").ok(),
                2 * 60 * 60,
            )?,
            idempotency_ttl_secs: parse_or_default(
                "IDEMPOTENCY_TTL_SECS",
                std::env::var("IDEMPOTENCY_TTL_SECS").ok(),
                24 * 60 * 60,
            )?,
            port: parse_or_default("PORT", std::env::var("PORT").ok(), 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Joins a webhook path onto `base_url`, tolerating a trailing slash.
    pub fn callback_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses an optional raw value, falling back to `default` when unset.
fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        openai_api_key: "sk-test".to_string(),
        openai_model: "gpt-4".to_string(),
        openai_base_url: "https://api.openai.com/v1".to_string(),
        twilio_account_sid: "AC123".to_string(),
        twilio_auth_token: "token".to_string(),
        twilio_phone_number: "+15550000000".to_string(),
        base_url: "https://interviews.example.com/".to_string(),
        ats_webhook_url: None,
        max_interview_turns: 3,
        session_ttl_secs: 7200,
        idempotency_ttl_secs: 86400,
        port: 8080,
        rust_log: "info".to_string(),
    }
}
