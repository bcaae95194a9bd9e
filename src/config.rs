use std::{env, fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerificationMode {
    Simulated,
    Crawl,
}

impl FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(VerificationMode::Simulated),
            "crawl" => Ok(VerificationMode::Crawl),
            other => Err(format!("unknown verification mode '{}'", other)),
        }
    }
}

#[derive(Debug, Error)]
#[error("{key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    /// Session lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub google_client_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub verification_mode: VerificationMode,
    pub verification_delay_ms: u64,
    pub verification_success_rate: f64,
    pub http_timeout_secs: u64,
    pub snapshot_path: Option<String>,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET_KEY").map_err(|e| ConfigError {
            key: "JWT_SECRET_KEY",
            reason: e.to_string(),
        })?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://linkauthority.db?mode=rwc".to_string());
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let verification_mode = match env::var("VERIFICATION_MODE") {
            Ok(raw) => raw.parse().map_err(|reason| ConfigError {
                key: "VERIFICATION_MODE",
                reason,
            })?,
            Err(_) => VerificationMode::Simulated,
        };

        let verification_success_rate: f64 =
            parse_or("VERIFICATION_SUCCESS_RATE", 0.8)?;
        if !(0.0..=1.0).contains(&verification_success_rate) {
            return Err(ConfigError {
                key: "VERIFICATION_SUCCESS_RATE",
                reason: "must be between 0 and 1".to_string(),
            });
        }

        Ok(Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage: parse_or("JWT_MAXAGE", 60)?,
            port: parse_or("PORT", 8000)?,
            google_client_id: non_empty("GOOGLE_CLIENT_ID"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model,
            verification_mode,
            verification_delay_ms: parse_or("VERIFICATION_DELAY_MS", 1500)?,
            verification_success_rate,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 10)?,
            snapshot_path: non_empty("SNAPSHOT_PATH"),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
