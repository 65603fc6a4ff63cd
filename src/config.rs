// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Number of questions requested from the model when `QUIZ_QUESTION_COUNT` is unset.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Number of answers per question when `QUIZ_ANSWER_COUNT` is unset.
pub const DEFAULT_ANSWER_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// HS256 secret shared with the identity provider that issues user tokens.
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,

    pub rapid_api_key: String,
    /// Value of the `x-rapidapi-host` header.
    pub rapid_api_host: String,
    /// Scheme and authority requests are sent to, e.g. `https://yt-api.p.rapidapi.com`.
    pub rapid_api_base_url: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,

    pub question_count: usize,
    pub answer_count: usize,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rapid_api_key = env::var("RAPID_API_KEY")
            .expect("RAPID_API_KEY must be set");

        let openai_api_key = env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set");

        let rapid_api_host = var_or("RAPID_API_HOST", "yt-api.p.rapidapi.com");
        let rapid_api_base_url = var_or("RAPID_API_BASE_URL", &format!("https://{}", rapid_api_host));

        Self {
            database_url,
            jwt_secret,
            rust_log: var_or("RUST_LOG", "info"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            rapid_api_key,
            rapid_api_host,
            rapid_api_base_url,
            openai_api_key,
            openai_base_url: var_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: var_or("OPENAI_MODEL", "gpt-4o-mini"),
            question_count: parsed_or("QUIZ_QUESTION_COUNT", DEFAULT_QUESTION_COUNT),
            answer_count: parsed_or("QUIZ_ANSWER_COUNT", DEFAULT_ANSWER_COUNT),
            http_timeout_secs: parsed_or("HTTP_TIMEOUT_SECS", 60),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads a numeric variable, falling back to `default` when unset or unparsable.
fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
