use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub news_api_token: String,
    pub news_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://newsreader.db?mode=rwc".to_string(),
            news_api_token: String::new(),
            // base url must keep its trailing slash so endpoint joins append
            news_base_url: "https://api.thenewsapi.com/v1/news/".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present. Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            news_api_token: env::var("API_KEY").unwrap_or(defaults.news_api_token),
            news_base_url: env::var("NEWS_BASE_URL").unwrap_or(defaults.news_base_url),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}
