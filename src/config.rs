use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,

    // Language services API
    pub langtools_api_url: String,
    pub langtools_api_key: String,

    // OpenAI
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,

    // Learner
    pub native_language: String,

    // Catalog cache
    pub catalog_cache_path: String,

    // Long polling
    pub poll_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Telegram
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),

            // Language services
            langtools_api_url: std::env::var("LANGTOOLS_API_URL")
                .context("LANGTOOLS_API_URL not set")?,
            langtools_api_key: std::env::var("LANGTOOLS_API_KEY")
                .context("LANGTOOLS_API_KEY not set")?,

            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set")?,
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),

            // The language the learner reads answers in; sentences are
            // translated into it and questions are assumed to arrive in it.
            native_language: std::env::var("NATIVE_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),

            catalog_cache_path: std::env::var("CATALOG_CACHE_PATH")
                .unwrap_or_else(|_| "language_data.json".to_string()),

            poll_timeout_secs: std::env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}
