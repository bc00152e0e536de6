use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_SESSION_IDLE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,

    // Language model
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub openai_model: String,

    // Market data and news
    pub finnhub_api_key: String,
    pub yahoo_base_url: String,
    pub market_cache_ttl_secs: i64,
    pub news_lookback_days: i64,
    pub http_timeout_secs: u64,

    /// Sessions untouched for this long are dropped
    pub session_idle_ttl_secs: i64,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),

            finnhub_api_key: env::var("FINNHUB_API_KEY").unwrap_or_default(),
            yahoo_base_url: env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| yahoo_client::DEFAULT_BASE_URL.to_string()),
            market_cache_ttl_secs: env::var("MARKET_CACHE_TTL_SECS")
                .unwrap_or_else(|_| market_gateway::DEFAULT_CACHE_TTL_SECS.to_string())
                .parse()
                .context("MARKET_CACHE_TTL_SECS must be a whole number of seconds")?,
            news_lookback_days: parse_lookback_days(
                &env::var("NEWS_LOOKBACK_DAYS").unwrap_or_else(|_| "30".to_string()),
            )?,
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            session_idle_ttl_secs: env::var("SESSION_IDLE_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SESSION_IDLE_TTL_SECS.to_string())
                .parse()
                .context("SESSION_IDLE_TTL_SECS must be a whole number of seconds")?,

            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
        };

        if config.openai_api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY not set, AI summaries will show an error message");
        }
        if config.finnhub_api_key.is_empty() {
            tracing::warn!("FINNHUB_API_KEY not set, news will be unavailable");
        }

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_lookback_days(value: &str) -> Result<i64> {
    let days: i64 = value
        .trim()
        .parse()
        .context("NEWS_LOOKBACK_DAYS must be a whole number of days")?;
    let clamped = days.clamp(0, analysis_core::MAX_LOOKBACK_DAYS);
    if clamped != days {
        tracing::warn!("NEWS_LOOKBACK_DAYS={} out of range, using {}", days, clamped);
    }
    Ok(clamped)
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
