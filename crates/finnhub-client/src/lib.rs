use analysis_core::{AnalysisError, DateWindow, NewsItem, NewsProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl FinnhubClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Company news inside the window, newest first as Finnhub returns it.
    /// Articles without a headline or link are dropped; at most `limit` are kept.
    pub async fn get_company_news(
        &self,
        symbol: &str,
        window: DateWindow,
        limit: usize,
    ) -> Result<Vec<NewsItem>, AnalysisError> {
        if self.api_key.is_empty() {
            return Err(AnalysisError::Configuration("FINNHUB_API_KEY is not set".to_string()));
        }

        let url = format!("{}/company-news", self.base_url);
        let from = window.from.format("%Y-%m-%d").to_string();
        let to = window.to.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(AnalysisError::Configuration(format!(
                "Finnhub rejected the API key (HTTP {})",
                status
            )));
        }

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let articles: Vec<FinnhubArticle> = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let items = collect_news(articles, limit);
        tracing::debug!("Finnhub returned {} usable articles for {}", items.len(), symbol);
        Ok(items)
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    async fn company_news(
        &self,
        ticker: &str,
        window: DateWindow,
        limit: usize,
    ) -> Result<Vec<NewsItem>, AnalysisError> {
        self.get_company_news(ticker, window, limit).await
    }
}

fn collect_news(articles: Vec<FinnhubArticle>, limit: usize) -> Vec<NewsItem> {
    articles
        .into_iter()
        .filter_map(|a| {
            let headline = a.headline.filter(|h| !h.trim().is_empty())?;
            let url = a.url.filter(|u| !u.trim().is_empty())?;
            Some(NewsItem {
                headline,
                summary: a.summary.unwrap_or_default(),
                url,
            })
        })
        .take(limit)
        .collect()
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    url: Option<String>,
}
