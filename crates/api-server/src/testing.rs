//! In-memory providers for handler and router tests.

use analysis_core::{
    AnalysisError, AnalystTargets, CompanyMetrics, CompletionRequest, DateWindow, LanguageModel,
    MarketDataProvider, NewsItem, NewsProvider, PricePoint, TickerMatch, TickerSearch, TimeRange,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use market_gateway::TickerDirectory;
use std::collections::HashMap;
use std::sync::Arc;

use crate::AppState;

pub const MODEL_REPLY: &str = "Buy the dip. **AI Verdict: Buy**";

pub struct FakeWorld {
    pub companies: HashMap<String, CompanyMetrics>,
}

impl Default for FakeWorld {
    fn default() -> Self {
        let apple = CompanyMetrics {
            ticker: "AAPL".to_string(),
            short_name: Some("Apple Inc.".to_string()),
            long_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            country: Some("United States".to_string()),
            market_cap: Some(3.0e12),
            trailing_pe: Some(30.0),
            return_on_equity: Some(1.5),
            beta: Some(1.1),
            peg_ratio: Some(1.5),
            current_price: Some(190.0),
            analyst_targets: Some(AnalystTargets {
                low: Some(150.0),
                high: Some(250.0),
                mean: Some(200.0),
                median: Some(205.0),
            }),
            ..Default::default()
        };
        let microsoft = CompanyMetrics {
            ticker: "MSFT".to_string(),
            short_name: Some("Microsoft Corporation".to_string()),
            sector: Some("Technology".to_string()),
            trailing_pe: Some(35.0),
            beta: Some(1.0),
            current_price: Some(410.0),
            ..Default::default()
        };
        let tech_fund = CompanyMetrics {
            ticker: "XLK".to_string(),
            short_name: Some("Technology Select Sector SPDR Fund".to_string()),
            trailing_pe: Some(38.0),
            price_to_book: Some(9.5),
            ..Default::default()
        };

        Self {
            companies: [apple, microsoft, tech_fund]
                .into_iter()
                .map(|c| (c.ticker.clone(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeWorld {
    async fn company_metrics(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError> {
        self.companies
            .get(ticker)
            .cloned()
            .ok_or_else(|| AnalysisError::NotFound(ticker.to_string()))
    }

    async fn price_history(&self, ticker: &str, _range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError> {
        let company = self
            .companies
            .get(ticker)
            .ok_or_else(|| AnalysisError::NotFound(ticker.to_string()))?;
        let close = company.current_price.unwrap_or(100.0);

        Ok((1..=3)
            .filter_map(|day| {
                Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).single().map(|timestamp| PricePoint {
                    timestamp,
                    close: close + day as f64,
                })
            })
            .collect())
    }
}

pub struct NoSearch;

#[async_trait]
impl TickerSearch for NoSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<TickerMatch>, AnalysisError> {
        Ok(Vec::new())
    }
}

/// Two articles for every ticker
pub struct FakeNews;

#[async_trait]
impl NewsProvider for FakeNews {
    async fn company_news(
        &self,
        ticker: &str,
        _window: DateWindow,
        limit: usize,
    ) -> Result<Vec<NewsItem>, AnalysisError> {
        Ok((1..=2)
            .map(|i| NewsItem {
                headline: format!("{} headline {}", ticker, i),
                summary: format!("{} summary {}", ticker, i),
                url: format!("https://news.example.com/{}/{}", ticker, i),
            })
            .take(limit)
            .collect())
    }
}

pub struct CannedModel;

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, AnalysisError> {
        Ok(MODEL_REPLY.to_string())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

pub fn test_state(world: FakeWorld) -> AppState {
    AppState::new(
        Arc::new(world),
        Arc::new(NoSearch),
        Arc::new(FakeNews),
        Arc::new(CannedModel),
        TickerDirectory::bundled().unwrap(),
    )
}
