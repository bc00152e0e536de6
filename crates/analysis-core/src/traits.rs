use async_trait::async_trait;
use crate::{AnalysisError, CompanyMetrics, CompletionRequest, DateWindow, NewsItem, PricePoint, TickerMatch, TimeRange};

/// Source of company fundamentals and price history
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn company_metrics(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError>;

    async fn price_history(&self, ticker: &str, range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError>;
}

/// Free-text company name to ticker lookup
#[async_trait]
pub trait TickerSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TickerMatch>, AnalysisError>;
}

/// Company news feed
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn company_news(
        &self,
        ticker: &str,
        window: DateWindow,
        limit: usize,
    ) -> Result<Vec<NewsItem>, AnalysisError>;
}

/// Hosted language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AnalysisError>;

    fn model_name(&self) -> &str;
}
