use analysis_core::{
    AnalysisError, BenchmarkMetrics, CompanyMetrics, MarketDataProvider, PricePoint, TickerMatch,
    TickerSearch, TimeRange,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

pub mod directory;
pub use directory::{DirectoryEntry, TickerDirectory};

pub const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

const SEARCH_LIMIT: usize = 5;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

impl<T: Clone> CacheEntry<T> {
    fn fresh(&self, ttl_secs: i64) -> Option<T> {
        let age = (Utc::now() - self.cached_at).num_seconds();
        (age < ttl_secs).then(|| self.data.clone())
    }
}

/// Single entry point for market data.
///
/// Every call returns a `Result`; failures are logged and handed back to the
/// caller, never retried. Successful lookups are cached per upper-cased
/// ticker for the freshness window.
pub struct MarketGateway {
    market: Arc<dyn MarketDataProvider>,
    search: Arc<dyn TickerSearch>,
    ttl_secs: i64,
    /// Cache company metrics per ticker
    metrics_cache: DashMap<String, CacheEntry<CompanyMetrics>>,
    /// Cache price history per (ticker, range)
    history_cache: DashMap<String, CacheEntry<Vec<PricePoint>>>,
}

impl MarketGateway {
    pub fn new(market: Arc<dyn MarketDataProvider>, search: Arc<dyn TickerSearch>) -> Self {
        Self {
            market,
            search,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            metrics_cache: DashMap::new(),
            history_cache: DashMap::new(),
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Company metrics for any input string; no format validation happens first.
    pub async fn fetch(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError> {
        let cache_key = ticker.trim().to_uppercase();
        if let Some(entry) = self.metrics_cache.get(&cache_key) {
            if let Some(data) = entry.fresh(self.ttl_secs) {
                return Ok(data);
            }
        }

        match self.market.company_metrics(&cache_key).await {
            Ok(metrics) => {
                self.metrics_cache.insert(cache_key, CacheEntry {
                    data: metrics.clone(),
                    cached_at: Utc::now(),
                });
                Ok(metrics)
            }
            Err(e) => {
                tracing::warn!("Market data fetch failed for '{}': {}", cache_key, e);
                Err(e)
            }
        }
    }

    /// Closing-price history for the chart (cached)
    pub async fn price_history(&self, ticker: &str, range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError> {
        let symbol = ticker.trim().to_uppercase();
        let cache_key = format!("{}:{}", symbol, range.label());
        if let Some(entry) = self.history_cache.get(&cache_key) {
            if let Some(data) = entry.fresh(self.ttl_secs) {
                return Ok(data);
            }
        }

        match self.market.price_history(&symbol, range).await {
            Ok(points) => {
                self.history_cache.insert(cache_key, CacheEntry {
                    data: points.clone(),
                    cached_at: Utc::now(),
                });
                Ok(points)
            }
            Err(e) => {
                tracing::warn!("Price history fetch failed for '{}' ({}): {}", symbol, range.label(), e);
                Err(e)
            }
        }
    }

    /// Latest close: the quote's current price, else the last point of the one-month history
    pub async fn closing_price(&self, ticker: &str) -> Option<f64> {
        if let Ok(metrics) = self.fetch(ticker).await {
            if let Some(price) = metrics.current_price {
                return Some(price);
            }
        }

        self.price_history(ticker, TimeRange::OneMonth)
            .await
            .ok()
            .and_then(|points| points.last().map(|p| p.close))
    }

    /// PEG ratio rounded to two decimals
    pub async fn peg_ratio(&self, ticker: &str) -> Option<f64> {
        let peg = self.fetch(ticker).await.ok()?.peg_ratio;
        tracing::debug!("PEG for {}: {:?}", ticker, peg);
        peg.map(|p| (p * 100.0).round() / 100.0)
    }

    /// Valuation metrics of the sector's benchmark fund
    pub async fn benchmark_metrics(&self, sector: &str) -> Result<BenchmarkMetrics, AnalysisError> {
        let etf = sector_benchmarks::benchmark_etf(sector);
        let info = self.fetch(etf).await?;

        Ok(BenchmarkMetrics {
            benchmark: etf.to_string(),
            name: info.short_name.clone().unwrap_or_else(|| etf.to_string()),
            pe: info.trailing_pe,
            pb: info.price_to_book,
            roe: info.return_on_equity,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, AnalysisError> {
        self.search.search(query.trim(), SEARCH_LIMIT).await.map_err(|e| {
            tracing::warn!("Ticker search failed for '{}': {}", query, e);
            e
        })
    }

    /// Resolve user input to a ticker.
    ///
    /// The upper-cased input is accepted when the provider knows it by name;
    /// otherwise the first search hit wins.
    pub async fn resolve_to_ticker(&self, input: &str) -> Option<String> {
        let candidate = input.trim().to_uppercase();
        if candidate.is_empty() {
            return None;
        }

        if let Ok(metrics) = self.fetch(&candidate).await {
            if metrics.is_resolvable() {
                return Some(candidate);
            }
        }

        match self.search(input).await {
            Ok(matches) => matches.into_iter().next().map(|m| m.symbol),
            Err(_) => None,
        }
    }

    /// Drop expired cache entries
    pub fn evict_expired(&self) {
        let ttl = self.ttl_secs;
        let now = Utc::now();
        self.metrics_cache.retain(|_, e| (now - e.cached_at).num_seconds() < ttl);
        self.history_cache.retain(|_, e| (now - e.cached_at).num_seconds() < ttl);
    }
}
