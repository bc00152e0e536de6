use analysis_core::{
    AnalysisError, CompanyMetrics, MarketDataProvider, PricePoint, TickerMatch, TickerSearch,
    TimeRange,
};
use async_trait::async_trait;
use market_gateway::MarketGateway;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct FakeMarket {
    companies: HashMap<String, CompanyMetrics>,
    pub calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new(companies: Vec<CompanyMetrics>) -> Self {
        Self {
            companies: companies.into_iter().map(|c| (c.ticker.clone(), c)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn company_metrics(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.companies
            .get(ticker)
            .cloned()
            .ok_or_else(|| AnalysisError::NotFound(ticker.to_string()))
    }

    async fn price_history(&self, ticker: &str, _range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError> {
        Err(AnalysisError::NotFound(ticker.to_string()))
    }
}

pub struct NoSearch;

#[async_trait]
impl TickerSearch for NoSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<TickerMatch>, AnalysisError> {
        Ok(Vec::new())
    }
}

pub fn company(ticker: &str, sector: &str, pe: f64) -> CompanyMetrics {
    CompanyMetrics {
        ticker: ticker.to_string(),
        short_name: Some(format!("{} Corp", ticker)),
        sector: Some(sector.to_string()),
        trailing_pe: Some(pe),
        ..Default::default()
    }
}

pub fn gateway_with(companies: Vec<CompanyMetrics>) -> MarketGateway {
    gateway_and_market(companies).0
}

pub fn gateway_and_market(companies: Vec<CompanyMetrics>) -> (MarketGateway, Arc<FakeMarket>) {
    let market = Arc::new(FakeMarket::new(companies));
    let gateway = MarketGateway::new(market.clone(), Arc::new(NoSearch));
    (gateway, market)
}
