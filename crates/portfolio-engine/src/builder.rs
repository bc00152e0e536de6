//! Risk-profile portfolio proposals drawn from a fixed large-cap universe.

use crate::{AiPortfolio, AiPortfolioRow};
use analysis_core::{format_number, MetricStyle, NOT_AVAILABLE};
use market_gateway::MarketGateway;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "JPM", "JNJ", "V", "PG",
    "UNH", "HD", "MA", "KO", "PEP", "WMT", "CVX", "XOM", "BAC", "ORCL",
    "PFE", "VZ", "ABBV", "T", "MRK", "META", "INTC", "CRM", "NFLX", "QCOM",
];

pub const DEFAULT_STOCK_COUNT: usize = 10;
pub const MAX_STOCK_COUNT: usize = 50;

const NO_TICKERS_MESSAGE: &str = "No tickers available for this risk level.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_beta(beta: f64) -> Self {
        if beta < 0.9 {
            RiskLevel::Low
        } else if beta <= 1.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Classify the universe by beta and draw a random sample from the requested class.
///
/// Tickers without a beta, or whose fetch fails, are skipped.
pub async fn select_by_risk<R: Rng + ?Sized>(
    gateway: &MarketGateway,
    universe: &[&str],
    risk: RiskLevel,
    limit: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut candidates = Vec::new();

    for ticker in universe {
        let beta = match gateway.fetch(ticker).await {
            Ok(metrics) => metrics.beta,
            Err(_) => continue,
        };
        if let Some(beta) = beta {
            if RiskLevel::from_beta(beta) == risk {
                candidates.push(ticker.to_string());
            }
        }
    }

    let amount = limit.min(candidates.len());
    tracing::info!(
        "Risk level {}: {} candidates, sampling {}",
        risk.as_str(),
        candidates.len(),
        amount
    );

    candidates.choose_multiple(rng, amount).cloned().collect()
}

/// Build an equally weighted proposal for `capital` at the given risk level.
pub async fn build_ai_portfolio<R: Rng + ?Sized>(
    gateway: &MarketGateway,
    capital: f64,
    risk: RiskLevel,
    num_stocks: Option<usize>,
    rng: &mut R,
) -> AiPortfolio {
    let limit = num_stocks
        .unwrap_or(DEFAULT_STOCK_COUNT)
        .clamp(1, MAX_STOCK_COUNT);
    let tickers = select_by_risk(gateway, DEFAULT_UNIVERSE, risk, limit, rng).await;

    if tickers.is_empty() {
        return AiPortfolio {
            tickers,
            rows: Vec::new(),
            message: Some(NO_TICKERS_MESSAGE.to_string()),
        };
    }

    let allocation = 1.0 / tickers.len() as f64;
    let invested = (capital * allocation * 100.0).round() / 100.0;
    let mut rows = Vec::with_capacity(tickers.len());

    for ticker in &tickers {
        let Ok(metrics) = gateway.fetch(ticker).await else {
            continue;
        };

        rows.push(AiPortfolioRow {
            ticker: ticker.clone(),
            company: metrics.display_name().unwrap_or(NOT_AVAILABLE).to_string(),
            sector: metrics.sector.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            country: metrics.country.clone().unwrap_or_else(|| "USA".to_string()),
            allocation: format_number(Some(allocation), MetricStyle::Percent),
            investment: format_number(Some(invested), MetricStyle::Usd),
            pe: format_number(metrics.trailing_pe, MetricStyle::Ratio),
            roe: format_number(metrics.return_on_equity, MetricStyle::Percent),
            beta: format_number(metrics.beta, MetricStyle::Ratio),
        });
    }

    AiPortfolio {
        tickers,
        rows,
        message: None,
    }
}
