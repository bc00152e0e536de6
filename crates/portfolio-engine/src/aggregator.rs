use crate::{validate_portfolio_inputs, PortfolioAnalysis, PortfolioEntry, PortfolioError, WeightedSummary};
use analysis_core::NOT_AVAILABLE;
use market_gateway::MarketGateway;
use std::collections::BTreeMap;

/// Fetch every holding and compute weighted averages.
///
/// Inputs are validated before any fetch. Without weights each holding gets
/// `1 / len`. Holdings whose fetch fails are dropped and the remaining
/// weights are left as they are, so a partial portfolio sums to less than 1.
pub async fn aggregate(
    gateway: &MarketGateway,
    tickers: &[String],
    weights: Option<&[f64]>,
) -> Result<PortfolioAnalysis, PortfolioError> {
    let weights: Vec<f64> = match weights {
        Some(w) => {
            validate_portfolio_inputs(tickers, w)?;
            w.to_vec()
        }
        None => {
            if tickers.is_empty() {
                return Err(PortfolioError::validation("Tickers cannot be empty."));
            }
            vec![1.0 / tickers.len() as f64; tickers.len()]
        }
    };

    let mut entries = Vec::with_capacity(tickers.len());
    let mut dropped = Vec::new();

    for (ticker, weight) in tickers.iter().zip(weights) {
        match gateway.fetch(ticker).await {
            Ok(metrics) => entries.push(PortfolioEntry {
                ticker: ticker.clone(),
                weight,
                metrics,
            }),
            Err(_) => dropped.push(ticker.clone()),
        }
    }

    if !dropped.is_empty() {
        tracing::warn!("Dropped {} holdings without market data: {:?}", dropped.len(), dropped);
    }

    let summary = weighted_summary(&entries);

    Ok(PortfolioAnalysis {
        entries,
        summary,
        dropped,
    })
}

fn weighted_summary(entries: &[PortfolioEntry]) -> WeightedSummary {
    WeightedSummary {
        pe: weighted_sum(entries, |e| e.metrics.trailing_pe),
        pb: weighted_sum(entries, |e| e.metrics.price_to_book),
        roe: weighted_sum(entries, |e| e.metrics.return_on_equity),
        beta: weighted_sum(entries, |e| e.metrics.beta),
        debt_to_equity: weighted_sum(entries, PortfolioEntry::debt_to_equity_ratio),
    }
}

/// `Σ value × weight` over entries that report the field
fn weighted_sum<F>(entries: &[PortfolioEntry], field: F) -> Option<f64>
where
    F: Fn(&PortfolioEntry) -> Option<f64>,
{
    entries
        .iter()
        .filter_map(|e| field(e).map(|v| v * e.weight))
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Portfolio weight per sector in percent, sectors sorted by name
pub fn sector_weights(entries: &[PortfolioEntry]) -> BTreeMap<String, f64> {
    let mut weights = BTreeMap::new();
    for entry in entries {
        let sector = entry
            .metrics
            .sector
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        *weights.entry(sector).or_insert(0.0) += entry.weight * 100.0;
    }
    weights
}
