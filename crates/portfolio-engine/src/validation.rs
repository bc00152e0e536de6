use crate::{PortfolioError, PreparedPortfolio};
use market_gateway::MarketGateway;

/// Allowed distance of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Check tickers against weights given as fractions.
///
/// Returns the confirmation message on success.
pub fn validate_portfolio_inputs(tickers: &[String], weights: &[f64]) -> Result<&'static str, PortfolioError> {
    if tickers.is_empty() || weights.is_empty() {
        return Err(PortfolioError::validation("Tickers and weights cannot be empty."));
    }
    if tickers.len() != weights.len() {
        return Err(PortfolioError::validation(
            "The number of tickers must match the number of weights.",
        ));
    }
    if !weights.iter().all(|w| w.is_finite()) {
        return Err(PortfolioError::validation("All weights must be numbers."));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(PortfolioError::validation(
            "Weights must sum to approximately 1.0 (100%).",
        ));
    }
    Ok("Inputs are valid.")
}

/// Comma-separated entries, trimmed, blanks dropped
pub fn split_entries(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse "40,30,30" into fractions. A blank input means no weights.
pub fn parse_weight_percents(input: &str) -> Result<Option<Vec<f64>>, PortfolioError> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    input
        .split(',')
        .map(|w| {
            w.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v / 100.0)
        })
        .collect::<Option<Vec<f64>>>()
        .map(Some)
        .ok_or_else(|| PortfolioError::validation("Please enter valid numeric weights like 50,30,20"))
}

/// Turn the portfolio form into resolved tickers and weights.
///
/// Custom weights are checked before any lookup: a sum outside 100 percent
/// or a count that differs from the number of entries is rejected.
/// Unresolvable entries are dropped with a warning; with custom weights that
/// leaves the counts misaligned, which is rejected too. Fewer than two
/// resolved tickers is an error.
pub async fn prepare_portfolio(
    gateway: &MarketGateway,
    tickers_input: &str,
    weights_input: &str,
) -> Result<PreparedPortfolio, PortfolioError> {
    let entries = split_entries(tickers_input);
    let weights = parse_weight_percents(weights_input)?;

    if let Some(w) = &weights {
        let total: f64 = w.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PortfolioError::validation("Weights must add up to 100 percent."));
        }
        if w.len() != entries.len() {
            return Err(PortfolioError::validation(
                "The number of weights must match the number of tickers.",
            ));
        }
    }

    let mut warnings = Vec::new();
    let mut tickers = Vec::new();
    let mut unresolved = Vec::new();

    for item in entries {
        match gateway.resolve_to_ticker(&item).await {
            Some(ticker) => tickers.push(ticker),
            None => unresolved.push(item),
        }
    }

    if !unresolved.is_empty() {
        let names = unresolved.join(", ");
        if weights.is_some() {
            return Err(PortfolioError::validation(format!(
                "The number of weights must match the number of tickers. Could not resolve: {}",
                names
            )));
        }
        warnings.push(format!("The following entries could not be resolved: {}", names));
    }

    if tickers.len() < 2 {
        return Err(PortfolioError::validation("Please enter at least two tickers."));
    }

    tracing::info!(
        "Prepared portfolio: {} tickers, {} unresolved, custom weights: {}",
        tickers.len(),
        unresolved.len(),
        weights.is_some()
    );

    Ok(PreparedPortfolio {
        tickers,
        weights,
        warnings,
    })
}
