use serde::{Deserialize, Serialize};

/// Fallback benchmark for sectors outside the table
pub const BROAD_MARKET_ETF: &str = "SPY";

/// Approximate S&P 500 sector weights, in percent.
///
/// Sector names follow the index convention ("Financials"), which is not
/// always the provider's label ("Financial Services").
pub const SP500_SECTOR_WEIGHTS: &[(&str, f64)] = &[
    ("Technology", 28.1),
    ("Healthcare", 13.0),
    ("Financials", 11.0),
    ("Consumer Cyclical", 10.5),
    ("Communication Services", 8.8),
    ("Industrials", 7.9),
    ("Consumer Defensive", 6.6),
    ("Energy", 4.4),
    ("Utilities", 2.6),
    ("Materials", 2.5),
    ("Real Estate", 2.3),
];

/// A sector and the ETF used as its valuation benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorEtf {
    pub sector: String,
    pub symbol: String,
    pub name: String,
}

impl SectorEtf {
    /// The SPDR sector funds keyed by provider sector name, plus the broad-market fallback
    pub fn standard_sectors() -> Vec<SectorEtf> {
        [
            ("Technology", "XLK", "Technology Select Sector SPDR Fund"),
            ("Financial Services", "XLF", "Financial Select Sector SPDR Fund"),
            ("Consumer Cyclical", "XLY", "Consumer Discretionary Select Sector SPDR Fund"),
            ("Consumer Defensive", "XLP", "Consumer Staples Select Sector SPDR Fund"),
            ("Healthcare", "XLV", "Health Care Select Sector SPDR Fund"),
            ("Energy", "XLE", "Energy Select Sector SPDR Fund"),
            ("Industrials", "XLI", "Industrial Select Sector SPDR Fund"),
            ("Materials", "XLB", "Materials Select Sector SPDR Fund"),
            ("Real Estate", "XLRE", "Real Estate Select Sector SPDR Fund"),
            ("Utilities", "XLU", "Utilities Select Sector SPDR Fund"),
            ("Communication Services", "XLC", "Communication Services Select Sector SPDR Fund"),
            ("Broad Market", BROAD_MARKET_ETF, "SPDR S&P 500 ETF Trust"),
        ]
        .into_iter()
        .map(|(sector, symbol, name)| SectorEtf {
            sector: sector.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect()
    }
}

/// Benchmark ETF ticker for a provider sector name. Exact match; anything else gets SPY.
pub fn benchmark_etf(sector: &str) -> &'static str {
    match sector {
        "Technology" => "XLK",
        "Financial Services" => "XLF",
        "Consumer Cyclical" => "XLY",
        "Consumer Defensive" => "XLP",
        "Healthcare" => "XLV",
        "Energy" => "XLE",
        "Industrials" => "XLI",
        "Materials" => "XLB",
        "Real Estate" => "XLRE",
        "Utilities" => "XLU",
        "Communication Services" => "XLC",
        _ => BROAD_MARKET_ETF,
    }
}

/// Index weight for a sector, in percent
pub fn sp500_weight(sector: &str) -> Option<f64> {
    SP500_SECTOR_WEIGHTS
        .iter()
        .find(|(name, _)| *name == sector)
        .map(|(_, weight)| *weight)
}

pub fn sp500_weights() -> Vec<(String, f64)> {
    SP500_SECTOR_WEIGHTS
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sectors() {
        let etfs = SectorEtf::standard_sectors();
        assert_eq!(etfs.len(), 12); // 11 sectors + broad market
        for etf in &etfs {
            assert_eq!(benchmark_etf(&etf.sector), etf.symbol);
        }
    }

    #[test]
    fn test_unknown_sector_falls_back_to_spy() {
        assert_eq!(benchmark_etf("Crypto"), "SPY");
        assert_eq!(benchmark_etf(""), "SPY");
        // exact match only
        assert_eq!(benchmark_etf("technology"), "SPY");
    }

    #[test]
    fn test_sp500_weights() {
        assert_eq!(sp500_weight("Technology"), Some(28.1));
        assert_eq!(sp500_weight("Financial Services"), None);
        let total: f64 = SP500_SECTOR_WEIGHTS.iter().map(|(_, w)| w).sum();
        approx::assert_relative_eq!(total, 97.7, epsilon = 1e-9);
    }
}
