use analysis_core::{format_number, CompanyMetrics, MetricStyle, NOT_AVAILABLE};
use serde::{Deserialize, Serialize};

/// One holding whose market data was fetched successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub weight: f64,
    pub metrics: CompanyMetrics,
}

impl PortfolioEntry {
    pub fn company(&self) -> &str {
        self.metrics.display_name().unwrap_or(NOT_AVAILABLE)
    }

    pub fn sector(&self) -> &str {
        self.metrics.sector.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Provider debt/equity is a percentage figure; the portfolio view works in ratios.
    pub fn debt_to_equity_ratio(&self) -> Option<f64> {
        self.metrics.debt_to_equity.map(|d| d / 100.0)
    }

    pub fn to_row(&self) -> PortfolioRow {
        let m = &self.metrics;
        PortfolioRow {
            company: self.company().to_string(),
            ticker: self.ticker.clone(),
            country: m.country.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            sector: self.sector().to_string(),
            industry: m.industry.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            pe: format_number(m.trailing_pe, MetricStyle::Ratio),
            pb: format_number(m.price_to_book, MetricStyle::Ratio),
            roe: format_number(m.return_on_equity, MetricStyle::Percent),
            beta: format_number(m.beta, MetricStyle::Ratio),
            debt_to_equity: format_number(self.debt_to_equity_ratio(), MetricStyle::Percent),
            weight: format_number(Some(self.weight), MetricStyle::Percent),
        }
    }
}

/// Display row of the portfolio composition table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "PE")]
    pub pe: String,
    #[serde(rename = "PB")]
    pub pb: String,
    #[serde(rename = "ROE")]
    pub roe: String,
    #[serde(rename = "Beta")]
    pub beta: String,
    #[serde(rename = "Debt/Equity")]
    pub debt_to_equity: String,
    #[serde(rename = "Weight")]
    pub weight: String,
}

impl PortfolioRow {
    pub const COLUMNS: [&'static str; 11] = [
        "Company", "Ticker", "Country", "Sector", "Industry", "PE", "PB", "ROE", "Beta",
        "Debt/Equity", "Weight",
    ];

    pub fn values(&self) -> [&str; 11] {
        [
            &self.company,
            &self.ticker,
            &self.country,
            &self.sector,
            &self.industry,
            &self.pe,
            &self.pb,
            &self.roe,
            &self.beta,
            &self.debt_to_equity,
            &self.weight,
        ]
    }
}

/// Weight-scaled sums over the retained holdings.
///
/// A field is `None` when no retained holding reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedSummary {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub beta: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

impl WeightedSummary {
    pub fn lines(&self) -> Vec<SummaryLine> {
        [
            ("PE (weighted avg)", format_number(self.pe, MetricStyle::Ratio)),
            ("PB (weighted avg)", format_number(self.pb, MetricStyle::Ratio)),
            ("ROE (weighted avg)", format_number(self.roe, MetricStyle::Percent)),
            ("Beta (weighted avg)", format_number(self.beta, MetricStyle::Ratio)),
            ("Debt/Equity (avg)", format_number(self.debt_to_equity, MetricStyle::Percent)),
        ]
        .into_iter()
        .map(|(label, value)| SummaryLine {
            label: label.to_string(),
            value,
        })
        .collect()
    }
}

/// Result of aggregating a portfolio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub entries: Vec<PortfolioEntry>,
    pub summary: WeightedSummary,
    /// Tickers whose fetch failed, in input order
    pub dropped: Vec<String>,
}

impl PortfolioAnalysis {
    pub fn rows(&self) -> Vec<PortfolioRow> {
        self.entries.iter().map(PortfolioEntry::to_row).collect()
    }
}

/// Tickers and optional weights ready for aggregation, plus warnings raised while preparing them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparedPortfolio {
    pub tickers: Vec<String>,
    pub weights: Option<Vec<f64>>,
    pub warnings: Vec<String>,
}

/// Row of a risk-profile portfolio proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPortfolioRow {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Allocation %")]
    pub allocation: String,
    #[serde(rename = "Investment (USD)")]
    pub investment: String,
    #[serde(rename = "PE")]
    pub pe: String,
    #[serde(rename = "ROE")]
    pub roe: String,
    #[serde(rename = "Beta")]
    pub beta: String,
}

impl AiPortfolioRow {
    pub const COLUMNS: [&'static str; 9] = [
        "Ticker", "Company", "Sector", "Country", "Allocation %", "Investment (USD)", "PE", "ROE",
        "Beta",
    ];

    pub fn values(&self) -> [&str; 9] {
        [
            &self.ticker,
            &self.company,
            &self.sector,
            &self.country,
            &self.allocation,
            &self.investment,
            &self.pe,
            &self.roe,
            &self.beta,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiPortfolio {
    pub tickers: Vec<String>,
    pub rows: Vec<AiPortfolioRow>,
    /// Set when nothing could be selected
    pub message: Option<String>,
}
