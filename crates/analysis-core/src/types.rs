use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fundamental figures for one company as reported by the market-data provider.
///
/// Every numeric field is optional: `None` means the provider did not report
/// it and is rendered as "N/A". The record is never mutated after the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub ticker: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub beta: Option<f64>,
    /// Provider figure, expressed as a percentage (150.0 means 1.5x).
    pub debt_to_equity: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub current_price: Option<f64>,
    #[serde(default)]
    pub analyst_targets: Option<AnalystTargets>,
}

impl CompanyMetrics {
    /// Long name when present, short name otherwise.
    pub fn display_name(&self) -> Option<&str> {
        self.long_name
            .as_deref()
            .or(self.short_name.as_deref())
    }

    /// A record with a short name is treated as a resolvable company.
    pub fn is_resolvable(&self) -> bool {
        self.short_name
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Analyst price targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystTargets {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl AnalystTargets {
    pub fn is_empty(&self) -> bool {
        self.low.is_none() && self.high.is_none() && self.mean.is_none() && self.median.is_none()
    }
}

/// One closing price in a history series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// News article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub summary: String,
    pub url: String,
}

/// Ticker search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

/// Valuation metrics for the sector benchmark fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Fund ticker, e.g. XLK
    pub benchmark: String,
    pub name: String,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
}

/// Chart time range selectable on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "MAX")]
    Max,
}

impl TimeRange {
    pub const ALL: [TimeRange; 6] = [
        TimeRange::OneMonth,
        TimeRange::SixMonths,
        TimeRange::OneYear,
        TimeRange::FiveYears,
        TimeRange::YearToDate,
        TimeRange::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneMonth => "1M",
            TimeRange::SixMonths => "6M",
            TimeRange::OneYear => "1Y",
            TimeRange::FiveYears => "5Y",
            TimeRange::YearToDate => "YTD",
            TimeRange::Max => "MAX",
        }
    }

    /// Provider (period, interval) pair for the history request
    pub fn period_interval(&self) -> (&'static str, &'static str) {
        match self {
            TimeRange::OneMonth => ("1mo", "1d"),
            TimeRange::SixMonths => ("6mo", "1d"),
            TimeRange::OneYear => ("1y", "1d"),
            TimeRange::FiveYears => ("5y", "1wk"),
            TimeRange::YearToDate => ("ytd", "1d"),
            TimeRange::Max => ("max", "1mo"),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Inclusive date window for news queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Longest news window honoured; larger requests are clamped to it
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

impl DateWindow {
    /// Window ending today and reaching back `days`, clamped to `0..=MAX_LOOKBACK_DAYS`
    pub fn trailing_days(days: i64) -> Self {
        let to = Utc::now().date_naive();
        let days = days.clamp(0, MAX_LOOKBACK_DAYS);
        Self {
            from: to - chrono::Duration::days(days),
            to,
        }
    }
}

/// Single chat-style completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
