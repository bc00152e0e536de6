use analysis_core::{
    AnalystTargets, BenchmarkMetrics, CompanyMetrics, NewsItem, PegAssessment, TimeRange,
    ValuationLabel,
};
use serde::{Deserialize, Serialize};

/// Everything the analysis page shows for one company.
///
/// Assembled once per analysis run and kept as the session's last report;
/// the Word export reads from it without fetching anything again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub ticker: String,
    pub metrics: CompanyMetrics,
    pub closing_price: Option<f64>,
    pub peg: Option<f64>,
    pub peg_assessment: Option<PegAssessment>,
    pub benchmark: Option<BenchmarkMetrics>,
    pub targets: Option<AnalystTargets>,
    pub valuation: Option<ValuationLabel>,
    pub news: Vec<NewsItem>,
    pub news_summaries: Vec<String>,
    pub ai_summary: String,
    pub verdict: String,
    pub time_range: TimeRange,
}

impl CompanyReport {
    /// Report title, e.g. "Apple (AAPL) Financial Report"
    pub fn title(&self) -> String {
        format!(
            "{} ({}) Financial Report",
            self.metrics.short_name.as_deref().unwrap_or(""),
            self.ticker
        )
    }

    /// Download name for the exported document
    pub fn file_name(&self) -> String {
        format!("{}_financial_report.docx", self.ticker)
    }
}
