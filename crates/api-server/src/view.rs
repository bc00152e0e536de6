//! Display-ready projections of session state.

use analysis_core::{
    clean_company_name, clean_text, format_number, MetricStyle, NewsItem, PegAssessment,
    TimeRange, ValuationLabel, NOT_AVAILABLE,
};
use market_gateway::DirectoryEntry;
use portfolio_engine::{AiPortfolioRow, PortfolioRow, RiskLevel, SummaryLine};
use report_export::CompanyReport;
use sector_benchmarks::ExposureReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{Notice, SessionContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTile {
    pub label: String,
    pub value: String,
}

impl MetricTile {
    fn new(label: &str, value: String) -> Self {
        Self { label: label.to_string(), value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkView {
    pub heading: String,
    pub lines: Vec<MetricTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetsView {
    pub range: String,
    pub average: String,
    pub current: String,
    pub valuation: Option<Notice>,
}

/// Company analysis page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub ticker: String,
    pub heading: String,
    pub metrics: Vec<MetricTile>,
    pub peg: String,
    pub peg_notice: Option<Notice>,
    pub benchmark: Option<BenchmarkView>,
    pub targets: Option<TargetsView>,
    pub chart_title: String,
    pub time_range: TimeRange,
    pub ai_summary: String,
    pub verdict: String,
    pub news: Vec<NewsItem>,
    pub news_summaries: Vec<String>,
}

impl AnalysisView {
    pub fn from_report(report: &CompanyReport) -> Self {
        let m = &report.metrics;
        let name = clean_company_name(m.short_name.as_deref().unwrap_or(""));

        let mut metrics = vec![
            MetricTile::new("Sector", m.sector.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            MetricTile::new("Market Cap", format_number(m.market_cap, MetricStyle::Usd)),
        ];
        if report.closing_price.is_some() {
            metrics.push(MetricTile::new(
                "Closing Price",
                format_number(report.closing_price, MetricStyle::Usd),
            ));
        }
        metrics.extend([
            MetricTile::new("Trailing PE", format_number(m.trailing_pe, MetricStyle::Ratio)),
            MetricTile::new("Forward PE", format_number(m.forward_pe, MetricStyle::Ratio)),
            MetricTile::new("ROE", format_number(m.return_on_equity, MetricStyle::Percent)),
            MetricTile::new("Debt/Equity", format_number(m.debt_to_equity, MetricStyle::Ratio)),
            MetricTile::new("Gross Margin", format_number(m.gross_margins, MetricStyle::Percent)),
            MetricTile::new("Revenue", format_number(m.revenue, MetricStyle::Usd)),
            MetricTile::new("Net Income", format_number(m.net_income, MetricStyle::Usd)),
            MetricTile::new("EBITDA", format_number(m.ebitda, MetricStyle::Usd)),
            MetricTile::new("Operating Margin", format_number(m.operating_margins, MetricStyle::Percent)),
            MetricTile::new("Return on Assets", format_number(m.return_on_assets, MetricStyle::Percent)),
        ]);

        let (peg, peg_notice) = match (report.peg, report.peg_assessment) {
            (Some(peg), Some(assessment)) => (format!("PEG Ratio: {}", peg), Some(peg_notice(assessment))),
            _ => ("PEG ratio not available.".to_string(), None),
        };

        let benchmark = report.benchmark.as_ref().map(|b| BenchmarkView {
            heading: format!("ETF Benchmark: {} ({})", b.name, b.benchmark),
            lines: vec![
                MetricTile::new("PE Ratio", format_number(b.pe, MetricStyle::Ratio)),
                MetricTile::new("PB Ratio", format_number(b.pb, MetricStyle::Ratio)),
                MetricTile::new("ROE", format_number(b.roe, MetricStyle::Percent)),
            ],
        });

        let targets = match (&report.targets, report.closing_price) {
            (Some(t), Some(price)) => Some(TargetsView {
                range: format!(
                    "Target Range: ${:.2} - ${:.2}",
                    t.low.unwrap_or(0.0),
                    t.high.unwrap_or(0.0)
                ),
                average: format!("Average Target Price: ${:.2}", t.mean.unwrap_or(0.0)),
                current: format!("Current Price: {}", format_number(Some(price), MetricStyle::Usd)),
                valuation: report.valuation.map(valuation_notice),
            }),
            _ => None,
        };

        Self {
            ticker: report.ticker.clone(),
            heading: format!("Company: {} ({})", name, report.ticker),
            metrics,
            peg,
            peg_notice,
            benchmark,
            targets,
            chart_title: chart_title(&name, &report.ticker, report.time_range),
            time_range: report.time_range,
            ai_summary: clean_text(&report.ai_summary),
            verdict: report.verdict.clone(),
            news: report.news.clone(),
            news_summaries: report.news_summaries.clone(),
        }
    }
}

pub fn chart_title(name: &str, ticker: &str, range: TimeRange) -> String {
    format!("{} ({}) Stock Price - {}", name, ticker, range.label())
}

fn peg_notice(assessment: PegAssessment) -> Notice {
    let message = assessment.message();
    match assessment {
        PegAssessment::Undervalued => Notice::success(message),
        PegAssessment::FairlyValued => Notice::info(message),
        PegAssessment::Overvalued => Notice::warning(message),
    }
}

fn valuation_notice(label: ValuationLabel) -> Notice {
    let message = format!("Valuation: {}", title_case(label.as_str()));
    match label {
        ValuationLabel::Undervalued => Notice::success(message),
        ValuationLabel::FairlyValued | ValuationLabel::Unclear => Notice::info(message),
        ValuationLabel::SlightlyOvervalued => Notice::warning(message),
        ValuationLabel::Overvalued => Notice::error(message),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Custom portfolio results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub rows: Vec<PortfolioRow>,
    pub summary: Vec<SummaryLine>,
    pub dropped: Vec<String>,
    pub insight: String,
    /// Sector weight in percent, sorted by sector name
    pub sector_weights: Vec<MetricTile>,
    pub exposure: ExposureReport,
}

/// Risk-profile proposal and the generated client report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPortfolioView {
    pub capital: f64,
    pub risk: RiskLevel,
    pub rows: Vec<AiPortfolioRow>,
    pub report: String,
}

/// Everything the page needs to render one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub selected_ticker: Option<String>,
    pub run_analysis: bool,
    pub watchlist: Vec<String>,
    pub watchlist_notice: Option<Notice>,
    pub in_watchlist: bool,
    pub time_range: TimeRange,
    pub time_ranges: Vec<&'static str>,
    pub suggestions: Vec<DirectoryEntry>,
    pub analysis: Option<AnalysisView>,
    pub portfolio: Option<PortfolioView>,
    pub ai_portfolio: Option<AiPortfolioView>,
}

impl SessionView {
    pub fn new(id: Uuid, ctx: &SessionContext) -> Self {
        let in_watchlist = ctx
            .selected_ticker
            .as_ref()
            .map(|t| ctx.watchlist.contains(t))
            .unwrap_or(false);

        Self {
            id,
            selected_ticker: ctx.selected_ticker.clone(),
            run_analysis: ctx.run_analysis,
            watchlist: ctx.watchlist.clone(),
            watchlist_notice: ctx.watchlist_feedback.as_ref().map(|f| f.notice()),
            in_watchlist,
            time_range: ctx.time_range,
            time_ranges: TimeRange::ALL.iter().map(|r| r.label()).collect(),
            suggestions: ctx.suggestions.clone(),
            analysis: ctx
                .last_report
                .as_ref()
                .filter(|_| ctx.run_analysis)
                .map(AnalysisView::from_report),
            portfolio: ctx.last_portfolio.clone(),
            ai_portfolio: ctx.last_ai_portfolio.clone(),
        }
    }
}
