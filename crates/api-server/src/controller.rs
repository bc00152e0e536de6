//! Page events and the handlers behind them.
//!
//! Every event works on a checked-out `SessionContext` and reports back
//! through notices; nothing in here fails the request.

use analysis_core::{AnalysisError, DateWindow, PegAssessment, TimeRange, ValuationLabel};
use narrative::{collect_headlines, extract_ai_verdict, ClientProfile};
use portfolio_engine::{aggregate, build_ai_portfolio, prepare_portfolio, sector_weights, split_entries, RiskLevel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use report_export::CompanyReport;
use sector_benchmarks::compare_sector_allocation;
use serde::{Deserialize, Serialize};

use crate::session::{Notice, SessionContext};
use crate::view::{AiPortfolioView, MetricTile, PortfolioView, SessionView};
use crate::AppState;

/// Articles requested for the company page
const COMPANY_NEWS_LIMIT: usize = 10;
const SUGGESTION_LIMIT: usize = 5;
const HEADLINES_PER_HOLDING: usize = 1;
const MIN_CAPITAL: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Search {
        query: String,
    },
    Analyze {
        query: String,
    },
    SelectSuggestion {
        symbol: String,
    },
    CloseAnalysis,
    SetTimeRange {
        range: TimeRange,
    },
    AddToWatchlist {
        #[serde(default)]
        ticker: Option<String>,
    },
    RemoveFromWatchlist {
        ticker: String,
    },
    BuildPortfolio {
        tickers: String,
        #[serde(default)]
        weights: String,
    },
    BuildAiPortfolio {
        capital: f64,
        risk: RiskLevel,
        #[serde(default)]
        num_stocks: Option<usize>,
        #[serde(default)]
        sectors: String,
        #[serde(default)]
        countries: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EventOutcome {
    pub notices: Vec<Notice>,
    pub session: SessionView,
}

/// Apply one event to the session and return the notices it produced
pub async fn handle_event(state: &AppState, ctx: &mut SessionContext, event: UiEvent) -> Vec<Notice> {
    let mut notices = Vec::new();

    match event {
        UiEvent::Search { query } => {
            ctx.suggestions = state
                .directory
                .match_ticker(&query)
                .into_iter()
                .take(SUGGESTION_LIMIT)
                .collect();
        }
        UiEvent::Analyze { query } => {
            if let Some(ticker) = resolve_query(state, &query, &mut notices).await {
                ctx.select(ticker);
                run_analysis(state, ctx, &mut notices).await;
            }
        }
        UiEvent::SelectSuggestion { symbol } => {
            ctx.select(symbol.trim().to_uppercase());
            run_analysis(state, ctx, &mut notices).await;
        }
        UiEvent::CloseAnalysis => ctx.close_analysis(),
        UiEvent::SetTimeRange { range } => {
            ctx.time_range = range;
            if let Some(report) = ctx.last_report.as_mut() {
                report.time_range = range;
            }
        }
        UiEvent::AddToWatchlist { ticker } => {
            match ticker.or_else(|| ctx.selected_ticker.clone()) {
                Some(ticker) => notices.push(ctx.add_to_watchlist(&ticker).notice()),
                None => notices.push(Notice::warning("Select a company before adding it to the watchlist.")),
            }
        }
        UiEvent::RemoveFromWatchlist { ticker } => {
            if let Some(feedback) = ctx.remove_from_watchlist(&ticker) {
                notices.push(feedback.notice());
            }
        }
        UiEvent::BuildPortfolio { tickers, weights } => {
            build_portfolio(state, ctx, &tickers, &weights, &mut notices).await;
        }
        UiEvent::BuildAiPortfolio {
            capital,
            risk,
            num_stocks,
            sectors,
            countries,
        } => {
            let profile = ClientProfile {
                capital,
                risk,
                sectors: split_entries(&sectors),
                countries: split_entries(&countries),
            };
            build_risk_portfolio(state, ctx, profile, num_stocks, &mut notices).await;
        }
    }

    notices
}

/// Ticker for free-text input: the input itself when the provider knows it,
/// else the first directory match.
async fn resolve_query(state: &AppState, query: &str, notices: &mut Vec<Notice>) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let candidate = query.to_uppercase();
    let lookup = state.gateway.fetch(&candidate).await;
    if matches!(&lookup, Ok(m) if m.is_resolvable()) {
        return Some(candidate);
    }

    if let Some(entry) = state.directory.match_ticker(query).into_iter().next() {
        return Some(entry.symbol);
    }

    match lookup {
        Err(e) if !matches!(e, AnalysisError::NotFound(_)) => {
            notices.push(Notice::warning(format!("Could not fetch data for that ticker. Error: {}", e)));
        }
        _ => notices.push(Notice::warning("Could not find a valid ticker or match for that name.")),
    }
    None
}

async fn run_analysis(state: &AppState, ctx: &mut SessionContext, notices: &mut Vec<Notice>) {
    let Some(ticker) = ctx.selected_ticker.clone() else {
        return;
    };

    ctx.last_report = analyze_company(state, &ticker, ctx.time_range, notices).await;
    if ctx.last_report.is_none() {
        notices.push(Notice::error("No data found."));
    }
}

/// The company analysis chain, one external call after another.
///
/// Returns `None` only when the company's own metrics are unavailable; every
/// later step degrades to "not available" instead.
pub async fn analyze_company(
    state: &AppState,
    ticker: &str,
    time_range: TimeRange,
    notices: &mut Vec<Notice>,
) -> Option<CompanyReport> {
    let metrics = state.gateway.fetch(ticker).await.ok()?;
    tracing::info!("Analyzing {}", ticker);

    let closing_price = state.gateway.closing_price(ticker).await;
    let peg = state.gateway.peg_ratio(ticker).await;

    let sector = metrics.sector.as_deref().unwrap_or("Unknown");
    let benchmark = state.gateway.benchmark_metrics(sector).await.ok();

    let targets = metrics.analyst_targets.clone();
    let valuation = match (&targets, closing_price) {
        (Some(t), Some(price)) => Some(ValuationLabel::from_targets(price, t)),
        _ => None,
    };

    match state.gateway.price_history(ticker, time_range).await {
        Ok(points) if !points.is_empty() => {}
        _ => notices.push(Notice::warning("Chart could not be generated for this ticker.")),
    }

    let window = DateWindow::trailing_days(state.news_lookback_days);
    let news = match state.news.company_news(ticker, window, COMPANY_NEWS_LIMIT).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("News unavailable for {}: {}", ticker, e);
            Vec::new()
        }
    };

    let news_summaries = state.narrative.summarize_articles(&news).await;
    let ai_summary = state
        .narrative
        .company_summary(&metrics, valuation, &news_summaries)
        .await;
    let verdict = extract_ai_verdict(&ai_summary);

    Some(CompanyReport {
        ticker: ticker.to_string(),
        closing_price,
        peg,
        peg_assessment: peg.map(PegAssessment::from_peg),
        benchmark,
        targets,
        valuation,
        news,
        news_summaries,
        ai_summary,
        verdict: verdict.label().to_string(),
        time_range,
        metrics,
    })
}

async fn build_portfolio(
    state: &AppState,
    ctx: &mut SessionContext,
    tickers: &str,
    weights: &str,
    notices: &mut Vec<Notice>,
) {
    let prepared = match prepare_portfolio(&state.gateway, tickers, weights).await {
        Ok(p) => p,
        Err(e) => {
            notices.push(Notice::error(e.to_string()));
            return;
        }
    };
    notices.extend(prepared.warnings.into_iter().map(Notice::warning));

    let analysis = match aggregate(&state.gateway, &prepared.tickers, prepared.weights.as_deref()).await {
        Ok(a) => a,
        Err(e) => {
            notices.push(Notice::error(e.to_string()));
            return;
        }
    };

    if !analysis.dropped.is_empty() {
        notices.push(Notice::warning(format!(
            "No market data for: {}",
            analysis.dropped.join(", ")
        )));
    }

    let rows = analysis.rows();
    let insight = state.narrative.portfolio_insight(&rows).await;

    let weights = sector_weights(&analysis.entries);
    let exposure = compare_sector_allocation(weights.iter().map(|(sector, w)| (sector.as_str(), *w)));

    ctx.last_portfolio = Some(PortfolioView {
        rows,
        summary: analysis.summary.lines(),
        dropped: analysis.dropped,
        insight,
        sector_weights: weights
            .iter()
            .map(|(sector, w)| MetricTile {
                label: sector.clone(),
                value: format!("{:.1}%", w),
            })
            .collect(),
        exposure,
    });
}

async fn build_risk_portfolio(
    state: &AppState,
    ctx: &mut SessionContext,
    profile: ClientProfile,
    num_stocks: Option<usize>,
    notices: &mut Vec<Notice>,
) {
    if profile.capital.is_nan() || profile.capital < MIN_CAPITAL {
        notices.push(Notice::error("Investment capital must be at least $100."));
        return;
    }

    let mut rng = StdRng::from_entropy();
    let portfolio = build_ai_portfolio(&state.gateway, profile.capital, profile.risk, num_stocks, &mut rng).await;

    let report = match &portfolio.message {
        Some(message) => {
            notices.push(Notice::warning(message.clone()));
            message.clone()
        }
        None => {
            let window = DateWindow::trailing_days(state.news_lookback_days);
            let headlines =
                collect_headlines(state.news.as_ref(), &portfolio.tickers, window, HEADLINES_PER_HOLDING).await;
            state
                .narrative
                .ai_portfolio_summary(&profile, &portfolio.rows, &headlines)
                .await
        }
    };

    ctx.last_ai_portfolio = Some(AiPortfolioView {
        capital: profile.capital,
        risk: profile.risk,
        rows: portfolio.rows,
        report,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NoticeLevel;
    use crate::testing::{test_state, FakeWorld};

    #[test]
    fn test_event_wire_format() {
        let event: UiEvent = serde_json::from_str(r#"{"type":"set_time_range","range":"5Y"}"#).unwrap();
        assert_eq!(event, UiEvent::SetTimeRange { range: TimeRange::FiveYears });

        let event: UiEvent = serde_json::from_str(r#"{"type":"build_portfolio","tickers":"AAPL,MSFT"}"#).unwrap();
        assert_eq!(
            event,
            UiEvent::BuildPortfolio {
                tickers: "AAPL,MSFT".to_string(),
                weights: String::new()
            }
        );

        let event: UiEvent =
            serde_json::from_str(r#"{"type":"build_ai_portfolio","capital":1000,"risk":"High"}"#).unwrap();
        assert!(matches!(event, UiEvent::BuildAiPortfolio { risk: RiskLevel::High, num_stocks: None, .. }));
    }

    #[tokio::test]
    async fn test_analyze_ticker_builds_report() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(&state, &mut ctx, UiEvent::Analyze { query: "aapl".to_string() }).await;

        assert!(notices.is_empty(), "unexpected notices: {:?}", notices);
        assert!(ctx.run_analysis);
        assert_eq!(ctx.selected_ticker.as_deref(), Some("AAPL"));

        let report = ctx.last_report.as_ref().unwrap();
        assert_eq!(report.closing_price, Some(190.0));
        assert_eq!(report.peg, Some(1.5));
        assert_eq!(report.peg_assessment, Some(PegAssessment::FairlyValued));
        assert_eq!(report.benchmark.as_ref().unwrap().benchmark, "XLK");
        assert_eq!(report.valuation, Some(ValuationLabel::FairlyValued));
        assert_eq!(report.news.len(), 2);
        assert_eq!(report.news_summaries.len(), 2);
        assert_eq!(report.verdict, "Buy");
    }

    #[tokio::test]
    async fn test_analyze_company_name_uses_directory() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        handle_event(&state, &mut ctx, UiEvent::Analyze { query: "microsoft".to_string() }).await;
        assert_eq!(ctx.selected_ticker.as_deref(), Some("MSFT"));
    }

    #[tokio::test]
    async fn test_analyze_unknown_name_warns() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(&state, &mut ctx, UiEvent::Analyze { query: "zzzz qqq".to_string() }).await;
        assert_eq!(notices, vec![Notice::warning("Could not find a valid ticker or match for that name.")]);
        assert!(!ctx.run_analysis);
    }

    #[tokio::test]
    async fn test_search_keeps_five_suggestions() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        handle_event(&state, &mut ctx, UiEvent::Search { query: "inc".to_string() }).await;
        assert!(!ctx.suggestions.is_empty());
        assert!(ctx.suggestions.len() <= 5);

        handle_event(&state, &mut ctx, UiEvent::Search { query: "   ".to_string() }).await;
        assert!(ctx.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_watchlist_events() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(&state, &mut ctx, UiEvent::AddToWatchlist { ticker: None }).await;
        assert_eq!(notices[0].level, NoticeLevel::Warning);

        ctx.select("AAPL".to_string());
        let notices = handle_event(&state, &mut ctx, UiEvent::AddToWatchlist { ticker: None }).await;
        assert_eq!(notices, vec![Notice::success("AAPL added to your watchlist.")]);

        let notices = handle_event(&state, &mut ctx, UiEvent::AddToWatchlist { ticker: None }).await;
        assert_eq!(notices, vec![Notice::info("This ticker is already in your watchlist.")]);

        let notices = handle_event(&state, &mut ctx, UiEvent::RemoveFromWatchlist { ticker: "AAPL".to_string() }).await;
        assert_eq!(notices, vec![Notice::success("AAPL removed.")]);
        assert!(ctx.watchlist.is_empty());
    }

    #[tokio::test]
    async fn test_time_range_updates_report() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();
        handle_event(&state, &mut ctx, UiEvent::SelectSuggestion { symbol: "AAPL".to_string() }).await;

        handle_event(&state, &mut ctx, UiEvent::SetTimeRange { range: TimeRange::OneMonth }).await;
        assert_eq!(ctx.time_range, TimeRange::OneMonth);
        assert_eq!(ctx.last_report.as_ref().unwrap().time_range, TimeRange::OneMonth);

        handle_event(&state, &mut ctx, UiEvent::CloseAnalysis).await;
        assert!(ctx.last_report.is_none());
        assert_eq!(ctx.time_range, TimeRange::OneMonth);
    }

    #[tokio::test]
    async fn test_build_portfolio_event() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildPortfolio {
                tickers: "AAPL, MSFT, nosuchthing".to_string(),
                weights: String::new(),
            },
        )
        .await;

        assert_eq!(
            notices,
            vec![Notice::warning("The following entries could not be resolved: nosuchthing")]
        );
        let portfolio = ctx.last_portfolio.as_ref().unwrap();
        assert_eq!(portfolio.rows.len(), 2);
        assert_eq!(portfolio.insight, "Buy the dip. **AI Verdict: Buy**");
        assert_eq!(portfolio.sector_weights[0].label, "Technology");
        assert_eq!(portfolio.sector_weights[0].value, "100.0%");
        assert!(portfolio.exposure.summary.contains("Technology"));
    }

    #[tokio::test]
    async fn test_build_portfolio_needs_two_tickers() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildPortfolio {
                tickers: "AAPL".to_string(),
                weights: String::new(),
            },
        )
        .await;

        assert_eq!(notices, vec![Notice::error("Please enter at least two tickers.")]);
        assert!(ctx.last_portfolio.is_none());
    }

    #[tokio::test]
    async fn test_build_portfolio_rejects_bad_weight_sum() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildPortfolio {
                tickers: "AAPL, MSFT".to_string(),
                weights: "90, 90".to_string(),
            },
        )
        .await;

        assert_eq!(notices, vec![Notice::error("Weights must add up to 100 percent.")]);
        assert!(ctx.last_portfolio.is_none());
    }

    #[tokio::test]
    async fn test_ai_portfolio_capital_floor() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildAiPortfolio {
                capital: 50.0,
                risk: RiskLevel::Low,
                num_stocks: None,
                sectors: String::new(),
                countries: String::new(),
            },
        )
        .await;
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(ctx.last_ai_portfolio.is_none());
    }

    #[tokio::test]
    async fn test_ai_portfolio_without_candidates() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        // the fake universe has no high-beta names
        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildAiPortfolio {
                capital: 10_000.0,
                risk: RiskLevel::High,
                num_stocks: Some(3),
                sectors: "Tech".to_string(),
                countries: String::new(),
            },
        )
        .await;

        assert_eq!(notices, vec![Notice::warning("No tickers available for this risk level.")]);
        let view = ctx.last_ai_portfolio.as_ref().unwrap();
        assert!(view.rows.is_empty());
        assert_eq!(view.report, "No tickers available for this risk level.");
    }

    #[tokio::test]
    async fn test_ai_portfolio_report_generated() {
        let state = test_state(FakeWorld::default());
        let mut ctx = SessionContext::default();

        let notices = handle_event(
            &state,
            &mut ctx,
            UiEvent::BuildAiPortfolio {
                capital: 10_000.0,
                risk: RiskLevel::Medium,
                num_stocks: None,
                sectors: String::new(),
                countries: String::new(),
            },
        )
        .await;

        assert!(notices.is_empty());
        let view = ctx.last_ai_portfolio.as_ref().unwrap();
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.report, "Buy the dip. **AI Verdict: Buy**");
    }
}
