use analysis_core::{
    AnalysisError, AnalystTargets, CompanyMetrics, MarketDataProvider, PricePoint, TickerMatch,
    TickerSearch, TimeRange,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
/// Hands out the session cookie the crumb is bound to
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

const SUMMARY_MODULES: &str =
    "price,summaryProfile,summaryDetail,defaultKeyStatistics,financialData";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) equity-lens/0.1";

/// Cookie plus the crumb Yahoo issued for it; quoteSummary needs both
#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    value: String,
}

#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    cookie_url: String,
    client: Client,
    crumb: Arc<RwLock<Option<Crumb>>>,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            client,
            crumb: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_cookie_url(mut self, cookie_url: impl Into<String>) -> Self {
        self.cookie_url = cookie_url.into();
        self
    }

    async fn ensure_crumb(&self) -> Result<Crumb, AnalysisError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }
        self.fetch_crumb().await
    }

    async fn fetch_crumb(&self) -> Result<Crumb, AnalysisError> {
        // The cookie endpoint answers 404 but still sets the cookie
        let response = self.send_request(self.client.get(&self.cookie_url)).await?;
        let cookie = cookie_pairs(response.headers())
            .ok_or_else(|| AnalysisError::ApiError("Yahoo did not set a session cookie".to_string()))?;

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let response = self
            .send_request(self.client.get(&url).header(header::COOKIE, &cookie))
            .await?;
        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Yahoo crumb request failed: HTTP {}",
                response.status()
            )));
        }
        let value = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?
            .trim()
            .to_string();
        if value.is_empty() {
            return Err(AnalysisError::ApiError("Yahoo returned an empty crumb".to_string()));
        }

        tracing::debug!("Fetched a new Yahoo crumb");
        let crumb = Crumb { cookie, value };
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn clear_crumb(&self) {
        *self.crumb.write().await = None;
    }

    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if response.status().as_u16() == 429 {
            tracing::warn!("Yahoo rate limited the request");
            return Err(AnalysisError::ApiError("Rate limited by Yahoo".to_string()));
        }

        Ok(response)
    }

    /// Fundamentals and analyst targets for one ticker.
    ///
    /// A rejected crumb is dropped and fetched again once before giving up.
    pub async fn get_company_metrics(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);

        let mut retried = false;
        let response = loop {
            let crumb = self.ensure_crumb().await?;
            let response = self.send_request(
                self.client
                    .get(&url)
                    .header(header::COOKIE, &crumb.cookie)
                    .query(&summary_query(&crumb.value))
            ).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                break response;
            }
            self.clear_crumb().await;
            if retried {
                return Err(AnalysisError::ApiError("Yahoo rejected the crumb".to_string()));
            }
            tracing::warn!("Yahoo crumb rejected for {}, refreshing", ticker);
            retried = true;
        };

        if response.status().as_u16() == 404 {
            return Err(AnalysisError::NotFound(ticker.to_string()));
        }

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let result = body
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| AnalysisError::NotFound(ticker.to_string()))?;

        Ok(result.into_metrics(ticker))
    }

    /// Closing prices over the given range, oldest first. Null closes are skipped.
    pub async fn get_price_history(&self, ticker: &str, range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let (period, interval) = range.period_interval();

        let response = self.send_request(
            self.client.get(&url).query(&[("range", period), ("interval", interval)])
        ).await?;

        if response.status().as_u16() == 404 {
            return Err(AnalysisError::NotFound(ticker.to_string()));
        }

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(body.into_points())
    }

    /// Free-text symbol search
    pub async fn search_symbols(&self, query: &str, limit: usize) -> Result<Vec<TickerMatch>, AnalysisError> {
        let url = format!("{}/v1/finance/search", self.base_url);

        let response = self.send_request(
            self.client.get(&url).query(&[
                ("q", query),
                ("quotesCount", &limit.to_string()),
                ("newsCount", "0"),
            ])
        ).await?;

        if !response.status().is_success() {
            tracing::warn!("Yahoo search HTTP {} for '{}': ignoring", response.status(), query);
            return Ok(Vec::new());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(body
            .quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol?;
                Some(TickerMatch {
                    symbol,
                    name: q.longname.or(q.shortname),
                    exchange: q.exchange,
                    quote_type: q.quote_type,
                })
            })
            .take(limit)
            .collect())
    }
}

fn summary_query(crumb: &str) -> [(&'static str, &str); 2] {
    [("modules", SUMMARY_MODULES), ("crumb", crumb)]
}

/// `name=value` pairs of every Set-Cookie header, attributes stripped
fn cookie_pairs(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .filter_map(|s| s.split(';').next())
        .map(str::trim)
        .filter(|s| s.contains('='))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn company_metrics(&self, ticker: &str) -> Result<CompanyMetrics, AnalysisError> {
        self.get_company_metrics(ticker).await
    }

    async fn price_history(&self, ticker: &str, range: TimeRange) -> Result<Vec<PricePoint>, AnalysisError> {
        self.get_price_history(ticker, range).await
    }
}

#[async_trait]
impl TickerSearch for YahooClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TickerMatch>, AnalysisError> {
        self.search_symbols(query, limit).await
    }
}

// Response types

/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`; empty objects mean missing.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_profile: Option<ProfileModule>,
    #[serde(default)]
    summary_detail: Option<DetailModule>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatsModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    short_name: Option<String>,
    long_name: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
    #[serde(default)]
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(default, rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    #[serde(default)]
    beta: Option<RawValue>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatsModule {
    #[serde(default)]
    price_to_book: Option<RawValue>,
    #[serde(default)]
    peg_ratio: Option<RawValue>,
    #[serde(default, rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    #[serde(default)]
    beta: Option<RawValue>,
    #[serde(default)]
    net_income_to_common: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    #[serde(default)]
    current_price: Option<RawValue>,
    #[serde(default)]
    return_on_equity: Option<RawValue>,
    #[serde(default)]
    return_on_assets: Option<RawValue>,
    #[serde(default)]
    debt_to_equity: Option<RawValue>,
    #[serde(default)]
    gross_margins: Option<RawValue>,
    #[serde(default)]
    operating_margins: Option<RawValue>,
    #[serde(default)]
    total_revenue: Option<RawValue>,
    #[serde(default)]
    ebitda: Option<RawValue>,
    #[serde(default)]
    target_low_price: Option<RawValue>,
    #[serde(default)]
    target_high_price: Option<RawValue>,
    #[serde(default)]
    target_mean_price: Option<RawValue>,
    #[serde(default)]
    target_median_price: Option<RawValue>,
    #[serde(default)]
    number_of_analyst_opinions: Option<RawValue>,
}

impl QuoteSummaryResult {
    fn into_metrics(self, ticker: &str) -> CompanyMetrics {
        let price = self.price.unwrap_or_default();
        let profile = self.summary_profile.unwrap_or_default();
        let detail = self.summary_detail.unwrap_or_default();
        let stats = self.default_key_statistics.unwrap_or_default();
        let fin = self.financial_data.unwrap_or_default();

        let covered = raw(&fin.number_of_analyst_opinions).map(|n| n > 0.0).unwrap_or(false);
        let targets = AnalystTargets {
            low: raw(&fin.target_low_price),
            high: raw(&fin.target_high_price),
            mean: raw(&fin.target_mean_price),
            median: raw(&fin.target_median_price),
        };

        CompanyMetrics {
            ticker: ticker.to_string(),
            short_name: price.short_name,
            long_name: price.long_name,
            sector: profile.sector,
            industry: profile.industry,
            country: profile.country,
            market_cap: raw(&price.market_cap).or(raw(&detail.market_cap)),
            trailing_pe: raw(&detail.trailing_pe),
            forward_pe: raw(&detail.forward_pe).or(raw(&stats.forward_pe)),
            price_to_book: raw(&stats.price_to_book),
            return_on_equity: raw(&fin.return_on_equity),
            beta: raw(&detail.beta).or(raw(&stats.beta)),
            debt_to_equity: raw(&fin.debt_to_equity),
            gross_margins: raw(&fin.gross_margins),
            operating_margins: raw(&fin.operating_margins),
            revenue: raw(&fin.total_revenue),
            net_income: raw(&stats.net_income_to_common),
            ebitda: raw(&fin.ebitda),
            return_on_assets: raw(&fin.return_on_assets),
            peg_ratio: raw(&stats.peg_ratio),
            current_price: raw(&fin.current_price).or(raw(&price.regular_market_price)),
            analyst_targets: if covered && !targets.is_empty() { Some(targets) } else { None },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_points(self) -> Vec<PricePoint> {
        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Vec::new();
        };
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        result
            .timestamp
            .into_iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = close.filter(|c| c.is_finite())?;
                let timestamp: DateTime<Utc> = DateTime::from_timestamp(ts, 0)?;
                Some(PricePoint { timestamp, close })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    symbol: Option<String>,
    #[serde(rename = "shortname")]
    shortname: Option<String>,
    #[serde(rename = "longname")]
    longname: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}
