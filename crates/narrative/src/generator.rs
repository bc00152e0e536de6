use crate::prompts::{
    ai_portfolio_prompt, company_summary_prompt, news_summary_prompt, portfolio_insight_prompt,
    ClientProfile, COMPANY_SYSTEM_PROMPT, NEWS_SYSTEM_PROMPT,
};
use analysis_core::{
    CompanyMetrics, CompletionRequest, DateWindow, LanguageModel, NewsItem, NewsProvider,
    ValuationLabel,
};
use portfolio_engine::{AiPortfolioRow, PortfolioRow};
use std::sync::Arc;

/// Articles summarized individually on the company page
pub const NEWS_SUMMARY_COUNT: usize = 5;

const SUMMARY_TEMPERATURE: f64 = 0.3;
const CLIENT_REPORT_TEMPERATURE: f64 = 0.2;
const NEWS_SUMMARY_MAX_TOKENS: u32 = 100;

/// Sends the fixed prompts to the language model.
///
/// Every method returns display text: when the model call fails the text is
/// an error line instead, so a broken provider never fails the page.
#[derive(Clone)]
pub struct NarrativeGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl NarrativeGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub async fn company_summary(
        &self,
        metrics: &CompanyMetrics,
        valuation: Option<ValuationLabel>,
        news_summaries: &[String],
    ) -> String {
        let request = CompletionRequest::new(
            company_summary_prompt(metrics, valuation, news_summaries),
            SUMMARY_TEMPERATURE,
        )
        .with_system(COMPANY_SYSTEM_PROMPT);

        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Company summary failed for {}: {}", metrics.ticker, e);
                format!("Error generating summary: {}", e)
            }
        }
    }

    pub async fn summarize_article(&self, item: &NewsItem) -> String {
        let request = CompletionRequest::new(
            news_summary_prompt(&item.headline, &item.summary),
            SUMMARY_TEMPERATURE,
        )
        .with_system(NEWS_SYSTEM_PROMPT)
        .with_max_tokens(NEWS_SUMMARY_MAX_TOKENS);

        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => format!("News summary error: {}", e),
        }
    }

    /// Summaries for the first few articles, one call each, in order
    pub async fn summarize_articles(&self, items: &[NewsItem]) -> Vec<String> {
        let mut summaries = Vec::new();
        for item in items.iter().take(NEWS_SUMMARY_COUNT) {
            summaries.push(self.summarize_article(item).await);
        }
        summaries
    }

    pub async fn portfolio_insight(&self, rows: &[PortfolioRow]) -> String {
        let request = CompletionRequest::new(portfolio_insight_prompt(rows), SUMMARY_TEMPERATURE);

        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Portfolio insight failed: {}", e);
                format!("Error generating portfolio insight: {}", e)
            }
        }
    }

    pub async fn ai_portfolio_summary(
        &self,
        profile: &ClientProfile,
        rows: &[AiPortfolioRow],
        headlines: &[(String, Vec<String>)],
    ) -> String {
        let request = CompletionRequest::new(
            ai_portfolio_prompt(profile, rows, headlines),
            CLIENT_REPORT_TEMPERATURE,
        );

        match self.llm.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Portfolio report failed: {}", e);
                format!("Error generating portfolio report: {}", e)
            }
        }
    }
}

/// Recent headlines per ticker, in ticker order.
///
/// Tickers whose news lookup fails or comes back empty are left out.
pub async fn collect_headlines(
    news: &dyn NewsProvider,
    tickers: &[String],
    window: DateWindow,
    per_ticker: usize,
) -> Vec<(String, Vec<String>)> {
    let mut headlines = Vec::new();
    for ticker in tickers {
        match news.company_news(ticker, window, per_ticker).await {
            Ok(items) if !items.is_empty() => {
                let titles = items.into_iter().map(|i| i.headline).collect();
                headlines.push((ticker.clone(), titles));
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("No headlines for {}: {}", ticker, e),
        }
    }
    headlines
}
