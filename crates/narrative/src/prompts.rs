use analysis_core::{format_number, CompanyMetrics, MetricStyle, ValuationLabel};
use portfolio_engine::{AiPortfolioRow, PortfolioRow, RiskLevel};
use serde::{Deserialize, Serialize};

pub const COMPANY_SYSTEM_PROMPT: &str = "You are a helpful and professional financial analyst.";
pub const NEWS_SYSTEM_PROMPT: &str = "You are a professional financial summarizer.";

const MAX_NEWS_IN_SUMMARY: usize = 5;
const HEADLINES_PER_TICKER: usize = 2;

/// Client inputs for a risk-profile portfolio report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub capital: f64,
    pub risk: RiskLevel,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
}

/// Four-section research note ending with an explicit verdict line
pub fn company_summary_prompt(
    metrics: &CompanyMetrics,
    valuation: Option<ValuationLabel>,
    news_summaries: &[String],
) -> String {
    let news_insight = if news_summaries.is_empty() {
        String::new()
    } else {
        let top_news = news_summaries
            .iter()
            .take(MAX_NEWS_IN_SUMMARY)
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\n**News Highlights:**\n{}", top_news)
    };

    let valuation_perspective = match valuation {
        Some(label) => format!(
            "\n**Valuation Status:** The stock appears **{}** compared to analyst expectations or sector benchmarks.",
            label.as_str().to_uppercase()
        ),
        None => String::new(),
    };

    format!(
        r#"
You are a senior equity research analyst at a global investment firm.

Write a professional, structured investment summary based on the data below.

Your response must follow this format exactly:

**1. Executive Summary**
Write a 3 to 4 sentence paragraph summarizing the company's investment outlook. Focus on market position, growth opportunities, and key risks.

**2. Financial Health Overview**
Write a 3 to 4 sentence paragraph explaining the company's financial position. Mention profitability, efficiency, leverage, or valuation.

Then include 2 to 4 bullet points that justify or support your paragraph above. Start with the line:
**Key Financial Insights:**
- [Bullet 1]
- [Bullet 2]
- [Bullet 3]
- [Bullet 4] (optional)

**3. Recent News and Sentiment**
Write a 3 to 4 sentence paragraph analyzing recent news and its potential impact on the company's stock or operations.

Then include 2 to 4 bullet points that support your paragraph. Start with the line:
**News Takeaways:**
- [Bullet 1]
- [Bullet 2]
- [Bullet 3]
- [Bullet 4] (optional)

**4. Recommendation**
Write a 3 to 4 sentence paragraph providing your final recommendation. Mention key strengths, risks, and whether the stock is a Buy, Hold, or Sell.

End the report with this exact line on its own line:
**AI Verdict: [Buy / Hold / Sell]**

**Company:** {company}
**Sector:** {sector}
**Market Capitalization:** {market_cap}
**Trailing P/E Ratio:** {trailing_pe}
**Forward P/E Ratio:** {forward_pe}
**Return on Equity (ROE):** {roe}
**Debt-to-Equity Ratio:** {debt_to_equity}
**Gross Profit Margin:** {gross_margin}
{valuation_perspective}
{news_insight}
"#,
        company = metrics.short_name.as_deref().unwrap_or("Unknown"),
        sector = metrics.sector.as_deref().unwrap_or("Unknown"),
        market_cap = format_number(metrics.market_cap, MetricStyle::Usd),
        trailing_pe = format_number(metrics.trailing_pe, MetricStyle::Ratio),
        forward_pe = format_number(metrics.forward_pe, MetricStyle::Ratio),
        roe = format_number(metrics.return_on_equity, MetricStyle::Percent),
        debt_to_equity = format_number(metrics.debt_to_equity, MetricStyle::Ratio),
        gross_margin = format_number(metrics.gross_margins, MetricStyle::Percent),
        valuation_perspective = valuation_perspective,
        news_insight = news_insight,
    )
}

/// Two-sentence neutral summary of one article
pub fn news_summary_prompt(title: &str, summary: &str) -> String {
    format!(
        r#"
You're an AI analyst. Summarize this company news in 2 concise sentences, keeping it factual and neutral:

Title: {}
Summary: {}

Return only the summary.
"#,
        title, summary
    )
}

/// Strategist note over the portfolio composition table
pub fn portfolio_insight_prompt(rows: &[PortfolioRow]) -> String {
    let headers: Vec<String> = PortfolioRow::COLUMNS
        .iter()
        .map(|c| c.replace('/', "_").replace(' ', "_"))
        .collect();
    let table = csv_table(&headers, rows.iter().map(|r| r.values().to_vec()));

    format!(
        r#"
You are a senior equity strategist at a top global investment firm. Analyze the following client portfolio using your expertise in portfolio theory, sector risk, valuation, and capital efficiency.

Instructions:
- Use the table below to assess diversification, valuation ratios (PE, PB), capital return (ROE), leverage (Debt_Equity), beta (if available), and sector allocations.
- Identify strengths and weaknesses in a professional tone.
- If metrics show extreme values (e.g., PE < 5 or > 40, ROE > 20%, Debt_Equity > 1.5), explain their possible implications.
- If the portfolio is overexposed to one sector or concentrated in low-quality names, highlight that.
- Suggest general improvements (diversification, defensive picks, higher-quality earnings, etc.).
- Use bullet points if helpful, but always include a summary paragraph first.

Client Portfolio:

{}

Provide a clear, professional insight as if writing an internal investment note for senior partners. Avoid unnecessary repetition or fluff.
"#,
        table
    )
}

/// Client-facing report for a risk-profile portfolio.
///
/// `headlines` pairs each ticker with its recent headlines; tickers without
/// headlines are left out of the news section.
pub fn ai_portfolio_prompt(
    profile: &ClientProfile,
    rows: &[AiPortfolioRow],
    headlines: &[(String, Vec<String>)],
) -> String {
    let headers: Vec<String> = AiPortfolioRow::COLUMNS.iter().map(|c| c.to_string()).collect();
    let table = csv_table(&headers, rows.iter().map(|r| r.values().to_vec()));

    let news_lines: Vec<String> = headlines
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(ticker, items)| {
            let joined = items
                .iter()
                .take(HEADLINES_PER_TICKER)
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            format!("- {}: {}", ticker, joined)
        })
        .collect();
    let news_section = if headlines.is_empty() {
        String::new()
    } else {
        format!("\n### Recent News Highlights:\n{}\n", news_lines.join("\n"))
    };

    let preference = |items: &[String]| {
        if items.is_empty() {
            "No specific preference".to_string()
        } else {
            items.join(", ")
        }
    };

    format!(
        r#"
You are a senior portfolio strategist at a top-tier investment advisory firm. Based on the client's capital and preferences, you designed a personalized portfolio using global best practices in asset allocation, risk management, and valuation.

### Client Profile:
- Total Capital: {capital}
- Risk Profile: {risk}
- Sector Preferences: {sectors}
- Country Preferences: {countries}

### Recommended Portfolio:
{table}

{news_section}

### Instructions:
- Begin with a brief executive summary of the overall portfolio strategy.
- Discuss how the allocation aligns with the risk profile (conservative, balanced, aggressive).
- Highlight potential sector and regional exposures (diversified or concentrated).
- Explain any high or low valuation metrics (e.g., PE, ROE, Beta) and their implications.
- Justify choices even if sector/country preferences are loosely followed, with logic.
- Close with a short, professional assessment of potential next steps or monitoring advice.

Use a confident, professional tone as if presenting to the CIO of a private wealth fund.
"#,
        capital = format_number(Some(profile.capital), MetricStyle::Usd),
        risk = profile.risk.as_str().to_uppercase(),
        sectors = preference(&profile.sectors),
        countries = preference(&profile.countries),
        table = table,
        news_section = news_section,
    )
}

/// Render rows as CSV text with a header line. Write failures leave the table empty.
fn csv_table<'a, I>(headers: &[String], rows: I) -> String
where
    I: Iterator<Item = Vec<&'a str>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Err(e) = write_records(&mut writer, headers, rows) {
        tracing::warn!("Could not render portfolio table: {}", e);
        return String::new();
    }

    writer
        .into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

fn write_records<'a, I>(
    writer: &mut csv::Writer<Vec<u8>>,
    headers: &[String],
    rows: I,
) -> Result<(), csv::Error>
where
    I: Iterator<Item = Vec<&'a str>>,
{
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apple() -> CompanyMetrics {
        CompanyMetrics {
            ticker: "AAPL".to_string(),
            short_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(3_000_000_000_000.0),
            trailing_pe: Some(31.234),
            return_on_equity: Some(1.56),
            ..Default::default()
        }
    }

    #[test]
    fn test_company_prompt_embeds_formatted_metrics() {
        let prompt = company_summary_prompt(&apple(), None, &[]);
        assert!(prompt.contains("**Company:** Apple Inc.\n"));
        assert!(prompt.contains("**Market Capitalization:** $3,000,000,000,000.00"));
        assert!(prompt.contains("**Trailing P/E Ratio:** 31.23"));
        assert!(prompt.contains("**Forward P/E Ratio:** N/A"));
        assert!(prompt.contains("**Return on Equity (ROE):** 156.0%"));
        assert!(prompt.contains("**AI Verdict: [Buy / Hold / Sell]**"));
        assert!(!prompt.contains("Valuation Status"));
        assert!(!prompt.contains("News Highlights"));
    }

    #[test]
    fn test_company_prompt_valuation_and_top_five_news() {
        let news: Vec<String> = (1..=7).map(|i| format!("story {}", i)).collect();
        let prompt = company_summary_prompt(&apple(), Some(ValuationLabel::SlightlyOvervalued), &news);
        assert!(prompt.contains("The stock appears **SLIGHTLY OVERVALUED** compared"));
        assert!(prompt.contains("**News Highlights:**\n- story 1\n"));
        assert!(prompt.contains("- story 5"));
        assert!(!prompt.contains("story 6"));
    }

    #[test]
    fn test_unknown_company_fields() {
        let prompt = company_summary_prompt(&CompanyMetrics::default(), None, &[]);
        assert!(prompt.contains("**Company:** Unknown"));
        assert!(prompt.contains("**Sector:** Unknown"));
    }

    #[test]
    fn test_portfolio_prompt_header_names_are_sanitised() {
        let row = PortfolioRow {
            company: "Apple, Inc".to_string(),
            ticker: "AAPL".to_string(),
            country: "United States".to_string(),
            sector: "Technology".to_string(),
            industry: "Consumer Electronics".to_string(),
            pe: "31.2".to_string(),
            pb: "45.1".to_string(),
            roe: "156.0%".to_string(),
            beta: "1.25".to_string(),
            debt_to_equity: "151.9%".to_string(),
            weight: "50.0%".to_string(),
        };
        let prompt = portfolio_insight_prompt(&[row]);
        assert!(prompt.contains("Company,Ticker,Country,Sector,Industry,PE,PB,ROE,Beta,Debt_Equity,Weight\n"));
        assert!(prompt.contains("\"Apple, Inc\",AAPL,United States"));
    }

    #[test]
    fn test_ai_portfolio_prompt_profile_and_news() {
        let profile = ClientProfile {
            capital: 25_000.0,
            risk: RiskLevel::Medium,
            sectors: vec![],
            countries: vec!["USA".to_string(), "Canada".to_string()],
        };
        let headlines = vec![
            ("AAPL".to_string(), vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            ("MSFT".to_string(), vec![]),
        ];
        let prompt = ai_portfolio_prompt(&profile, &[], &headlines);

        assert!(prompt.contains("- Total Capital: $25,000.00"));
        assert!(prompt.contains("- Risk Profile: MEDIUM"));
        assert!(prompt.contains("- Sector Preferences: No specific preference"));
        assert!(prompt.contains("- Country Preferences: USA, Canada"));
        assert!(prompt.contains("Ticker,Company,Sector,Country,Allocation %,Investment (USD),PE,ROE,Beta"));
        assert!(prompt.contains("### Recent News Highlights:\n- AAPL: a; b\n"));
        assert!(!prompt.contains("- MSFT"));
    }

    #[test]
    fn test_news_prompt() {
        let prompt = news_summary_prompt("Apple beats", "Record quarter");
        assert!(prompt.contains("Title: Apple beats\nSummary: Record quarter\n"));
    }
}
