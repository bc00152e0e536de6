//! Display formatting for raw provider figures.
//!
//! Formatting is lenient: anything missing or non-finite renders as "N/A"
//! instead of failing the page.

use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

const COMPANY_SUFFIXES: &[&str] = &["(The)", "Inc.", "Corp.", "Corporation", "Ltd.", "S.A.", "LLC"];

/// How a raw number should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStyle {
    #[default]
    Usd,
    Percent,
    Ratio,
    Raw,
}

/// Format an optional figure for display.
///
/// `Percent` expects a fraction (0.181 -> "18.1%"), `Ratio` rounds to two
/// decimals, `Usd` adds a dollar sign and thousands separators.
pub fn format_number(value: Option<f64>, style: MetricStyle) -> String {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return NOT_AVAILABLE.to_string(),
    };

    match style {
        MetricStyle::Usd => format!("${}", group_thousands(&format!("{:.2}", round2(value)))),
        MetricStyle::Percent => format!("{}%", shortest(round2(value * 100.0))),
        MetricStyle::Ratio => shortest(round2(value)),
        MetricStyle::Raw => shortest(value),
    }
}

/// Parse "28.1%", " 28.1 " or "28.1" into 28.1
pub fn parse_percent(text: &str) -> Option<f64> {
    text.replace('%', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Drop control characters that break downstream rendering (keeps newlines and tabs)
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .filter(|c| *c != '\u{FFFD}')
        .collect()
}

/// Strip legal suffixes so "Apple Inc." displays as "Apple"
pub fn clean_company_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for suffix in COMPANY_SUFFIXES {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned.trim().to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shortest round-trip decimal form, always with a fractional digit ("50.0", "18.1")
fn shortest(value: f64) -> String {
    let text = format!("{}", value);
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_format() {
        assert_eq!(format_number(Some(0.181), MetricStyle::Percent), "18.1%");
        assert_eq!(format_number(Some(0.5), MetricStyle::Percent), "50.0%");
        assert_eq!(format_number(Some(-0.0512), MetricStyle::Percent), "-5.12%");
    }

    #[test]
    fn test_missing_is_na_for_every_style() {
        for style in [MetricStyle::Usd, MetricStyle::Percent, MetricStyle::Ratio, MetricStyle::Raw] {
            assert_eq!(format_number(None, style), "N/A");
        }
        assert_eq!(format_number(Some(f64::NAN), MetricStyle::Ratio), "N/A");
    }

    #[test]
    fn test_ratio_format() {
        assert_eq!(format_number(Some(25.0), MetricStyle::Ratio), "25.0");
        assert_eq!(format_number(Some(31.4567), MetricStyle::Ratio), "31.46");
        assert_eq!(format_number(Some(1.5), MetricStyle::Raw), "1.5");
    }

    #[test]
    fn test_usd_format() {
        assert_eq!(format_number(Some(1234.5), MetricStyle::Usd), "$1,234.50");
        assert_eq!(format_number(Some(3_000_000_000.0), MetricStyle::Usd), "$3,000,000,000.00");
        assert_eq!(format_number(Some(-987654.321), MetricStyle::Usd), "$-987,654.32");
        assert_eq!(format_number(Some(12.0), MetricStyle::Usd), "$12.00");
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("28.1%"), Some(28.1));
        assert_eq!(parse_percent(" 30 "), Some(30.0));
        assert_eq!(parse_percent("abc%"), None);
    }

    #[test]
    fn test_clean_company_name() {
        assert_eq!(clean_company_name("Apple Inc."), "Apple");
        assert_eq!(clean_company_name("Walt Disney Company (The)"), "Walt Disney Company");
        assert_eq!(clean_company_name("Microsoft Corporation"), "Microsoft");
    }

    #[test]
    fn test_clean_text_keeps_newlines() {
        assert_eq!(clean_text("a\u{0007}b\nc\u{FFFD}"), "ab\nc");
    }
}
