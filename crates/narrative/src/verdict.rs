use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiVerdict {
    Buy,
    Hold,
    Sell,
    Unclear,
}

impl AiVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            AiVerdict::Buy => "Buy",
            AiVerdict::Hold => "Hold",
            AiVerdict::Sell => "Sell",
            AiVerdict::Unclear => "No clear recommendation detected.",
        }
    }
}

impl fmt::Display for AiVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read the verdict from a generated summary.
///
/// Only text mentioning "ai verdict" counts; the first of buy, hold, sell
/// found anywhere in the text wins, checked in that order. This is a plain
/// substring check, so a summary that says "buyback" reads as Buy.
pub fn extract_ai_verdict(summary: &str) -> AiVerdict {
    let lowered = summary.to_lowercase();
    if !lowered.contains("ai verdict") {
        return AiVerdict::Unclear;
    }

    if lowered.contains("buy") {
        AiVerdict::Buy
    } else if lowered.contains("hold") {
        AiVerdict::Hold
    } else if lowered.contains("sell") {
        AiVerdict::Sell
    } else {
        AiVerdict::Unclear
    }
}
