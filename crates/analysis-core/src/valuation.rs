use serde::{Deserialize, Serialize};
use crate::AnalystTargets;

/// Growth-adjusted valuation read from the PEG ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PegAssessment {
    Undervalued,
    FairlyValued,
    Overvalued,
}

impl PegAssessment {
    pub fn from_peg(peg: f64) -> Self {
        if peg < 1.0 {
            PegAssessment::Undervalued
        } else if peg <= 2.0 {
            PegAssessment::FairlyValued
        } else {
            PegAssessment::Overvalued
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PegAssessment::Undervalued => "This stock may be undervalued relative to growth.",
            PegAssessment::FairlyValued => "Fairly valued relative to growth.",
            PegAssessment::Overvalued => "This stock may be overvalued relative to growth.",
        }
    }
}

/// Current price position inside the analyst target range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationLabel {
    Undervalued,
    FairlyValued,
    SlightlyOvervalued,
    Overvalued,
    Unclear,
}

impl ValuationLabel {
    /// Missing targets count as 0.0, matching the lenient parsing policy.
    pub fn from_targets(price: f64, targets: &AnalystTargets) -> Self {
        let low = targets.low.unwrap_or(0.0);
        let mean = targets.mean.unwrap_or(0.0);
        let high = targets.high.unwrap_or(0.0);

        if price < low {
            ValuationLabel::Undervalued
        } else if low <= price && price < mean {
            ValuationLabel::FairlyValued
        } else if mean <= price && price <= high {
            ValuationLabel::SlightlyOvervalued
        } else if price > high {
            ValuationLabel::Overvalued
        } else {
            ValuationLabel::Unclear
        }
    }

    /// Lower-case phrase used inside prompts and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationLabel::Undervalued => "undervalued",
            ValuationLabel::FairlyValued => "fairly valued",
            ValuationLabel::SlightlyOvervalued => "slightly overvalued",
            ValuationLabel::Overvalued => "overvalued",
            ValuationLabel::Unclear => "unclear",
        }
    }

    /// Sentence-case label ("Fairly valued")
    pub fn capitalized(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(low: f64, mean: f64, high: f64) -> AnalystTargets {
        AnalystTargets {
            low: Some(low),
            high: Some(high),
            mean: Some(mean),
            median: None,
        }
    }

    #[test]
    fn test_peg_bands() {
        assert_eq!(PegAssessment::from_peg(0.8), PegAssessment::Undervalued);
        assert_eq!(PegAssessment::from_peg(1.0), PegAssessment::FairlyValued);
        assert_eq!(PegAssessment::from_peg(2.0), PegAssessment::FairlyValued);
        assert_eq!(PegAssessment::from_peg(2.01), PegAssessment::Overvalued);
    }

    #[test]
    fn test_valuation_against_targets() {
        let t = targets(100.0, 150.0, 200.0);
        assert_eq!(ValuationLabel::from_targets(90.0, &t), ValuationLabel::Undervalued);
        assert_eq!(ValuationLabel::from_targets(100.0, &t), ValuationLabel::FairlyValued);
        assert_eq!(ValuationLabel::from_targets(150.0, &t), ValuationLabel::SlightlyOvervalued);
        assert_eq!(ValuationLabel::from_targets(200.0, &t), ValuationLabel::SlightlyOvervalued);
        assert_eq!(ValuationLabel::from_targets(250.0, &t), ValuationLabel::Overvalued);
    }

    #[test]
    fn test_odd_targets_and_unclear_price() {
        let t = targets(100.0, 300.0, 200.0);
        assert_eq!(ValuationLabel::from_targets(200.0, &t), ValuationLabel::FairlyValued);
        let t = targets(100.0, 150.0, 120.0);
        assert_eq!(ValuationLabel::from_targets(f64::NAN, &t), ValuationLabel::Unclear);
    }

    #[test]
    fn test_capitalized_label() {
        assert_eq!(ValuationLabel::SlightlyOvervalued.capitalized(), "Slightly overvalued");
    }
}
