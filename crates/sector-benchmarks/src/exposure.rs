use crate::etf::sp500_weight;
use serde::{Deserialize, Serialize};

/// Percentage points a sector may deviate from the index before it is flagged
pub const EXPOSURE_THRESHOLD: f64 = 5.0;

const BALANCED_MESSAGE: &str = "Your sector allocation closely matches the S&P 500 benchmark.";

/// Portfolio weight for one sector, in percent. Accepts `28.1` or `"28.1%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectorWeight {
    Number(f64),
    Text(String),
}

impl SectorWeight {
    /// Unparsable text counts as 0.0
    pub fn percent(&self) -> f64 {
        match self {
            SectorWeight::Number(v) => *v,
            SectorWeight::Text(s) => s.replace('%', "").trim().parse::<f64>().unwrap_or(0.0),
        }
    }
}

impl From<f64> for SectorWeight {
    fn from(value: f64) -> Self {
        SectorWeight::Number(value)
    }
}

impl From<&str> for SectorWeight {
    fn from(value: &str) -> Self {
        SectorWeight::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureKind {
    Overexposed,
    Underexposed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureNotice {
    pub sector: String,
    pub portfolio: f64,
    pub benchmark: f64,
    pub diff: f64,
    pub kind: ExposureKind,
}

impl ExposureNotice {
    pub fn message(&self) -> String {
        match self.kind {
            ExposureKind::Overexposed => {
                format!("Overexposed to {} (+{:.1}% vs S&P 500)", self.sector, self.diff)
            }
            ExposureKind::Underexposed => {
                format!("Underexposed to {} ({:.1}% vs S&P 500)", self.sector, self.diff)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureReport {
    pub notices: Vec<ExposureNotice>,
    pub summary: String,
}

/// Compare portfolio sector weights against the index, in the order given.
///
/// Sectors missing from the index table are compared against 0.0. Only the
/// portfolio's own sectors are checked; index sectors the portfolio lacks are
/// not reported.
pub fn compare_sector_allocation<I, S, W>(weights: I) -> ExposureReport
where
    I: IntoIterator<Item = (S, W)>,
    S: AsRef<str>,
    W: Into<SectorWeight>,
{
    let notices: Vec<ExposureNotice> = weights
        .into_iter()
        .filter_map(|(sector, weight)| {
            let sector = sector.as_ref();
            let portfolio = weight.into().percent();
            let benchmark = sp500_weight(sector).unwrap_or(0.0);
            let diff = portfolio - benchmark;

            let kind = if diff > EXPOSURE_THRESHOLD {
                ExposureKind::Overexposed
            } else if diff < -EXPOSURE_THRESHOLD {
                ExposureKind::Underexposed
            } else {
                return None;
            };

            Some(ExposureNotice {
                sector: sector.to_string(),
                portfolio,
                benchmark,
                diff,
                kind,
            })
        })
        .collect();

    let summary = if notices.is_empty() {
        BALANCED_MESSAGE.to_string()
    } else {
        notices
            .iter()
            .map(ExposureNotice::message)
            .collect::<Vec<_>>()
            .join(" | ")
    };

    tracing::debug!("Sector exposure check produced {} notices", notices.len());

    ExposureReport { notices, summary }
}
