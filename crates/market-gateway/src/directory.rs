//! Bundled company-name directory used for search suggestions.

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};
use std::io::Read;

const BUNDLED_TICKERS: &str = include_str!("../data/tickers.csv");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(alias = "Security")]
    pub security: String,
    #[serde(alias = "Symbol")]
    pub symbol: String,
}

/// Security name to symbol table, kept in file order
#[derive(Debug, Clone, Default)]
pub struct TickerDirectory {
    entries: Vec<DirectoryEntry>,
}

impl TickerDirectory {
    pub fn bundled() -> Result<Self, AnalysisError> {
        Self::from_reader(BUNDLED_TICKERS.as_bytes())
    }

    /// Load a `Security,Symbol` CSV
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AnalysisError> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();

        for result in reader.deserialize() {
            let entry: DirectoryEntry =
                result.map_err(|e| AnalysisError::InvalidData(e.to_string()))?;
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match on the security name.
    /// A blank query matches nothing.
    pub fn match_ticker(&self, query: &str) -> Vec<DirectoryEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|e| e.security.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}
