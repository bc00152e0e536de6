pub mod aggregator;
pub mod builder;
pub mod error;
pub mod models;
pub mod validation;

pub use aggregator::{aggregate, sector_weights};
pub use builder::{build_ai_portfolio, select_by_risk, RiskLevel, DEFAULT_UNIVERSE};
pub use error::PortfolioError;
pub use models::*;
pub use validation::{parse_weight_percents, prepare_portfolio, split_entries, validate_portfolio_inputs};

#[cfg(test)]
pub(crate) mod testing;
