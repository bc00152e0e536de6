pub mod error;
pub mod format;
pub mod traits;
pub mod types;
pub mod valuation;

pub use error::*;
pub use format::{clean_company_name, clean_text, format_number, parse_percent, MetricStyle, NOT_AVAILABLE};
pub use traits::*;
pub use types::*;
pub use valuation::{PegAssessment, ValuationLabel};
