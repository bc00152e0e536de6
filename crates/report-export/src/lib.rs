//! Price chart rendering and Word export for an assembled company report.
//!
//! Nothing here touches the network: the caller hands in data that was
//! already fetched and gets bytes back.

pub mod chart;
pub mod docx;
pub mod error;
pub mod report;

pub use chart::render_price_chart;
pub use docx::build_word_report;
pub use error::ExportError;
pub use report::CompanyReport;
