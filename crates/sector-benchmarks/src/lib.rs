//! Static sector reference data and portfolio-vs-index exposure checks.

pub mod etf;
pub mod exposure;

pub use etf::{benchmark_etf, sp500_weight, sp500_weights, SectorEtf, BROAD_MARKET_ETF, SP500_SECTOR_WEIGHTS};
pub use exposure::{compare_sector_allocation, ExposureKind, ExposureNotice, ExposureReport, SectorWeight, EXPOSURE_THRESHOLD};
