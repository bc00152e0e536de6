//! Sector API Routes
//!
//! Benchmark tables and the allocation-versus-index comparison.

use axum::{routing::{get, post}, Json, Router};
use sector_benchmarks::{compare_sector_allocation, sp500_weights, ExposureReport, SectorEtf, SectorWeight};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SectorAllocation {
    pub sector: String,
    pub weight: SectorWeight,
}

#[derive(Serialize)]
pub struct SectorBenchmarks {
    pub etfs: Vec<SectorEtf>,
    /// Index weight per sector, in percent
    pub sp500_weights: Vec<(String, f64)>,
}

pub fn sector_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sectors/benchmarks", get(get_benchmarks))
        .route("/api/sectors/compare", post(compare_allocation))
}

async fn get_benchmarks() -> Json<ApiResponse<SectorBenchmarks>> {
    Json(ApiResponse::success(SectorBenchmarks {
        etfs: SectorEtf::standard_sectors(),
        sp500_weights: sp500_weights(),
    }))
}

async fn compare_allocation(
    Json(allocation): Json<Vec<SectorAllocation>>,
) -> Result<Json<ApiResponse<ExposureReport>>, AppError> {
    if allocation.is_empty() {
        return Err(AppError::bad_request("Provide at least one sector weight"));
    }

    let report = compare_sector_allocation(allocation.into_iter().map(|a| (a.sector, a.weight)));
    Ok(Json(ApiResponse::success(report)))
}
