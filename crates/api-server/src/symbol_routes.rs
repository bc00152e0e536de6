//! Symbol Search API Routes
//!
//! Company-name suggestions from the bundled directory and free-text ticker resolution.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use market_gateway::DirectoryEntry;
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

const SUGGESTION_LIMIT: usize = 5;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct ResolvedSymbol {
    pub query: String,
    pub ticker: String,
}

pub fn symbol_routes() -> Router<AppState> {
    Router::new()
        .route("/api/symbols/suggest", get(suggest_symbols))
        .route("/api/symbols/resolve", get(resolve_symbol))
}

async fn suggest_symbols(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<DirectoryEntry>>> {
    let matches = state
        .directory
        .match_ticker(&query.q)
        .into_iter()
        .take(SUGGESTION_LIMIT)
        .collect();
    Json(ApiResponse::success(matches))
}

async fn resolve_symbol(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<ResolvedSymbol>>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::bad_request("Query cannot be empty"));
    }

    let ticker = state
        .gateway
        .resolve_to_ticker(q)
        .await
        .ok_or_else(|| AppError::not_found(format!("No ticker found for '{}'", q)))?;

    Ok(Json(ApiResponse::success(ResolvedSymbol {
        query: q.to_string(),
        ticker,
    })))
}
