//! Report API Routes
//!
//! Word export of the last company analysis and the price chart image.

use analysis_core::{clean_company_name, TimeRange};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use report_export::{build_word_report, render_price_chart, CompanyReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::view::chart_title;
use crate::{AppError, AppState};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    /// PNG snapshot of the chart as rendered by the browser, optionally a data URL
    #[serde(default)]
    pub chart_png_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub range: Option<TimeRange>,
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:id/report", post(download_report))
        .route("/api/sessions/:id/chart.svg", get(price_chart))
}

fn last_report(state: &AppState, id: &Uuid) -> Result<CompanyReport, AppError> {
    let ctx = state
        .sessions
        .checkout(id)
        .ok_or_else(|| AppError::not_found("Session not found"))?;
    ctx.last_report
        .filter(|_| ctx.run_analysis)
        .ok_or_else(|| AppError::not_found("No company analysis to export"))
}

async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let report = last_report(&state, &id)?;

    let chart = match request.chart_png_base64.as_deref() {
        Some(encoded) => Some(decode_image(encoded)?),
        None => None,
    };

    let bytes = build_word_report(&report, chart.as_deref())?;
    tracing::info!("Exported report for {} ({} bytes)", report.ticker, bytes.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Base64 payload, with or without a `data:image/png;base64,` prefix
fn decode_image(encoded: &str) -> Result<Vec<u8>, AppError> {
    let payload = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::bad_request(format!("Invalid chart image: {}", e)))
}

async fn price_chart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, AppError> {
    let report = last_report(&state, &id)?;
    let range = query.range.unwrap_or(report.time_range);

    let points = state
        .gateway
        .price_history(&report.ticker, range)
        .await
        .map_err(|e| AppError::not_found(format!("Chart could not be generated for this ticker. {}", e)))?;

    let name = clean_company_name(report.metrics.short_name.as_deref().unwrap_or(""));
    let svg = render_price_chart(&chart_title(&name, &report.ticker, range), &points)
        .map_err(|e| AppError::not_found(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{handle_event, UiEvent};
    use crate::testing::{test_state, FakeWorld};
    use crate::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::json;
    use tower::ServiceExt;
    use tower_http::cors::CorsLayer;

    async fn analyzed_session(state: &AppState) -> Uuid {
        let id = state.sessions.create();
        let mut ctx = state.sessions.checkout(&id).unwrap();
        handle_event(state, &mut ctx, UiEvent::Analyze { query: "AAPL".to_string() }).await;
        state.sessions.commit(&id, ctx);
        id
    }

    #[test]
    fn test_decode_image_accepts_data_url() {
        let encoded = STANDARD.encode(b"png-bytes");
        assert_eq!(decode_image(&encoded).unwrap(), b"png-bytes".to_vec());
        assert_eq!(
            decode_image(&format!("data:image/png;base64,{}", encoded)).unwrap(),
            b"png-bytes".to_vec()
        );
        assert!(decode_image("not base64 !!").is_err());
    }

    #[tokio::test]
    async fn test_report_download() {
        let state = test_state(FakeWorld::default());
        let id = analyzed_session(&state).await;

        let response = build_router(state.clone(), CorsLayer::permissive())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/api/sessions/{}/report", id))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"AAPL_financial_report.docx\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_report_needs_analysis() {
        let state = test_state(FakeWorld::default());
        let id = state.sessions.create();

        let response = build_router(state, CorsLayer::permissive())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/api/sessions/{}/report", id))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chart_svg() {
        let state = test_state(FakeWorld::default());
        let id = analyzed_session(&state).await;

        let response = build_router(state, CorsLayer::permissive())
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sessions/{}/chart.svg?range=5Y", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.contains("Apple (AAPL) Stock Price - 5Y"));
    }
}
