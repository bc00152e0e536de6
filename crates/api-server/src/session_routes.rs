//! Session API Routes
//!
//! A page load creates a session; every user interaction is posted as an
//! event and answered with the re-rendered session view.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controller::{handle_event, EventOutcome, UiEvent};
use crate::view::SessionView;
use crate::{ApiResponse, AppError, AppState};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        .route("/api/sessions/:id/events", post(post_event))
}

async fn create_session(State(state): State<AppState>) -> Json<ApiResponse<SessionView>> {
    let id = state.sessions.create();
    let ctx = state.sessions.checkout(&id).unwrap_or_default();
    Json(ApiResponse::success(SessionView::new(id, &ctx)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionView>>, AppError> {
    let ctx = state
        .sessions
        .checkout(&id)
        .ok_or_else(|| AppError::not_found("Session not found"))?;
    Ok(Json(ApiResponse::success(SessionView::new(id, &ctx))))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    if !state.sessions.remove(&id) {
        return Err(AppError::not_found("Session not found"));
    }
    Ok(Json(ApiResponse::success(true)))
}

async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<UiEvent>,
) -> Result<Json<ApiResponse<EventOutcome>>, AppError> {
    let mut ctx = state
        .sessions
        .checkout(&id)
        .ok_or_else(|| AppError::not_found("Session not found"))?;

    let notices = handle_event(&state, &mut ctx, event).await;
    let session = SessionView::new(id, &ctx);

    if !state.sessions.commit(&id, ctx) {
        return Err(AppError::not_found("Session not found"));
    }

    Ok(Json(ApiResponse::success(EventOutcome { notices, session })))
}
