//! Saved report snapshots

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use cmmc_common::state::{ReportKind, SavedReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub kind: ReportKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// GET /api/reports
pub async fn list_reports(State(state): State<AppState>) -> Json<Vec<SavedReport>> {
    Json(state.engine.read().await.state().saved_reports.clone())
}

/// POST /api/reports
pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<CreateReportRequest>,
) -> (StatusCode, Json<SavedReport>) {
    let report = SavedReport {
        id: Uuid::new_v4(),
        kind: payload.kind,
        title: payload.title,
        created_at: Utc::now(),
        payload: payload.payload,
    };

    let mut engine = state.engine.write().await;
    let saved = engine.add_report(report).clone();
    state.persist(&engine).await;
    (StatusCode::CREATED, Json(saved))
}

/// DELETE /api/reports/:id
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut engine = state.engine.write().await;
    engine.delete_report(id)?;
    state.persist(&engine).await;
    Ok(StatusCode::NO_CONTENT)
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports", get(list_reports).post(create_report))
        .route("/api/reports/:id", delete(delete_report))
}
