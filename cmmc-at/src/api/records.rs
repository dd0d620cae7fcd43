//! Practice record mutations and the mined-practice commit

use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use cmmc_common::catalog::raw::MinedPractice;
use cmmc_common::engine::ObjectiveUpdate;
use cmmc_common::records::{PracticeRecord, StatusSource};
use cmmc_common::PracticeStatus;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: PracticeStatus,
    /// Defaults to `manual`
    #[serde(default)]
    pub source: Option<StatusSource>,
}

#[derive(Debug, Deserialize)]
pub struct SetNoteRequest {
    pub note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMinedResponse {
    pub committed: usize,
    pub total_mined: usize,
}

/// PUT /api/practices/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> ApiResult<Json<PracticeRecord>> {
    let mut engine = state.engine.write().await;
    let record = engine
        .set_practice_status(
            &practice_id,
            payload.status,
            payload.source.unwrap_or(StatusSource::Manual),
        )?
        .clone();
    state.persist(&engine).await;
    Ok(Json(record))
}

/// PUT /api/practices/:id/note
pub async fn set_note(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
    Json(payload): Json<SetNoteRequest>,
) -> ApiResult<Json<PracticeRecord>> {
    let mut engine = state.engine.write().await;
    let record = engine.set_practice_note(&practice_id, payload.note)?.clone();
    state.persist(&engine).await;
    Ok(Json(record))
}

/// PUT /api/practices/:id/objectives/:objective_id
///
/// A status in the body re-derives the practice status.
pub async fn update_objective(
    State(state): State<AppState>,
    Path((practice_id, objective_id)): Path<(String, String)>,
    Json(payload): Json<ObjectiveUpdate>,
) -> ApiResult<Json<PracticeRecord>> {
    let mut engine = state.engine.write().await;
    let record = engine
        .update_objective(&practice_id, &objective_id, payload)?
        .clone();
    state.persist(&engine).await;
    Ok(Json(record))
}

/// POST /api/mined
///
/// Body is an array of mined practice objects. The whole batch is rejected
/// if any entry does not parse.
pub async fn commit_mined(
    State(state): State<AppState>,
    Json(payload): Json<Vec<serde_json::Value>>,
) -> ApiResult<Json<CommitMinedResponse>> {
    let practices = payload
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<MinedPractice>(value)
                .map(MinedPractice::into_practice)
                .map_err(|e| ApiError::BadRequest(format!("mined practice {}: {}", index, e)))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let mut engine = state.engine.write().await;
    let committed = engine.commit_mined(practices)?;
    state.persist(&engine).await;

    info!(committed, "Mined practices accepted");

    Ok(Json(CommitMinedResponse {
        committed,
        total_mined: engine.state().mined_practices.len(),
    }))
}

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/api/practices/:id/status", put(set_status))
        .route("/api/practices/:id/note", put(set_note))
        .route(
            "/api/practices/:id/objectives/:objective_id",
            put(update_objective),
        )
        .route("/api/mined", post(commit_mined))
}
