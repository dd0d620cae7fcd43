//! Shared-responsibility matrix

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use cmmc_common::state::ResponsibilityEntry;
use std::collections::BTreeMap;

use crate::{ApiResult, AppState};

/// GET /api/responsibility
pub async fn get_matrix(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, ResponsibilityEntry>> {
    Json(state.engine.read().await.state().responsibility_matrix.clone())
}

/// PUT /api/responsibility/:practice_id
pub async fn put_entry(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
    Json(entry): Json<ResponsibilityEntry>,
) -> ApiResult<Json<ResponsibilityEntry>> {
    let mut engine = state.engine.write().await;
    engine.set_responsibility(&practice_id, entry.clone())?;
    state.persist(&engine).await;
    Ok(Json(entry))
}

pub fn responsibility_routes() -> Router<AppState> {
    Router::new()
        .route("/api/responsibility", get(get_matrix))
        .route("/api/responsibility/:practice_id", put(put_entry))
}
