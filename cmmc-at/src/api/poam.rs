//! POA&M item CRUD and generation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use cmmc_common::poam::PoamDraft;
use cmmc_common::state::PoamItem;
use uuid::Uuid;

use crate::{ApiResult, AppState};

/// GET /api/poam
pub async fn list_items(State(state): State<AppState>) -> Json<Vec<PoamItem>> {
    Json(state.engine.read().await.state().poam_items.clone())
}

/// POST /api/poam
///
/// `practiceId` is required and must name a known practice.
pub async fn create_item(
    State(state): State<AppState>,
    Json(draft): Json<PoamDraft>,
) -> ApiResult<(StatusCode, Json<PoamItem>)> {
    let mut engine = state.engine.write().await;
    let item = engine.create_poam(draft)?.clone();
    state.persist(&engine).await;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/poam/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<PoamDraft>,
) -> ApiResult<Json<PoamItem>> {
    let mut engine = state.engine.write().await;
    let item = engine.update_poam(id, draft)?.clone();
    state.persist(&engine).await;
    Ok(Json(item))
}

/// DELETE /api/poam/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut engine = state.engine.write().await;
    engine.delete_poam(id)?;
    state.persist(&engine).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/poam/generate
///
/// Returns only the newly created items.
pub async fn generate_items(State(state): State<AppState>) -> Json<Vec<PoamItem>> {
    let mut engine = state.engine.write().await;
    let generated = engine.generate_poam();
    if !generated.is_empty() {
        state.persist(&engine).await;
    }
    Json(generated)
}

pub fn poam_routes() -> Router<AppState> {
    Router::new()
        .route("/api/poam", get(list_items).post(create_item))
        .route("/api/poam/generate", post(generate_items))
        .route("/api/poam/:id", put(update_item).delete(delete_item))
}
