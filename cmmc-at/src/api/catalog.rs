//! Read-only catalog views: domains, practices, scores, diagnostics
//!
//! Everything except diagnostics is filtered by the subscription level.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use cmmc_common::engine::Diagnostics;
use cmmc_common::merge::Domain;
use cmmc_common::records::PracticeRecord;
use cmmc_common::scoring::{sprs_points, ScoreSummary};
use cmmc_common::state::SubscriptionLevel;
use cmmc_common::Practice;
use serde::Serialize;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainsResponse {
    pub subscription_level: SubscriptionLevel,
    pub domains: Vec<Domain>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticesResponse {
    pub subscription_level: SubscriptionLevel,
    pub practices: Vec<Practice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeDetail {
    pub practice: Practice,
    pub record: Option<PracticeRecord>,
    pub high_risk: bool,
    pub sprs_points: u32,
    /// False when the practice exists but is outside the subscription level
    pub in_scope: bool,
}

/// GET /api/domains
pub async fn list_domains(State(state): State<AppState>) -> Json<DomainsResponse> {
    let engine = state.engine.read().await;
    Json(DomainsResponse {
        subscription_level: engine.subscription_level(),
        domains: engine.domains(),
    })
}

/// GET /api/practices
pub async fn list_practices(State(state): State<AppState>) -> Json<PracticesResponse> {
    let engine = state.engine.read().await;
    Json(PracticesResponse {
        subscription_level: engine.subscription_level(),
        practices: engine.all_practices(),
    })
}

/// GET /api/practices/:id
///
/// Out-of-scope practices are still returned, flagged with `inScope: false`.
pub async fn get_practice(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
) -> ApiResult<Json<PracticeDetail>> {
    let engine = state.engine.read().await;
    let practice = engine
        .practice(&practice_id)
        .ok_or_else(|| ApiError::NotFound(format!("practice {}", practice_id)))?;

    Ok(Json(PracticeDetail {
        practice: practice.clone(),
        record: engine.record(&practice_id).cloned(),
        high_risk: engine.merged().is_high_risk(&practice_id),
        sprs_points: sprs_points(practice, engine.merged()),
        in_scope: engine.subscription_level().includes(practice),
    }))
}

/// GET /api/scores
pub async fn get_scores(State(state): State<AppState>) -> Json<ScoreSummary> {
    Json(state.engine.read().await.scores())
}

/// GET /api/diagnostics
pub async fn get_diagnostics(State(state): State<AppState>) -> Json<Diagnostics> {
    Json(state.engine.read().await.diagnostics())
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/domains", get(list_domains))
        .route("/api/practices", get(list_practices))
        .route("/api/practices/:id", get(get_practice))
        .route("/api/scores", get(get_scores))
        .route("/api/diagnostics", get(get_diagnostics))
}
