//! Company profile and analyzer questionnaire answers

use axum::{extract::State, routing::get, Json, Router};
use cmmc_common::state::CompanyProfile;
use std::collections::BTreeMap;

use crate::AppState;

type Answers = BTreeMap<String, serde_json::Value>;

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> Json<CompanyProfile> {
    Json(state.engine.read().await.state().company_profile.clone())
}

/// PUT /api/profile
///
/// Replaces the whole profile; omitted fields become empty.
pub async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<CompanyProfile>,
) -> Json<CompanyProfile> {
    let mut engine = state.engine.write().await;
    engine.set_company_profile(profile);
    state.persist(&engine).await;
    Json(engine.state().company_profile.clone())
}

/// GET /api/analyzer
pub async fn get_answers(State(state): State<AppState>) -> Json<Answers> {
    Json(state.engine.read().await.state().analyzer_answers.clone())
}

/// PUT /api/analyzer
///
/// Merges into the stored answers. A `null` answer removes the question.
pub async fn put_answers(
    State(state): State<AppState>,
    Json(answers): Json<Answers>,
) -> Json<Answers> {
    let mut engine = state.engine.write().await;
    engine.merge_analyzer_answers(answers);
    state.persist(&engine).await;
    Json(engine.state().analyzer_answers.clone())
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/analyzer", get(get_answers).put(put_answers))
}
