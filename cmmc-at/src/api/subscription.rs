//! Subscription upgrade and assessment reset

use axum::{extract::State, routing::post, Json, Router};
use cmmc_common::state::SubscriptionLevel;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription_level: SubscriptionLevel,
    /// False when the level was already L2
    pub changed: bool,
}

/// POST /api/subscription/upgrade
///
/// L1 → L2 only. Upgrading an L2 subscription is a no-op.
pub async fn upgrade(State(state): State<AppState>) -> Json<SubscriptionResponse> {
    let mut engine = state.engine.write().await;
    let changed = engine.upgrade();
    if changed {
        state.persist(&engine).await;
    }
    Json(SubscriptionResponse {
        subscription_level: engine.subscription_level(),
        changed,
    })
}

/// POST /api/reset
///
/// Clears every record, mined practice, report, and POA&M item. The
/// subscription level is kept.
pub async fn reset(State(state): State<AppState>) -> Json<SubscriptionResponse> {
    let mut engine = state.engine.write().await;
    engine.reset();
    state.persist(&engine).await;
    Json(SubscriptionResponse {
        subscription_level: engine.subscription_level(),
        changed: false,
    })
}

pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/api/subscription/upgrade", post(upgrade))
        .route("/api/reset", post(reset))
}
