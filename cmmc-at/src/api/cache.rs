//! Generative-assistant response cache
//!
//! The assistant itself runs elsewhere. These endpoints only store and look
//! up its responses by a content hash of the prompt.

use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use cmmc_common::cache::content_key;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    #[serde(default)]
    pub namespace: Option<String>,
    pub prompt: String,
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub namespace: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CacheEntry {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

fn key_for(namespace: Option<&str>, prompt: &str) -> String {
    content_key(namespace.unwrap_or(DEFAULT_NAMESPACE), prompt)
}

/// PUT /api/ai-cache
pub async fn store(
    State(state): State<AppState>,
    Json(payload): Json<StoreRequest>,
) -> Json<CacheEntry> {
    let key = key_for(payload.namespace.as_deref(), &payload.prompt);
    state.cache.put(&key, payload.response).await;
    let entries = state.cache.len().await;
    debug!(key = %key, entries = entries, "Cached assistant response");
    Json(CacheEntry {
        key,
        response: None,
    })
}

/// POST /api/ai-cache/lookup
pub async fn lookup(
    State(state): State<AppState>,
    Json(payload): Json<LookupRequest>,
) -> ApiResult<Json<CacheEntry>> {
    let key = key_for(payload.namespace.as_deref(), &payload.prompt);
    let response = state
        .cache
        .get(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("cache entry {}", key)))?;
    Ok(Json(CacheEntry {
        key,
        response: Some(response),
    }))
}

pub fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai-cache", put(store))
        .route("/api/ai-cache/lookup", post(lookup))
}
