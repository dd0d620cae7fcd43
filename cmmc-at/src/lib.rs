//! cmmc-at library - Assessment Tracker
//!
//! JSON HTTP surface over the assessment engine: catalog views, scores, and
//! the mutation callbacks the rendering layer calls. Every mutation writes the
//! full state through the persistence adapter afterwards.

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use cmmc_common::cache::ResponseCache;
use cmmc_common::persistence::{KeyValueStore, PersistenceAdapter};
use cmmc_common::AssessmentEngine;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalogs, merged view, and mutable assessment state
    pub engine: Arc<RwLock<AssessmentEngine>>,
    /// Writes the state envelope after each mutation
    pub persistence: PersistenceAdapter<dyn KeyValueStore>,
    /// Generative-assistant response cache
    pub cache: Arc<dyn ResponseCache>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last persistence failure, surfaced on /health only
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        engine: AssessmentEngine,
        store: Arc<dyn KeyValueStore>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            persistence: PersistenceAdapter::new(store),
            cache,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Write the engine's state. Failures never reach the caller.
    pub async fn persist(&self, engine: &AssessmentEngine) {
        let saved = self.persistence.save(engine.state()).await;
        let mut last_error = self.last_error.write().await;
        if saved {
            *last_error = None;
        } else {
            *last_error = Some("assessment state could not be persisted".to_string());
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::health_routes())
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::catalog_routes())
        .merge(api::record_routes())
        .merge(api::subscription_routes())
        .merge(api::profile_routes())
        .merge(api::report_routes())
        .merge(api::poam_routes())
        .merge(api::responsibility_routes())
        .merge(api::cache_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
