use crate::engine::ScrapeEngine;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

pub const HEALTHY: &str = "I am healthy :)";

/// Routes exposing an engine's liveness, latest result and metrics.
pub fn router(engine: Arc<ScrapeEngine>) -> Router {
    Router::new()
        .route("/v1/healthy", get(healthy))
        .route("/v1/scrape-result", get(scrape_result))
        .route("/v1/metrics", get(metrics))
        .with_state(engine)
}

async fn healthy(State(engine): State<Arc<ScrapeEngine>>) -> impl IntoResponse {
    if engine.is_running() {
        (StatusCode::OK, HEALTHY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "scraper is not running")
    }
}

async fn scrape_result(State(engine): State<Arc<ScrapeEngine>>) -> impl IntoResponse {
    let snapshot = engine.get_scrape_data();
    Json(snapshot.as_ref().clone())
}

async fn metrics(State(engine): State<Arc<ScrapeEngine>>) -> impl IntoResponse {
    Json(engine.get_metrics())
}
