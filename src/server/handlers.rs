//! axum request handlers. Each search endpoint just deserializes the
//! request, delegates to the [`crate::Router`], and serializes whatever
//! [`crate::models::SearchResponse`] comes back; the router itself
//! guarantees a well-formed response even when providers fail.

use super::AppState;
use crate::models::{HybridSearchRequest, SearchRequest, SearchResponse, VectorSearchRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    Json(state.router.search(&request).await)
}

pub async fn vector_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VectorSearchRequest>,
) -> Json<SearchResponse> {
    Json(state.router.vector_search(&request).await)
}

pub async fn hybrid_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HybridSearchRequest>,
) -> Json<SearchResponse> {
    Json(state.router.hybrid_search(&request).await)
}

/// Liveness probe: the process is up and serving requests.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: reports whether registered dependencies (providers,
/// cache) are operational, per the registered health checks.
pub async fn readyz(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let summary = state.health.get_health_summary().await;
    let all_healthy = summary.values().all(crate::resilience::HealthStatus::is_healthy);

    let body = json!({
        "ready": all_healthy,
        "components": summary.keys().collect::<Vec<_>>(),
    });

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}

/// Provider/circuit-breaker counters as JSON. No Prometheus exporter is
/// pulled in for this; the data is the same per-provider health snapshot
/// the provider manager already tracks.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<Value> {
    let providers = state.router.provider_manager();
    let snapshot = providers.health_snapshot().await;

    let by_provider: serde_json::Map<String, Value> = snapshot
        .into_iter()
        .map(|(name, health)| {
            (
                name,
                json!({
                    "status": format!("{:?}", health.status),
                    "latency_ms": health.latency_ms,
                    "success_rate": health.success_rate,
                }),
            )
        })
        .collect();

    Json(json!({ "providers": by_provider }))
}
