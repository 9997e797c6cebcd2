//! Health check endpoints with component-level diagnostics.
//!
//! Provides:
//! - `/health`: simple "healthy" + version (for load balancers)
//! - `/health/detailed`: per-component status (database, terminals)

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use nextmonth_core::SessionRegistry;
use nextmonth_store::WorkspaceStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// All component health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
    pub terminals: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: None,
        }
    }

    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }
}

/// Simple health check (for load balancers)
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Detailed health check with all component statuses
async fn detailed_health_check(
    Extension(store): Extension<Arc<WorkspaceStore>>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Json<DetailedHealthResponse> {
    let database = check_database(&store).await;
    let terminals = check_terminals(&registry).await;

    Json(DetailedHealthResponse {
        status: overall_status(&[database.status, terminals.status]),
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database,
            terminals,
        },
    })
}

fn overall_status(components: &[&'static str]) -> &'static str {
    let healthy_count = components.iter().filter(|s| **s == "healthy").count();
    let unhealthy_count = components.iter().filter(|s| **s == "unhealthy").count();

    if unhealthy_count == 0 {
        "healthy"
    } else if healthy_count > 0 {
        "degraded"
    } else {
        "unhealthy"
    }
}

/// Check the SQLite connection
async fn check_database(store: &WorkspaceStore) -> ComponentHealth {
    let start = Instant::now();
    match store.ping().await {
        Ok(()) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

/// Report live terminal sessions
async fn check_terminals(registry: &SessionRegistry) -> ComponentHealth {
    let start = Instant::now();
    let sessions = registry.list().await;
    let attached = sessions.iter().filter(|s| s.attached).count();
    ComponentHealth::healthy_with_details(
        start.elapsed().as_millis() as u64,
        serde_json::json!({
            "sessions": sessions.len(),
            "attached": attached,
        }),
    )
}

/// Create health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}
