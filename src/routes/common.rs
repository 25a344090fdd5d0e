//! Common routes: service info, health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
    environment: String,
}

/// Per-database readiness, `"up"` or `"down"`.
#[derive(Serialize)]
struct Readiness {
    ready: bool,
    primary: &'static str,
    territory: &'static str,
}

async fn probe(pool: &sqlx::PgPool, which: &str) -> &'static str {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => "up",
        Err(e) => {
            tracing::warn!(database = which, error = %e, "readiness probe failed");
            "down"
        }
    }
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    let settings = &state.settings;
    Json(serde_json::json!({
        "message": format!("Bem-vindo à {}", settings.app_name),
        "name": settings.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": settings.environment,
        "debug": settings.debug,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.settings.environment.clone(),
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let primary = probe(&state.pool, "primary").await;
    let territory = probe(&state.territory_pool, "territory").await;
    let ready = primary == "up" && territory == "up";
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(Readiness { ready, primary, territory }))
}

async fn version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "app": state.settings.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "api_prefix": crate::config::API_PREFIX,
    }))
}

/// GET /, /health, /ready and /version, outside the API prefix.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
