//! Territory API: `/auth`, `/occurrences` and `/territories`.

use crate::handlers::{territories, territory_auth, territory_occurrences};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn territory_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/health", get(territory_auth::health))
        .route("/auth/register", post(territory_auth::register))
        .route("/auth/login", post(territory_auth::login))
        .route("/auth/me", get(territory_auth::me))
        .route("/auth/logout", post(territory_auth::logout))
        .route("/auth/tipos-usuario", get(territory_auth::user_types))
        .route("/auth/update-profile", put(territory_auth::update_profile))
        .route("/auth/change-password", put(territory_auth::change_password))
        .route(
            "/occurrences",
            get(territory_occurrences::list_mine).post(territory_occurrences::create),
        )
        .route(
            "/occurrences/",
            get(territory_occurrences::list_mine).post(territory_occurrences::create),
        )
        .route("/occurrences/all", get(territory_occurrences::list_all))
        .route("/occurrences/stats", get(territory_occurrences::stats))
        .route(
            "/occurrences/:id",
            get(territory_occurrences::read).patch(territory_occurrences::update),
        )
        .route("/territories", get(territories::list).post(territories::create))
        .route("/territories/:id", get(territories::read))
}
