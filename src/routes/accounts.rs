use crate::handlers::{accounts, users};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Login, registration, token and password-reset endpoints under `/accounts`.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(accounts::login))
        .route("/register", post(accounts::register))
        .route("/refresh", post(accounts::refresh))
        .route("/password-reset-request", post(accounts::password_reset_request))
        .route("/password-reset", post(accounts::password_reset))
        .route("/verify-token", post(accounts::verify_token))
}

/// Own profile and admin user management. The admin list answers with and
/// without the trailing slash.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/:id", get(users::read))
        .route("/users/:id/activate", post(users::activate))
        .route("/users/:id/deactivate", post(users::deactivate))
        .route("/users/:id/verify-email", post(users::verify_email))
}
