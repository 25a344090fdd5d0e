//! Router assembly.

mod accounts;
mod common;
mod entity;
mod territory;

pub use accounts::{account_routes, user_routes};
pub use common::common_routes;
pub use entity::entity_routes;
pub use territory::territory_routes;

use crate::config::API_PREFIX;
use crate::state::AppState;
use axum::{http::HeaderValue, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

/// The full application: common routes at the root, both APIs under the API prefix.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/accounts", account_routes())
        .merge(user_routes())
        .merge(entity_routes(&state.model))
        .merge(territory_routes());
    let settings = state.settings.clone();
    Router::new()
        .merge(common_routes())
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_origins_are_skipped() {
        // Building the layer must not panic on bad input.
        let _ = cors_layer(&["http://ok.test".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
