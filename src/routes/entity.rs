//! Entity CRUD routes built from the model. Each entity gets its own literal
//! paths; the handlers learn which entity they serve from an `EntityPath` extension.

use crate::handlers::alerts;
use crate::handlers::entity::{create, delete, list, read, update, EntityPath};
use crate::model::Model;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Extension, Router,
};

pub fn entity_routes(model: &Model) -> Router<AppState> {
    let mut router = Router::new();
    for entity in model.routed_entities() {
        let Some(segment) = entity.path_segment else { continue };
        let marker = Extension(EntityPath(segment));
        // Alert creation also notifies the addressee.
        let collection = if entity.table_name == "alerts" {
            get(list).post(alerts::create)
        } else {
            get(list).post(create)
        };
        router = router
            .route(&format!("/{}", segment), collection.layer(marker.clone()))
            .route(
                &format!("/{}/:id", segment),
                get(read).patch(update).put(update).delete(delete).layer(marker),
            );
    }
    router
        .route("/alerts/:id/acknowledge", post(alerts::acknowledge))
        .route("/alerts/:id/resolve", post(alerts::resolve))
        .route("/alerts/:id/dismiss", post(alerts::dismiss))
}
