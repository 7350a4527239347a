use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::store::PhysicianStore;

#[derive(Clone)]
pub struct PhysicianState {
    pub store: Arc<dyn PhysicianStore>,
}

pub fn physician_routes(config: Arc<AppConfig>, store: Arc<dyn PhysicianStore>) -> Router {
    let state = PhysicianState { store };

    Router::new()
        .route("/", get(handlers::list_physicians).post(handlers::create_physician))
        .route(
            "/{physician_id}",
            get(handlers::get_physician)
                .put(handlers::update_physician)
                .delete(handlers::delete_physician),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
