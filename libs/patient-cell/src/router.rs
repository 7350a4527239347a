use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::store::PatientStore;

#[derive(Clone)]
pub struct PatientState {
    pub store: Arc<dyn PatientStore>,
}

pub fn patient_routes(config: Arc<AppConfig>, store: Arc<dyn PatientStore>) -> Router {
    let state = PatientState { store };

    Router::new()
        .route("/", get(handlers::list_patients).post(handlers::create_patient))
        .route(
            "/{patient_id}",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
