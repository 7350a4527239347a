use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use patient_cell::services::store::PatientStore;
use physician_cell::services::store::PhysicianStore;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::BookingStores;
use crate::services::store::AppointmentStore;

#[derive(Clone)]
pub struct AppointmentState {
    pub appointments: Arc<dyn AppointmentStore>,
    pub physicians: Arc<dyn PhysicianStore>,
    pub patients: Arc<dyn PatientStore>,
}

impl AppointmentState {
    pub fn stores(&self) -> BookingStores<'_> {
        BookingStores {
            appointments: self.appointments.as_ref(),
            physicians: self.physicians.as_ref(),
            patients: self.patients.as_ref(),
        }
    }
}

pub fn appointment_routes(
    config: Arc<AppConfig>,
    appointments: Arc<dyn AppointmentStore>,
    physicians: Arc<dyn PhysicianStore>,
    patients: Arc<dyn PatientStore>,
) -> Router {
    let state = AppointmentState {
        appointments,
        physicians,
        patients,
    };

    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        // Static segments are matched before `/{appointment_id}`.
        .route("/availability", get(handlers::check_availability))
        .route("/available-slots", get(handlers::get_available_slots))
        .route("/summary", get(handlers::get_dashboard_summary))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
