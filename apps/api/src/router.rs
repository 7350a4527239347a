use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::services::memory::MemoryAppointmentStore;
use appointment_cell::services::store::SupabaseAppointmentStore;
use appointment_cell::{appointment_routes, AppointmentStore};
use patient_cell::services::memory::MemoryPatientStore;
use patient_cell::services::store::SupabasePatientStore;
use patient_cell::{patient_routes, PatientStore};
use physician_cell::services::memory::MemoryPhysicianStore;
use physician_cell::services::store::SupabasePhysicianStore;
use physician_cell::{physician_routes, PhysicianStore};
use shared_config::{AppConfig, StorageBackend};
use shared_database::ReferenceTracker;

struct Stores {
    physicians: Arc<dyn PhysicianStore>,
    patients: Arc<dyn PatientStore>,
    appointments: Arc<dyn AppointmentStore>,
}

fn build_stores(config: &AppConfig) -> Stores {
    match config.storage_backend {
        StorageBackend::Supabase => Stores {
            physicians: Arc::new(SupabasePhysicianStore::new(config)),
            patients: Arc::new(SupabasePatientStore::new(config)),
            appointments: Arc::new(SupabaseAppointmentStore::new(config)),
        },
        StorageBackend::Memory => {
            // Appointment rows pin the physicians and patients they point at.
            let physician_refs = ReferenceTracker::new("physicians");
            let patient_refs = ReferenceTracker::new("patients");

            Stores {
                physicians: Arc::new(MemoryPhysicianStore::new(physician_refs.clone())),
                patients: Arc::new(MemoryPatientStore::new(patient_refs.clone())),
                appointments: Arc::new(MemoryAppointmentStore::new(physician_refs, patient_refs)),
            }
        }
    }
}

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let stores = build_stores(&config);

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/physicians", physician_routes(config.clone(), stores.physicians.clone()))
        .nest("/patients", patient_routes(config.clone(), stores.patients.clone()))
        .nest(
            "/appointments",
            appointment_routes(config, stores.appointments, stores.physicians, stores.patients),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn app() -> (Router, String) {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);
        (create_router(config.to_arc()), token)
    }

    #[tokio::test]
    async fn root_is_public() {
        let (router, _) = app();
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cells_are_mounted_behind_auth() {
        for uri in ["/physicians", "/patients", "/appointments/summary"] {
            let (router, token) = app();

            let anonymous = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED, "{}", uri);

            let signed_in = router
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .header(header::AUTHORIZATION, JwtTestUtils::bearer(&token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(signed_in.status(), StatusCode::OK, "{}", uri);
        }
    }
}
