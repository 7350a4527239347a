use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use physician_cell::physician_routes;
use physician_cell::services::memory::MemoryPhysicianStore;
use shared_database::ReferenceTracker;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    token: String,
    references: ReferenceTracker,
}

impl TestApp {
    fn new() -> Self {
        let config = TestConfig::default();
        let references = ReferenceTracker::new("physicians");
        let store = Arc::new(MemoryPhysicianStore::new(references.clone()));
        let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);

        Self {
            router: physician_routes(config.to_arc(), store),
            token,
            references,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, JwtTestUtils::bearer(&self.token));

        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

fn physician_body(name: &str, license: &str, email: &str) -> Value {
    json!({
        "name": name,
        "specialty": "Cardiologia",
        "license_number": license,
        "email": email,
        "phone": "(11) 98888-7777",
        "attendance_days": ["seg", "qua"],
        "start_time": "08:00",
        "end_time": "12:00"
    })
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_fetch_physician() {
    let app = TestApp::new();

    let (status, created) = app
        .send(Method::POST, "/", Some(physician_body("Dra. Ana Souza", "CRM-1", "ana@clinic.com")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["attendance_days"], json!(["seg", "qua"]));
    assert_eq!(created["start_time"], "08:00");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.send(Method::GET, &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn list_is_ordered_by_name_and_searchable() {
    let app = TestApp::new();
    app.send(Method::POST, "/", Some(physician_body("Dr. Bruno Reis", "CRM-2", "bruno@clinic.com"))).await;
    app.send(Method::POST, "/", Some(physician_body("Dra. Ana Souza", "CRM-1", "ana@clinic.com"))).await;

    let (status, body) = app.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["physicians"][0]["name"], "Dr. Bruno Reis");
    assert_eq!(body["physicians"][1]["name"], "Dra. Ana Souza");

    let (_, body) = app.send(Method::GET, "/?search=crm-1", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["physicians"][0]["email"], "ana@clinic.com");
}

#[tokio::test]
async fn missing_fields_are_a_validation_error() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::POST, "/", Some(json!({"name": "Ana"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));
}

#[tokio::test]
async fn duplicate_license_is_a_conflict() {
    let app = TestApp::new();
    app.send(Method::POST, "/", Some(physician_body("Ana", "CRM-1", "ana@clinic.com"))).await;

    let (status, body) = app
        .send(Method::POST, "/", Some(physician_body("Outra Ana", "CRM-1", "outra@clinic.com")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A physician with this license number already exists");
}

#[tokio::test]
async fn emails_differing_only_in_case_collide() {
    let app = TestApp::new();

    let (status, created) = app
        .send(Method::POST, "/", Some(physician_body("Ana", "CRM-1", "Ana@Clinic.com")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "ana@clinic.com");

    let (status, body) = app
        .send(Method::POST, "/", Some(physician_body("Outra Ana", "CRM-2", "ana@clinic.com")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A physician with this email already exists");

    let (_, other) = app
        .send(Method::POST, "/", Some(physician_body("Bruno", "CRM-3", "bruno@clinic.com")))
        .await;
    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/{}", other["id"].as_str().unwrap()),
            Some(json!({"email": "Bruno.Reis@Clinic.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "bruno.reis@clinic.com");
}

#[tokio::test]
async fn update_can_clear_working_hours() {
    let app = TestApp::new();
    let (_, created) = app
        .send(Method::POST, "/", Some(physician_body("Ana", "CRM-1", "ana@clinic.com")))
        .await;
    let uri = format!("/{}", created["id"].as_str().unwrap());

    let (status, updated) = app
        .send(Method::PUT, &uri, Some(json!({"start_time": null, "end_time": null, "phone": "123"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["start_time"], Value::Null);
    assert_eq!(updated["end_time"], Value::Null);
    assert_eq!(updated["phone"], "123");
    assert_eq!(updated["name"], "Ana");

    let (status, _) = app.send(Method::PUT, &uri, Some(json!({"start_time": "10:00"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = TestApp::new();

    let (status, _) = app.send(Method::GET, &format!("/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &format!("/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::GET, "/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn referenced_physician_cannot_be_deleted() {
    let app = TestApp::new();
    let (_, created) = app
        .send(Method::POST, "/", Some(physician_body("Ana", "CRM-1", "ana@clinic.com")))
        .await;
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/{}", id);

    app.references.acquire(id).unwrap();
    let (status, body) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Physician has appointments and cannot be deleted");

    app.references.release(id);
    let (status, body) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Physician deleted successfully");
}
