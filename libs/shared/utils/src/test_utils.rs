use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_backend: StorageBackend,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            storage_backend: StorageBackend::Memory,
        }
    }
}

impl TestConfig {
    /// Points the PostgREST client at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            storage_backend: StorageBackend::Supabase,
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            jwt_audience: None,
            storage_backend: self.storage_backend,
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("staff@clinic.com", "authenticated")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "receptionist")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            session_started_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "aud": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("HS256 encoding with an in-memory key cannot fail")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

/// Row shapes as PostgREST returns them (times rendered as `HH:MM:SS`).
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn physician_response(physician_id: &str) -> serde_json::Value {
        json!({
            "id": physician_id,
            "name": "Dra. Ana Souza",
            "specialty": "Cardiologia",
            "license_number": "CRM-SP 123456",
            "email": "ana.souza@clinic.com",
            "phone": "(11) 98888-7777",
            "attendance_days": ["seg", "qua", "sex"],
            "start_time": "08:00:00",
            "end_time": "12:00:00",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(patient_id: &str) -> serde_json::Value {
        json!({
            "id": patient_id,
            "name": "Carlos Lima",
            "birth_date": "1985-04-12",
            "national_id": "529.982.247-25",
            "email": "carlos.lima@mail.com",
            "phone": "(11) 97777-6666",
            "address": "Rua das Flores, 100",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(physician_id: &str, patient_id: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "date": "2024-06-03",
            "time": "09:20:00",
            "status": "scheduled",
            "notes": null,
            "physician_id": physician_id,
            "patient_id": patient_id,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "physician": {
                "id": physician_id,
                "name": "Dra. Ana Souza",
                "specialty": "Cardiologia"
            },
            "patient": {
                "id": patient_id,
                "name": "Carlos Lima",
                "email": "carlos.lima@mail.com"
            }
        })
    }

    /// PostgREST error body for a failed statement.
    pub fn error_response(code: &str, message: &str, details: Option<&str>) -> serde_json::Value {
        json!({
            "code": code,
            "details": details,
            "hint": null,
            "message": message
        })
    }
}
