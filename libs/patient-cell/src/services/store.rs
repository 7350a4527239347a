use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, QueryBuilder, SupabaseClient};

use crate::models::{NewPatient, Patient, UpdatePatientRequest};

const TABLE: &str = "patients";

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Patient>, DatabaseError>;
    async fn search(&self, term: &str) -> Result<Vec<Patient>, DatabaseError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError>;
    async fn insert(&self, patient: NewPatient) -> Result<Patient, DatabaseError>;
    async fn update(&self, id: Uuid, changes: UpdatePatientRequest)
                    -> Result<Option<Patient>, DatabaseError>;
    async fn delete(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError>;
    async fn count(&self) -> Result<usize, DatabaseError>;
}

pub struct SupabasePatientStore {
    supabase: SupabaseClient,
}

impl SupabasePatientStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl PatientStore for SupabasePatientStore {
    async fn list(&self) -> Result<Vec<Patient>, DatabaseError> {
        let query = QueryBuilder::new().select("*").order("name", true).build();
        self.supabase.select(TABLE, &query).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Patient>, DatabaseError> {
        let query = QueryBuilder::new()
            .select("*")
            .ilike_any(&["name", "national_id", "email"], term)
            .order("name", true)
            .build();
        self.supabase.select(TABLE, &query).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError> {
        let query = QueryBuilder::new().select("*").eq("id", id).limit(1).build();
        let rows: Vec<Patient> = self.supabase.select(TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, patient: NewPatient) -> Result<Patient, DatabaseError> {
        self.supabase.insert(TABLE, "", serde_json::to_value(patient)?).await
    }

    async fn update(&self, id: Uuid, changes: UpdatePatientRequest)
                    -> Result<Option<Patient>, DatabaseError> {
        let mut body = serde_json::to_value(changes)?;
        body["updated_at"] = json!(Utc::now().to_rfc3339());

        let filter = QueryBuilder::new().eq("id", id).build();
        self.supabase.update(TABLE, &filter, body).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError> {
        let filter = QueryBuilder::new().eq("id", id).build();
        self.supabase.delete(TABLE, &filter).await
    }

    async fn count(&self) -> Result<usize, DatabaseError> {
        self.supabase.count(TABLE, "").await
    }
}
