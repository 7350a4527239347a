use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, QueryBuilder, SupabaseClient};

use crate::models::{NewPhysician, Physician, UpdatePhysicianRequest};

const TABLE: &str = "physicians";

/// Persistence for physician records.
#[async_trait]
pub trait PhysicianStore: Send + Sync {
    /// All physicians ordered by name.
    async fn list(&self) -> Result<Vec<Physician>, DatabaseError>;

    /// Case-insensitive match on name, specialty or license number.
    async fn search(&self, term: &str) -> Result<Vec<Physician>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError>;

    async fn insert(&self, physician: NewPhysician) -> Result<Physician, DatabaseError>;

    async fn update(&self, id: Uuid, changes: UpdatePhysicianRequest)
                    -> Result<Option<Physician>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError>;

    async fn count(&self) -> Result<usize, DatabaseError>;
}

pub struct SupabasePhysicianStore {
    supabase: SupabaseClient,
}

impl SupabasePhysicianStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl PhysicianStore for SupabasePhysicianStore {
    async fn list(&self) -> Result<Vec<Physician>, DatabaseError> {
        let query = QueryBuilder::new().select("*").order("name", true).build();
        self.supabase.select(TABLE, &query).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Physician>, DatabaseError> {
        debug!("Searching physicians for '{}'", term);
        let query = QueryBuilder::new()
            .select("*")
            .ilike_any(&["name", "specialty", "license_number"], term)
            .order("name", true)
            .build();
        self.supabase.select(TABLE, &query).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError> {
        let query = QueryBuilder::new().select("*").eq("id", id).limit(1).build();
        let rows: Vec<Physician> = self.supabase.select(TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, physician: NewPhysician) -> Result<Physician, DatabaseError> {
        self.supabase.insert(TABLE, "", serde_json::to_value(physician)?).await
    }

    async fn update(&self, id: Uuid, changes: UpdatePhysicianRequest)
                    -> Result<Option<Physician>, DatabaseError> {
        let mut body = serde_json::to_value(changes)?;
        body["updated_at"] = json!(Utc::now().to_rfc3339());

        let filter = QueryBuilder::new().eq("id", id).build();
        self.supabase.update(TABLE, &filter, body).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError> {
        let filter = QueryBuilder::new().eq("id", id).build();
        self.supabase.delete(TABLE, &filter).await
    }

    async fn count(&self) -> Result<usize, DatabaseError> {
        self.supabase.count(TABLE, "").await
    }
}
