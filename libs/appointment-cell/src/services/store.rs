use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, QueryBuilder, SupabaseClient};

use crate::models::{Appointment, AppointmentChanges, AppointmentFilter, NewAppointment};

const TABLE: &str = "appointments";

/// Columns read back for every appointment, with the physician and patient
/// summaries embedded through their foreign keys.
const SELECT_WITH_PARTIES: &str =
    "*,physician:physicians(id,name,specialty),patient:patients(id,name,email)";

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// Appointments matching `filter`, ordered by date then time.
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError>;

    async fn count(&self, filter: &AppointmentFilter) -> Result<usize, DatabaseError>;

    /// Fails with a unique violation when the physician already has an
    /// active appointment at that date and time.
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError>;

    async fn update(&self, id: Uuid, changes: AppointmentChanges)
                    -> Result<Option<Appointment>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError>;
}

pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

fn filter_query(filter: &AppointmentFilter, builder: QueryBuilder) -> QueryBuilder {
    let mut builder = builder;

    if let Some(date) = filter.date {
        builder = builder.eq("date", date);
    }
    if let Some(physician_id) = filter.physician_id {
        builder = builder.eq("physician_id", physician_id);
    }
    if let Some(patient_id) = filter.patient_id {
        builder = builder.eq("patient_id", patient_id);
    }
    if let Some(status) = filter.status {
        builder = builder.eq("status", status);
    }
    if let Some(from_date) = filter.from_date {
        builder = builder.gte("date", from_date);
    }
    if !filter.statuses.is_empty() {
        builder = builder.in_list("status", &filter.statuses);
    }

    builder
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let query = QueryBuilder::new()
            .select(SELECT_WITH_PARTIES)
            .eq("id", id)
            .limit(1)
            .build();
        let rows: Vec<Appointment> = self.supabase.select(TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError> {
        debug!("Finding appointments with {:?}", filter);

        let mut builder = filter_query(filter, QueryBuilder::new().select(SELECT_WITH_PARTIES))
            .order("date", true)
            .order("time", true);
        if let Some(limit) = filter.limit {
            builder = builder.limit(limit);
        }

        self.supabase.select(TABLE, &builder.build()).await
    }

    async fn count(&self, filter: &AppointmentFilter) -> Result<usize, DatabaseError> {
        let query = filter_query(filter, QueryBuilder::new()).build();
        self.supabase.count(TABLE, &query).await
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        let query = QueryBuilder::new().select(SELECT_WITH_PARTIES).build();
        self.supabase
            .insert(TABLE, &query, serde_json::to_value(appointment)?)
            .await
    }

    async fn update(&self, id: Uuid, changes: AppointmentChanges)
                    -> Result<Option<Appointment>, DatabaseError> {
        let mut body = serde_json::to_value(changes)?;
        body["updated_at"] = json!(Utc::now().to_rfc3339());

        let filter = QueryBuilder::new().select(SELECT_WITH_PARTIES).eq("id", id).build();
        self.supabase.update(TABLE, &filter, body).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let filter = QueryBuilder::new().eq("id", id).build();
        self.supabase.delete(TABLE, &filter).await
    }
}
