use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{DatabaseError, ReferenceTracker};

use crate::models::{NewPhysician, Physician, UpdatePhysicianRequest};
use crate::services::store::PhysicianStore;

/// In-process physician table with the same unique and foreign key rules
/// as the `physicians` table.
pub struct MemoryPhysicianStore {
    rows: RwLock<HashMap<Uuid, Physician>>,
    references: ReferenceTracker,
}

impl MemoryPhysicianStore {
    pub fn new(references: ReferenceTracker) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            references,
        }
    }

    fn check_unique(rows: &HashMap<Uuid, Physician>, candidate: &Physician) -> Result<(), DatabaseError> {
        for existing in rows.values().filter(|p| p.id != candidate.id) {
            if existing.license_number == candidate.license_number {
                return Err(DatabaseError::UniqueViolation("license_number".to_string()));
            }
            if existing.email == candidate.email {
                return Err(DatabaseError::UniqueViolation("email".to_string()));
            }
        }
        Ok(())
    }
}

fn sorted_by_name(mut physicians: Vec<Physician>) -> Vec<Physician> {
    physicians.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    physicians
}

#[async_trait]
impl PhysicianStore for MemoryPhysicianStore {
    async fn list(&self) -> Result<Vec<Physician>, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(sorted_by_name(rows.values().cloned().collect()))
    }

    async fn search(&self, term: &str) -> Result<Vec<Physician>, DatabaseError> {
        let needle = term.to_lowercase();
        let rows = self.rows.read().await;
        let matches = rows
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.specialty.to_lowercase().contains(&needle)
                    || p.license_number.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(sorted_by_name(matches))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, physician: NewPhysician) -> Result<Physician, DatabaseError> {
        let now = Utc::now();
        let row = Physician {
            id: Uuid::new_v4(),
            name: physician.name,
            specialty: physician.specialty,
            license_number: physician.license_number,
            email: physician.email,
            phone: physician.phone,
            attendance_days: physician.attendance_days,
            start_time: physician.start_time,
            end_time: physician.end_time,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().await;
        Self::check_unique(&rows, &row)?;
        self.references.register(row.id);
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UpdatePhysicianRequest)
                    -> Result<Option<Physician>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(current) = rows.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated);
        updated.updated_at = Utc::now();
        Self::check_unique(&rows, &updated)?;

        rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Physician>, DatabaseError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&id) {
            return Ok(None);
        }

        self.references.unregister(id)?;
        Ok(rows.remove(&id))
    }

    async fn count(&self) -> Result<usize, DatabaseError> {
        Ok(self.rows.read().await.len())
    }
}
