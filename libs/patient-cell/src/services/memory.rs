use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{DatabaseError, ReferenceTracker};

use crate::models::{NewPatient, Patient, UpdatePatientRequest};
use crate::services::store::PatientStore;

pub struct MemoryPatientStore {
    rows: RwLock<HashMap<Uuid, Patient>>,
    references: ReferenceTracker,
}

impl MemoryPatientStore {
    pub fn new(references: ReferenceTracker) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            references,
        }
    }
}

fn check_unique(rows: &HashMap<Uuid, Patient>, candidate: &Patient) -> Result<(), DatabaseError> {
    let clash = rows.values().filter(|p| p.id != candidate.id).find_map(|existing| {
        if existing.national_id == candidate.national_id {
            Some("national_id")
        } else if existing.email == candidate.email {
            Some("email")
        } else {
            None
        }
    });

    match clash {
        Some(column) => Err(DatabaseError::UniqueViolation(column.to_string())),
        None => Ok(()),
    }
}

fn by_name(mut patients: Vec<Patient>) -> Vec<Patient> {
    patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    patients
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn list(&self) -> Result<Vec<Patient>, DatabaseError> {
        Ok(by_name(self.rows.read().await.values().cloned().collect()))
    }

    async fn search(&self, term: &str) -> Result<Vec<Patient>, DatabaseError> {
        let needle = term.to_lowercase();
        let rows = self.rows.read().await;
        Ok(by_name(
            rows.values()
                .filter(|p| {
                    p.name.to_lowercase().contains(&needle)
                        || p.national_id.contains(&needle)
                        || p.email.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, patient: NewPatient) -> Result<Patient, DatabaseError> {
        let now = Utc::now();
        let row = Patient {
            id: Uuid::new_v4(),
            name: patient.name,
            birth_date: patient.birth_date,
            national_id: patient.national_id,
            email: patient.email,
            phone: patient.phone,
            address: patient.address,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().await;
        check_unique(&rows, &row)?;
        self.references.register(row.id);
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UpdatePatientRequest)
                    -> Result<Option<Patient>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(mut updated) = rows.get(&id).cloned() else {
            return Ok(None);
        };

        changes.apply_to(&mut updated);
        updated.updated_at = Utc::now();
        check_unique(&rows, &updated)?;

        rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Patient>, DatabaseError> {
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
