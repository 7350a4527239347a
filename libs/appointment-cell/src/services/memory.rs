use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{DatabaseError, ReferenceTracker};

use crate::models::{Appointment, AppointmentChanges, AppointmentFilter, NewAppointment};
use crate::services::store::AppointmentStore;

const ACTIVE_SLOT_INDEX: &str = "appointments_active_slot_idx";

/// In-process appointment table. Holds references on the physician and
/// patient trackers and enforces the active-slot unique index.
pub struct MemoryAppointmentStore {
    rows: RwLock<HashMap<Uuid, Appointment>>,
    physicians: ReferenceTracker,
    patients: ReferenceTracker,
}

impl MemoryAppointmentStore {
    pub fn new(physicians: ReferenceTracker, patients: ReferenceTracker) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            physicians,
            patients,
        }
    }

    fn check_slot(rows: &HashMap<Uuid, Appointment>, candidate: &Appointment) -> Result<(), DatabaseError> {
        if !candidate.status.is_active() {
            return Ok(());
        }

        let taken = rows.values().any(|existing| {
            existing.id != candidate.id
                && existing.status.is_active()
                && existing.physician_id == candidate.physician_id
                && existing.date == candidate.date
                && existing.time == candidate.time
        });

        if taken {
            Err(DatabaseError::UniqueViolation(ACTIVE_SLOT_INDEX.to_string()))
        } else {
            Ok(())
        }
    }

    fn swap_reference(tracker: &ReferenceTracker, old: Uuid, new: Uuid) -> Result<(), DatabaseError> {
        if old != new {
            tracker.acquire(new)?;
            tracker.release(old);
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut found: Vec<Appointment> = rows.values().filter(|a| filter.matches(a)).cloned().collect();

        found.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.time.cmp(&b.time))
                .then(a.created_at.cmp(&b.created_at))
        });
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }

        Ok(found)
    }

    async fn count(&self, filter: &AppointmentFilter) -> Result<usize, DatabaseError> {
        Ok(self.rows.read().await.values().filter(|a| filter.matches(a)).count())
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        let now = Utc::now();
        let row = Appointment {
            id: Uuid::new_v4(),
            date: appointment.date,
            time: appointment.time,
            status: appointment.status,
            notes: appointment.notes,
            physician_id: appointment.physician_id,
            patient_id: appointment.patient_id,
            created_at: now,
            updated_at: now,
            physician: None,
            patient: None,
        };

        let mut rows = self.rows.write().await;
        Self::check_slot(&rows, &row)?;

        self.physicians.acquire(row.physician_id)?;
        if let Err(e) = self.patients.acquire(row.patient_id) {
            self.physicians.release(row.physician_id);
            return Err(e);
        }

        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: AppointmentChanges)
                    -> Result<Option<Appointment>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(current) = rows.get(&id).cloned() else {
            return Ok(None);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated);
        updated.updated_at = Utc::now();
        Self::check_slot(&rows, &updated)?;

        Self::swap_reference(&self.physicians, current.physician_id, updated.physician_id)?;
        if let Err(e) = Self::swap_reference(&self.patients, current.patient_id, updated.patient_id) {
            Self::swap_reference(&self.physicians, updated.physician_id, current.physician_id)?;
            return Err(e);
        }

        rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let removed = self.rows.write().await.remove(&id);

        if let Some(appointment) = &removed {
            self.physicians.release(appointment.physician_id);
            self.patients.release(appointment.patient_id);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use crate::models::AppointmentStatus;

    struct Fixture {
        store: MemoryAppointmentStore,
        physicians: ReferenceTracker,
        physician_id: Uuid,
        patient_id: Uuid,
    }

    fn fixture() -> Fixture {
        let physicians = ReferenceTracker::new("physicians");
        let patients = ReferenceTracker::new("patients");
        let physician_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        physicians.register(physician_id);
        patients.register(patient_id);

        Fixture {
            store: MemoryAppointmentStore::new(physicians.clone(), patients),
            physicians,
            physician_id,
            patient_id,
        }
    }

    fn new_appointment(f: &Fixture, time: &str, status: AppointmentStatus) -> NewAppointment {
        NewAppointment {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            time: time.parse().unwrap(),
            status,
            notes: None,
            physician_id: f.physician_id,
            patient_id: f.patient_id,
        }
    }

    #[tokio::test]
    async fn active_slot_is_unique() {
        let f = fixture();
        f.store.insert(new_appointment(&f, "09:00", AppointmentStatus::Scheduled)).await.unwrap();

        let duplicate = f.store.insert(new_appointment(&f, "09:00", AppointmentStatus::Confirmed)).await;
        assert_matches!(duplicate, Err(DatabaseError::UniqueViolation(_)));

        let cancelled = f.store.insert(new_appointment(&f, "09:00", AppointmentStatus::Cancelled)).await;
        assert!(cancelled.is_ok());
    }

    #[tokio::test]
    async fn unknown_physician_is_a_foreign_key_violation() {
        let f = fixture();
        let mut appointment = new_appointment(&f, "09:00", AppointmentStatus::Scheduled);
        appointment.physician_id = Uuid::new_v4();

        assert_matches!(f.store.insert(appointment).await, Err(DatabaseError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn references_follow_the_row() {
        let f = fixture();
        let created = f.store.insert(new_appointment(&f, "09:00", AppointmentStatus::Scheduled)).await.unwrap();
        assert!(f.physicians.unregister(f.physician_id).is_err());

        f.store.delete(created.id).await.unwrap();
        assert!(f.physicians.unregister(f.physician_id).is_ok());
    }
}
