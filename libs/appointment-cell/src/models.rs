use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use physician_cell::services::schedule::BookedSlot;
use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::patch::double_option;
use shared_models::ClockTime;

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

/// Lifecycle state. The Portuguese names used by older clients are
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "agendado")]
    Scheduled,
    #[serde(alias = "confirmado")]
    Confirmed,
    #[serde(alias = "cancelado")]
    Cancelled,
    #[serde(alias = "realizado")]
    Completed,
}

impl AppointmentStatus {
    /// Statuses that hold a slot.
    pub const ACTIVE: [AppointmentStatus; 3] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
    ];

    /// Statuses still expected to happen.
    pub const UPCOMING: [AppointmentStatus; 2] =
        [AppointmentStatus::Scheduled, AppointmentStatus::Confirmed];

    pub fn is_active(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhysicianSummary {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub physician_id: Uuid,
    pub patient_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physician: Option<PhysicianSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSummary>,
}

impl Appointment {
    pub fn as_booked_slot(&self) -> BookedSlot {
        BookedSlot {
            appointment_id: self.id,
            physician_id: self.physician_id,
            date: self.date,
            time: self.time,
            cancelled: !self.status.is_active(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAppointmentRequest {
    pub date: Option<NaiveDate>,
    /// Kept raw so a malformed time is reported as a validation error.
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub physician_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub time: ClockTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub physician_id: Uuid,
    pub patient_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub physician_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

/// Validated partial update as sent to the store.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physician_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
}

impl AppointmentChanges {
    pub fn is_empty(&self) -> bool {
        *self == AppointmentChanges::default()
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(time) = self.time {
            appointment.time = time;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(notes) = &self.notes {
            appointment.notes = notes.clone();
        }
        if let Some(physician_id) = self.physician_id {
            if physician_id != appointment.physician_id {
                appointment.physician = None;
            }
            appointment.physician_id = physician_id;
        }
        if let Some(patient_id) = self.patient_id {
            if patient_id != appointment.patient_id {
                appointment.patient = None;
            }
            appointment.patient_id = patient_id;
        }
    }
}

/// Query filter; every field is optional and they combine with AND.
/// Results are always ordered by date then time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub date: Option<NaiveDate>,
    pub physician_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    #[serde(skip)]
    pub from_date: Option<NaiveDate>,
    #[serde(skip)]
    pub statuses: Vec<AppointmentStatus>,
    #[serde(skip)]
    pub limit: Option<usize>,
}

impl AppointmentFilter {
    /// Slot-holding appointments of one physician on one day.
    pub fn day_bookings(physician_id: Uuid, date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            physician_id: Some(physician_id),
            statuses: AppointmentStatus::ACTIVE.to_vec(),
            ..Default::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.date.map_or(true, |d| appointment.date == d)
            && self.physician_id.map_or(true, |id| appointment.physician_id == id)
            && self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.status.map_or(true, |s| appointment.status == s)
            && self.from_date.map_or(true, |d| appointment.date >= d)
            && (self.statuses.is_empty() || self.statuses.contains(&appointment.status))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub physician_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub physician_id: Uuid,
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub active_appointments: usize,
    pub cancelled_appointments: usize,
    pub total_physicians: usize,
    pub total_patients: usize,
    pub upcoming: Vec<Appointment>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Physician not found")]
    PhysicianNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Physician or patient not found")]
    MissingReference,

    #[error("{0}")]
    Validation(String),

    #[error("Time slot not available for this physician")]
    SlotUnavailable,

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AppointmentError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(_) => AppointmentError::SlotUnavailable,
            DatabaseError::ForeignKeyViolation(_) => AppointmentError::MissingReference,
            other => AppointmentError::Database(other),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound
            | AppointmentError::PhysicianNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::MissingReference => AppError::NotFound(error.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::SlotUnavailable => AppError::Conflict(error.to_string()),
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_names_are_accepted() {
        let status: AppointmentStatus = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(status, AppointmentStatus::Cancelled);

        let status: AppointmentStatus = serde_json::from_str("\"realizado\"").unwrap();
        assert_eq!(status, AppointmentStatus::Completed);

        assert_eq!(serde_json::to_string(&AppointmentStatus::Confirmed).unwrap(), "\"confirmed\"");
    }

    #[test]
    fn display_matches_wire_names() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{}\"", status));
        }
    }

    #[test]
    fn update_distinguishes_cleared_notes() {
        let update: UpdateAppointmentRequest = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(update.notes, Some(None));

        let update: UpdateAppointmentRequest = serde_json::from_str(r#"{"status": "confirmado"}"#).unwrap();
        assert_eq!(update.notes, None);
        assert_eq!(update.status, Some(AppointmentStatus::Confirmed));
    }

    #[test]
    fn store_errors_map_to_booking_errors() {
        assert!(matches!(
            AppointmentError::from(DatabaseError::UniqueViolation("appointments_active_slot_idx".into())),
            AppointmentError::SlotUnavailable
        ));
        assert!(matches!(
            AppointmentError::from(DatabaseError::ForeignKeyViolation("physician_id".into())),
            AppointmentError::MissingReference
        ));
    }
}
