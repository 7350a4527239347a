use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::patch::double_option;
use shared_models::ClockTime;

// ==============================================================================
// PHYSICIAN MODELS
// ==============================================================================

/// Weekday codes as stored in `attendance_days`, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceDay {
    Seg,
    Ter,
    Qua,
    Qui,
    Sex,
    Sab,
    Dom,
}

impl AttendanceDay {
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceDay::Seg => "seg",
            AttendanceDay::Ter => "ter",
            AttendanceDay::Qua => "qua",
            AttendanceDay::Qui => "qui",
            AttendanceDay::Sex => "sex",
            AttendanceDay::Sab => "sab",
            AttendanceDay::Dom => "dom",
        }
    }
}

impl From<Weekday> for AttendanceDay {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => AttendanceDay::Seg,
            Weekday::Tue => AttendanceDay::Ter,
            Weekday::Wed => AttendanceDay::Qua,
            Weekday::Thu => AttendanceDay::Qui,
            Weekday::Fri => AttendanceDay::Sex,
            Weekday::Sat => AttendanceDay::Sab,
            Weekday::Sun => AttendanceDay::Dom,
        }
    }
}

impl fmt::Display for AttendanceDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Physician {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub license_number: String,
    pub email: String,
    pub phone: String,
    /// Empty means the physician attends every day.
    #[serde(default)]
    pub attendance_days: Vec<AttendanceDay>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Physician {
    pub fn attends(&self, day: AttendanceDay) -> bool {
        self.attendance_days.is_empty() || self.attendance_days.contains(&day)
    }

    /// Working window, when both ends are configured.
    pub fn working_window(&self) -> Option<(ClockTime, ClockTime)> {
        self.start_time.zip(self.end_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePhysicianRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub attendance_days: Option<Vec<AttendanceDay>>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
}

/// Validated row ready to be persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NewPhysician {
    pub name: String,
    pub specialty: String,
    pub license_number: String,
    pub email: String,
    pub phone: String,
    pub attendance_days: Vec<AttendanceDay>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
}

/// Partial update. Working hours take `null` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePhysicianRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_days: Option<Vec<AttendanceDay>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<ClockTime>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<ClockTime>>,
}

impl UpdatePhysicianRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.specialty.is_none()
            && self.license_number.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.attendance_days.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    pub fn apply_to(&self, physician: &mut Physician) {
        if let Some(name) = &self.name {
            physician.name = name.clone();
        }
        if let Some(specialty) = &self.specialty {
            physician.specialty = specialty.clone();
        }
        if let Some(license_number) = &self.license_number {
            physician.license_number = license_number.clone();
        }
        if let Some(email) = &self.email {
            physician.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            physician.phone = phone.clone();
        }
        if let Some(days) = &self.attendance_days {
            physician.attendance_days = days.clone();
        }
        if let Some(start_time) = self.start_time {
            physician.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            physician.end_time = end_time;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhysicianSearchQuery {
    pub search: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum PhysicianError {
    #[error("Physician not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("A physician with this {0} already exists")]
    Duplicate(&'static str),

    #[error("Physician has appointments and cannot be deleted")]
    HasAppointments,

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for PhysicianError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(column) => {
                PhysicianError::Duplicate(duplicate_field(&column))
            }
            DatabaseError::ForeignKeyViolation(_) => PhysicianError::HasAppointments,
            other => PhysicianError::Database(other),
        }
    }
}

fn duplicate_field(column: &str) -> &'static str {
    if column.contains("license") {
        "license number"
    } else if column.contains("email") {
        "email"
    } else {
        "value"
    }
}

impl From<PhysicianError> for AppError {
    fn from(error: PhysicianError) -> Self {
        match error {
            PhysicianError::NotFound => AppError::NotFound(error.to_string()),
            PhysicianError::Validation(msg) => AppError::ValidationError(msg),
            PhysicianError::Duplicate(_) | PhysicianError::HasAppointments => {
                AppError::Conflict(error.to_string())
            }
            PhysicianError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_codes_start_on_monday() {
        // 2024-06-03 is a Monday, 2024-06-09 a Sunday.
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();

        assert_eq!(AttendanceDay::of(monday), AttendanceDay::Seg);
        assert_eq!(AttendanceDay::of(sunday), AttendanceDay::Dom);
    }

    #[test]
    fn attendance_days_use_lowercase_codes() {
        let days: Vec<AttendanceDay> = serde_json::from_str(r#"["seg","sab"]"#).unwrap();
        assert_eq!(days, vec![AttendanceDay::Seg, AttendanceDay::Sab]);
        assert_eq!(serde_json::to_string(&AttendanceDay::Qui).unwrap(), "\"qui\"");
    }

    #[test]
    fn update_payload_distinguishes_cleared_hours() {
        let update: UpdatePhysicianRequest =
            serde_json::from_str(r#"{"start_time": null, "phone": "123"}"#).unwrap();
        assert_eq!(update.start_time, Some(None));
        assert_eq!(update.end_time, None);

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"phone": "123", "start_time": null}));
    }

    #[test]
    fn unique_violations_name_the_field() {
        let error = PhysicianError::from(DatabaseError::UniqueViolation("license_number".into()));
        assert_eq!(error.to_string(), "A physician with this license number already exists");

        let error = PhysicianError::from(DatabaseError::UniqueViolation("physicians_email_key".into()));
        assert_eq!(error.to_string(), "A physician with this email already exists");
    }
}
