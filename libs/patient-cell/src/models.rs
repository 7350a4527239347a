use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    /// CPF, stored as `000.000.000-00`.
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePatientRequest {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub name: String,
    pub birth_date: NaiveDate,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UpdatePatientRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birth_date.is_none()
            && self.national_id.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }

    pub fn apply_to(&self, patient: &mut Patient) {
        if let Some(name) = &self.name {
            patient.name = name.clone();
        }
        if let Some(birth_date) = self.birth_date {
            patient.birth_date = birth_date;
        }
        if let Some(national_id) = &self.national_id {
            patient.national_id = national_id.clone();
        }
        if let Some(email) = &self.email {
            patient.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            patient.phone = phone.clone();
        }
        if let Some(address) = &self.address {
            patient.address = address.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub search: Option<String>,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("A patient with this {0} already exists")]
    Duplicate(&'static str),

    #[error("Patient has appointments and cannot be deleted")]
    HasAppointments,

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for PatientError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(column) if column.contains("national_id") => {
                PatientError::Duplicate("CPF")
            }
            DatabaseError::UniqueViolation(column) if column.contains("email") => {
                PatientError::Duplicate("email")
            }
            DatabaseError::UniqueViolation(_) => PatientError::Duplicate("value"),
            DatabaseError::ForeignKeyViolation(_) => PatientError::HasAppointments,
            other => PatientError::Database(other),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        match error {
            PatientError::NotFound => AppError::NotFound(error.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Duplicate(_) | PatientError::HasAppointments => {
                AppError::Conflict(error.to_string())
            }
            PatientError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_cpf_is_named() {
        let error = PatientError::from(DatabaseError::UniqueViolation("national_id".into()));
        assert_eq!(error.to_string(), "A patient with this CPF already exists");
    }
}
