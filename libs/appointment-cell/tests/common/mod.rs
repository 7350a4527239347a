#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use appointment_cell::services::booking::BookingStores;
use appointment_cell::services::memory::MemoryAppointmentStore;
use patient_cell::models::{CreatePatientRequest, Patient};
use patient_cell::services::memory::MemoryPatientStore;
use patient_cell::services::patient::create_patient;
use physician_cell::models::{AttendanceDay, CreatePhysicianRequest, Physician};
use physician_cell::services::memory::MemoryPhysicianStore;
use physician_cell::services::physician::create_physician;
use shared_database::ReferenceTracker;
use shared_models::auth::User;
use shared_utils::test_utils::TestUser;

pub struct Clinic {
    pub appointments: Arc<MemoryAppointmentStore>,
    pub physicians: Arc<MemoryPhysicianStore>,
    pub patients: Arc<MemoryPatientStore>,
    pub user: User,
}

impl Clinic {
    pub fn new() -> Self {
        let physician_refs = ReferenceTracker::new("physicians");
        let patient_refs = ReferenceTracker::new("patients");

        Self {
            appointments: Arc::new(MemoryAppointmentStore::new(
                physician_refs.clone(),
                patient_refs.clone(),
            )),
            physicians: Arc::new(MemoryPhysicianStore::new(physician_refs)),
            patients: Arc::new(MemoryPatientStore::new(patient_refs)),
            user: TestUser::receptionist("front@clinic.com").to_user(),
        }
    }

    pub fn stores(&self) -> BookingStores<'_> {
        BookingStores {
            appointments: self.appointments.as_ref(),
            physicians: self.physicians.as_ref(),
            patients: self.patients.as_ref(),
        }
    }

    /// Physician working 08:00-12:00 on the given days (empty = every day).
    pub async fn physician(&self, license: &str, days: Vec<AttendanceDay>) -> Physician {
        let request = CreatePhysicianRequest {
            name: Some(format!("Dr. {}", license)),
            specialty: Some("Clínica Geral".into()),
            license_number: Some(license.into()),
            email: Some(format!("{}@clinic.com", license.to_lowercase())),
            phone: Some("11988887777".into()),
            attendance_days: Some(days),
            start_time: "08:00".parse().ok(),
            end_time: "12:00".parse().ok(),
        };
        create_physician(self.physicians.as_ref(), request, &self.user).await.unwrap()
    }

    pub async fn patient(&self, cpf: &str, email: &str) -> Patient {
        let request = CreatePatientRequest {
            name: Some(format!("Paciente {}", cpf)),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 15),
            national_id: Some(cpf.into()),
            email: Some(email.into()),
            phone: Some("11977776666".into()),
            address: Some("Rua das Flores, 100".into()),
        };
        create_patient(self.patients.as_ref(), request, &self.user).await.unwrap()
    }
}

/// 2024-06-03, a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}
