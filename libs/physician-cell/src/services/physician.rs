use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::ClockTime;
use shared_utils::validation::{is_valid_email, missing_fields_message, normalize_email, required};

use crate::models::{
    AttendanceDay, CreatePhysicianRequest, NewPhysician, Physician, PhysicianError,
    UpdatePhysicianRequest,
};
use crate::services::store::PhysicianStore;

/// Lists physicians by name, optionally narrowed by a search term.
pub async fn list_physicians(
    store: &dyn PhysicianStore,
    search: Option<&str>,
) -> Result<Vec<Physician>, PhysicianError> {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => Ok(store.search(term).await?),
        None => Ok(store.list().await?),
    }
}

pub async fn get_physician(store: &dyn PhysicianStore, id: Uuid) -> Result<Physician, PhysicianError> {
    debug!("Fetching physician {}", id);
    store.find_by_id(id).await?.ok_or(PhysicianError::NotFound)
}

pub async fn create_physician(
    store: &dyn PhysicianStore,
    request: CreatePhysicianRequest,
    user: &User,
) -> Result<Physician, PhysicianError> {
    let new_physician = validate_new_physician(request)?;

    let physician = store.insert(new_physician).await.map_err(|e| {
        warn!("Failed to create physician: {}", e);
        PhysicianError::from(e)
    })?;

    info!("Physician {} created by {}", physician.id, user.actor());
    Ok(physician)
}

pub async fn update_physician(
    store: &dyn PhysicianStore,
    id: Uuid,
    mut request: UpdatePhysicianRequest,
    user: &User,
) -> Result<Physician, PhysicianError> {
    let current = get_physician(store, id).await?;

    normalize_update(&mut request)?;
    if request.is_empty() {
        return Ok(current);
    }

    let mut merged = current.clone();
    request.apply_to(&mut merged);
    validate_working_hours(&merged)?;

    let physician = store
        .update(id, request)
        .await?
        .ok_or(PhysicianError::NotFound)?;

    info!("Physician {} updated by {}", id, user.actor());
    Ok(physician)
}

pub async fn delete_physician(
    store: &dyn PhysicianStore,
    id: Uuid,
    user: &User,
) -> Result<(), PhysicianError> {
    match store.delete(id).await? {
        Some(_) => {
            info!("Physician {} deleted by {}", id, user.actor());
            Ok(())
        }
        None => Err(PhysicianError::NotFound),
    }
}

fn validate_new_physician(request: CreatePhysicianRequest) -> Result<NewPhysician, PhysicianError> {
    let name = required(request.name);
    let specialty = required(request.specialty);
    let license_number = required(request.license_number);
    let email = required(request.email);
    let phone = required(request.phone);

    let (name, specialty, license_number, email, phone) =
        match (name, specialty, license_number, email, phone) {
            (Some(name), Some(specialty), Some(license_number), Some(email), Some(phone)) => {
                (name, specialty, license_number, email, phone)
            }
            (name, specialty, license_number, email, phone) => {
                let message = missing_fields_message(&[
                    ("name", name.is_some()),
                    ("specialty", specialty.is_some()),
                    ("license_number", license_number.is_some()),
                    ("email", email.is_some()),
                    ("phone", phone.is_some()),
                ]);
                return Err(PhysicianError::Validation(message.unwrap_or_default()));
            }
        };

    if !is_valid_email(&email) {
        return Err(PhysicianError::Validation(format!("Invalid email: {}", email)));
    }

    let new_physician = NewPhysician {
        name,
        specialty,
        license_number,
        email: normalize_email(&email),
        phone,
        attendance_days: dedup_days(request.attendance_days.unwrap_or_default()),
        start_time: request.start_time,
        end_time: request.end_time,
    };
    check_window(new_physician.start_time, new_physician.end_time)?;

    Ok(new_physician)
}

fn normalize_update(request: &mut UpdatePhysicianRequest) -> Result<(), PhysicianError> {
    for (field, value) in [
        ("name", &mut request.name),
        ("specialty", &mut request.specialty),
        ("license_number", &mut request.license_number),
        ("email", &mut request.email),
        ("phone", &mut request.phone),
    ] {
        if let Some(raw) = value.take() {
            let trimmed = required(Some(raw))
                .ok_or_else(|| PhysicianError::Validation(format!("{} cannot be empty", field)))?;
            *value = Some(trimmed);
        }
    }

    if let Some(email) = request.email.take() {
        if !is_valid_email(&email) {
            return Err(PhysicianError::Validation(format!("Invalid email: {}", email)));
        }
        request.email = Some(normalize_email(&email));
    }

    if let Some(days) = request.attendance_days.take() {
        request.attendance_days = Some(dedup_days(days));
    }

    Ok(())
}

fn validate_working_hours(physician: &Physician) -> Result<(), PhysicianError> {
    check_window(physician.start_time, physician.end_time)
}

fn check_window(
    start: Option<ClockTime>,
    end: Option<ClockTime>,
) -> Result<(), PhysicianError> {
    match (start, end) {
        (Some(start), Some(end)) if start >= end => Err(PhysicianError::Validation(format!(
            "start_time ({}) must be before end_time ({})",
            start, end
        ))),
        (Some(_), None) | (None, Some(_)) => Err(PhysicianError::Validation(
            "start_time and end_time must be set together".to_string(),
        )),
        _ => Ok(()),
    }
}

fn dedup_days(mut days: Vec<AttendanceDay>) -> Vec<AttendanceDay> {
    days.sort();
    days.dedup();
    days
}
