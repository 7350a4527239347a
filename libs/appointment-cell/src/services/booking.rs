use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use patient_cell::services::store::PatientStore;
use physician_cell::models::Physician;
use physician_cell::services::schedule::{check_within_schedule, generate_slots};
use physician_cell::services::store::PhysicianStore;
use shared_models::auth::User;
use shared_models::ClockTime;
use shared_utils::validation::missing_fields_message;

use crate::models::{
    Appointment, AppointmentChanges, AppointmentError, AppointmentFilter, CreateAppointmentRequest,
    NewAppointment, UpdateAppointmentRequest,
};
use crate::services::availability::{day_bookings, is_available_excluding};
use crate::services::store::AppointmentStore;

/// Store handles the booking operations work against.
#[derive(Clone, Copy)]
pub struct BookingStores<'a> {
    pub appointments: &'a dyn AppointmentStore,
    pub physicians: &'a dyn PhysicianStore,
    pub patients: &'a dyn PatientStore,
}

pub async fn find_by_id(store: &dyn AppointmentStore, id: Uuid) -> Result<Appointment, AppointmentError> {
    store.find_by_id(id).await?.ok_or(AppointmentError::NotFound)
}

pub async fn find_all(store: &dyn AppointmentStore) -> Result<Vec<Appointment>, AppointmentError> {
    find_by_filters(store, &AppointmentFilter::default()).await
}

pub async fn find_by_filters(
    store: &dyn AppointmentStore,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, AppointmentError> {
    Ok(store.find(filter).await?)
}

pub async fn create_appointment(
    stores: BookingStores<'_>,
    request: CreateAppointmentRequest,
    user: &User,
) -> Result<Appointment, AppointmentError> {
    let (date, raw_time, physician_id, patient_id) =
        match (request.date, request.time, request.physician_id, request.patient_id) {
            (Some(date), Some(time), Some(physician_id), Some(patient_id)) => {
                (date, time, physician_id, patient_id)
            }
            (date, time, physician_id, patient_id) => {
                let message = missing_fields_message(&[
                    ("date", date.is_some()),
                    ("time", time.is_some()),
                    ("physician_id", physician_id.is_some()),
                    ("patient_id", patient_id.is_some()),
                ]);
                return Err(AppointmentError::Validation(message.unwrap_or_default()));
            }
        };

    let time = parse_time(&raw_time)?;
    let status = request.status.unwrap_or_default();

    let physician = load_physician(stores.physicians, physician_id).await?;
    ensure_patient(stores.patients, patient_id).await?;

    if status.is_active() {
        ensure_bookable(stores.appointments, &physician, date, time, None).await?;
    }

    let appointment = stores
        .appointments
        .insert(NewAppointment {
            date,
            time,
            status,
            notes: clean_notes(request.notes),
            physician_id,
            patient_id,
        })
        .await
        .map_err(|e| {
            warn!("Failed to create appointment: {}", e);
            AppointmentError::from(e)
        })?;

    info!(
        "Appointment {} booked for physician {} on {} at {} by {}",
        appointment.id, physician_id, date, time, user.actor()
    );
    Ok(appointment)
}

pub async fn update_appointment(
    stores: BookingStores<'_>,
    id: Uuid,
    request: UpdateAppointmentRequest,
    user: &User,
) -> Result<Appointment, AppointmentError> {
    let current = find_by_id(stores.appointments, id).await?;

    let changes = AppointmentChanges {
        date: request.date,
        time: request.time.as_deref().map(parse_time).transpose()?,
        status: request.status,
        notes: request.notes.map(clean_notes),
        physician_id: request.physician_id,
        patient_id: request.patient_id,
    };
    if changes.is_empty() {
        return Ok(current);
    }

    let mut target = current.clone();
    changes.apply_to(&mut target);

    if target.patient_id != current.patient_id {
        ensure_patient(stores.patients, target.patient_id).await?;
    }

    let slot_moved = target.date != current.date
        || target.time != current.time
        || target.physician_id != current.physician_id;
    let reactivated = !current.status.is_active() && target.status.is_active();

    if target.status.is_active() && (slot_moved || reactivated) {
        let physician = load_physician(stores.physicians, target.physician_id).await?;
        ensure_bookable(stores.appointments, &physician, target.date, target.time, Some(id)).await?;
    } else if target.physician_id != current.physician_id {
        load_physician(stores.physicians, target.physician_id).await?;
    }

    let appointment = stores
        .appointments
        .update(id, changes)
        .await?
        .ok_or(AppointmentError::NotFound)?;

    info!("Appointment {} updated by {}", id, user.actor());
    Ok(appointment)
}

pub async fn delete_appointment(
    store: &dyn AppointmentStore,
    id: Uuid,
    user: &User,
) -> Result<(), AppointmentError> {
    store.delete(id).await?.ok_or(AppointmentError::NotFound)?;
    info!("Appointment {} deleted by {}", id, user.actor());
    Ok(())
}

/// Free slots of a physician on `date`, on the 20-minute grid.
pub async fn available_slots(
    stores: BookingStores<'_>,
    physician_id: Uuid,
    date: NaiveDate,
    exclude_appointment_id: Option<Uuid>,
) -> Result<Vec<ClockTime>, AppointmentError> {
    let physician = load_physician(stores.physicians, physician_id).await?;
    let bookings = day_bookings(stores.appointments, physician_id, date).await?;

    let slots = generate_slots(&physician, date, &bookings, exclude_appointment_id);
    debug!("{} free slots for physician {} on {}", slots.len(), physician_id, date);
    Ok(slots)
}

pub fn parse_time(raw: &str) -> Result<ClockTime, AppointmentError> {
    raw.parse::<ClockTime>()
        .map_err(|e| AppointmentError::Validation(e.to_string()))
}

async fn ensure_bookable(
    store: &dyn AppointmentStore,
    physician: &Physician,
    date: NaiveDate,
    time: ClockTime,
    exclude_appointment_id: Option<Uuid>,
) -> Result<(), AppointmentError> {
    check_within_schedule(physician, date, time)
        .map_err(|violation| AppointmentError::Validation(violation.to_string()))?;

    if !is_available_excluding(store, physician.id, date, time, exclude_appointment_id).await? {
        warn!("Slot {} {} already taken for physician {}", date, time, physician.id);
        return Err(AppointmentError::SlotUnavailable);
    }

    Ok(())
}

async fn load_physician(store: &dyn PhysicianStore, id: Uuid) -> Result<Physician, AppointmentError> {
    store.find_by_id(id).await?.ok_or(AppointmentError::PhysicianNotFound)
}

async fn ensure_patient(store: &dyn PatientStore, id: Uuid) -> Result<(), AppointmentError> {
    store.find_by_id(id).await?.ok_or(AppointmentError::PatientNotFound)?;
    Ok(())
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;

    #[test]
    fn blank_notes_are_dropped() {
        assert_eq!(clean_notes(Some("  ".into())), None);
        assert_eq!(clean_notes(Some(" retorno ".into())), Some("retorno".to_string()));
    }

    #[test]
    fn time_must_be_hh_mm() {
        assert_eq!(parse_time("09:20").unwrap().to_string(), "09:20");
        assert!(matches!(parse_time("9h20"), Err(AppointmentError::Validation(_))));
    }

    #[test]
    fn default_status_is_scheduled() {
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Scheduled);
    }
}
