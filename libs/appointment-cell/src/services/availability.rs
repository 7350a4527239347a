use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use physician_cell::services::schedule::BookedSlot;
use shared_models::ClockTime;

use crate::models::{AppointmentError, AppointmentFilter};
use crate::services::store::AppointmentStore;

/// Slot-holding bookings of a physician on one calendar day.
pub async fn day_bookings(
    store: &dyn AppointmentStore,
    physician_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<BookedSlot>, AppointmentError> {
    let appointments = store
        .find(&AppointmentFilter::day_bookings(physician_id, date))
        .await?;

    Ok(appointments.iter().map(|a| a.as_booked_slot()).collect())
}

/// True when no non-cancelled appointment holds `time` on `date`.
pub async fn is_available(
    store: &dyn AppointmentStore,
    physician_id: Uuid,
    date: NaiveDate,
    time: ClockTime,
) -> Result<bool, AppointmentError> {
    is_available_excluding(store, physician_id, date, time, None).await
}

/// Same as [`is_available`], ignoring `exclude_appointment_id` so an
/// appointment never conflicts with itself when rescheduled.
pub async fn is_available_excluding(
    store: &dyn AppointmentStore,
    physician_id: Uuid,
    date: NaiveDate,
    time: ClockTime,
    exclude_appointment_id: Option<Uuid>,
) -> Result<bool, AppointmentError> {
    let bookings = day_bookings(store, physician_id, date).await?;

    let taken = bookings.iter().any(|booking| {
        !booking.cancelled
            && booking.time == time
            && Some(booking.appointment_id) != exclude_appointment_id
    });

    debug!(
        "Physician {} on {} at {}: {}",
        physician_id,
        date,
        time,
        if taken { "taken" } else { "free" }
    );
    Ok(!taken)
}
