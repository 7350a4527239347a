use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::ClockTime;

use crate::models::{AttendanceDay, Physician};

/// Fixed consultation cadence.
pub const SLOT_INTERVAL_MINUTES: usize = 20;

/// An existing appointment as seen by the slot generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub appointment_id: Uuid,
    pub physician_id: Uuid,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub cancelled: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleViolation {
    #[error("Physician does not attend on {0}")]
    DayNotAttended(AttendanceDay),

    #[error("Time {time} is outside the physician's working hours ({start} - {end})")]
    OutsideHours {
        time: ClockTime,
        start: ClockTime,
        end: ClockTime,
    },
}

pub fn attends_on(physician: &Physician, date: NaiveDate) -> bool {
    physician.attends(AttendanceDay::of(date))
}

/// Rejects bookings on a day the physician does not attend or outside the
/// configured window. Physicians without a window accept any time.
pub fn check_within_schedule(
    physician: &Physician,
    date: NaiveDate,
    time: ClockTime,
) -> Result<(), ScheduleViolation> {
    let day = AttendanceDay::of(date);
    if !physician.attends(day) {
        return Err(ScheduleViolation::DayNotAttended(day));
    }

    if let Some((start, end)) = physician.working_window() {
        if time < start || time > end {
            return Err(ScheduleViolation::OutsideHours { time, start, end });
        }
    }

    Ok(())
}

/// Free 20-minute slots from `start_time` up to and including `end_time`.
///
/// Empty when the physician has no working window or does not attend on
/// `date`. Cancelled bookings and the booking `exclude_appointment_id`
/// never block a slot.
pub fn generate_slots(
    physician: &Physician,
    date: NaiveDate,
    bookings: &[BookedSlot],
    exclude_appointment_id: Option<Uuid>,
) -> Vec<ClockTime> {
    let Some((start, end)) = physician.working_window() else {
        return Vec::new();
    };
    if !attends_on(physician, date) {
        return Vec::new();
    }

    let taken: HashSet<ClockTime> = bookings
        .iter()
        .filter(|b| b.physician_id == physician.id && b.date == date)
        .filter(|b| !b.cancelled && Some(b.appointment_id) != exclude_appointment_id)
        .map(|b| b.time)
        .collect();

    (start.minutes_since_midnight()..=end.minutes_since_midnight())
        .step_by(SLOT_INTERVAL_MINUTES)
        .filter_map(ClockTime::from_minutes)
        .filter(|slot| !taken.contains(slot))
        .collect()
}
