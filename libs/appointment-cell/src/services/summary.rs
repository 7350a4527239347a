use chrono::NaiveDate;
use futures::try_join;
use tracing::debug;

use crate::models::{AppointmentError, AppointmentFilter, AppointmentStatus, DashboardSummary};
use crate::services::booking::BookingStores;

const UPCOMING_LIMIT: usize = 5;

/// Figures for the dashboard cards on `date`.
pub async fn dashboard_summary(
    stores: BookingStores<'_>,
    date: NaiveDate,
) -> Result<DashboardSummary, AppointmentError> {
    debug!("Building dashboard summary for {}", date);

    let active_filter = AppointmentFilter {
        date: Some(date),
        statuses: AppointmentStatus::ACTIVE.to_vec(),
        ..Default::default()
    };
    let cancelled_filter = AppointmentFilter {
        date: Some(date),
        status: Some(AppointmentStatus::Cancelled),
        ..Default::default()
    };
    let upcoming_filter = AppointmentFilter {
        from_date: Some(date),
        statuses: AppointmentStatus::UPCOMING.to_vec(),
        limit: Some(UPCOMING_LIMIT),
        ..Default::default()
    };

    let (active_appointments, cancelled_appointments, total_physicians, total_patients, upcoming) = try_join!(
        stores.appointments.count(&active_filter),
        stores.appointments.count(&cancelled_filter),
        stores.physicians.count(),
        stores.patients.count(),
        stores.appointments.find(&upcoming_filter),
    )?;

    Ok(DashboardSummary {
        date,
        active_appointments,
        cancelled_appointments,
        total_physicians,
        total_patients,
        upcoming,
    })
}
