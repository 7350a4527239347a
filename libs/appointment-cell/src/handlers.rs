use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{JsonBody, PathParam, QueryParams};
use shared_utils::validation::missing_fields_message;

use crate::models::{
    AppointmentError, AppointmentFilter, AvailabilityQuery, AvailableSlotsQuery,
    CreateAppointmentRequest, SummaryQuery, UpdateAppointmentRequest,
};
use crate::router::AppointmentState;
use crate::services::{availability, booking, summary};

// ==============================================================================
// APPOINTMENT CRUD
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    QueryParams(filter): QueryParams<AppointmentFilter>,
) -> Result<Json<Value>, AppError> {
    let appointments = booking::find_by_filters(state.appointments.as_ref(), &filter).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    PathParam(appointment_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking::find_by_id(state.appointments.as_ref(), appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = booking::create_appointment(state.stores(), request, &user).await?;
    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    PathParam(appointment_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment =
        booking::update_appointment(state.stores(), appointment_id, request, &user).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    PathParam(appointment_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    booking::delete_appointment(state.appointments.as_ref(), appointment_id, &user).await?;

    Ok(Json(json!({
        "message": "Appointment deleted successfully"
    })))
}

// ==============================================================================
// SCHEDULING QUERIES
// ==============================================================================

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    QueryParams(query): QueryParams<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let (physician_id, date, raw_time) = match (query.physician_id, query.date, query.time) {
        (Some(physician_id), Some(date), Some(time)) => (physician_id, date, time),
        (physician_id, date, time) => {
            let message = missing_fields_message(&[
                ("physician_id", physician_id.is_some()),
                ("date", date.is_some()),
                ("time", time.is_some()),
            ]);
            return Err(AppointmentError::Validation(message.unwrap_or_default()).into());
        }
    };
    let time = booking::parse_time(&raw_time)?;

    let available =
        availability::is_available(state.appointments.as_ref(), physician_id, date, time).await?;

    Ok(Json(json!({
        "physician_id": physician_id,
        "date": date,
        "time": time,
        "available": available
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    QueryParams(query): QueryParams<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = booking::available_slots(
        state.stores(),
        query.physician_id,
        query.date,
        query.exclude_appointment_id,
    )
    .await?;

    Ok(Json(json!({
        "physician_id": query.physician_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dashboard_summary(
    State(state): State<AppointmentState>,
    Extension(_user): Extension<User>,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let summary = summary::dashboard_summary(state.stores(), date).await?;
    Ok(Json(json!(summary)))
}
