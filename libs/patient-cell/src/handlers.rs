use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{JsonBody, PathParam, QueryParams};

use crate::models::{CreatePatientRequest, PatientSearchQuery, UpdatePatientRequest};
use crate::router::PatientState;
use crate::services::patient;

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<PatientState>,
    Extension(_user): Extension<User>,
    QueryParams(query): QueryParams<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = patient::list_patients(state.store.as_ref(), query.search.as_deref()).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<PatientState>,
    Extension(_user): Extension<User>,
    PathParam(patient_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = patient::get_patient(state.store.as_ref(), patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<PatientState>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = patient::create_patient(state.store.as_ref(), request, &user).await?;
    Ok((StatusCode::CREATED, Json(json!(patient))))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<PatientState>,
    Extension(user): Extension<User>,
    PathParam(patient_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = patient::update_patient(state.store.as_ref(), patient_id, request, &user).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<PatientState>,
    Extension(user): Extension<User>,
    PathParam(patient_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    patient::delete_patient(state.store.as_ref(), patient_id, &user).await?;

    Ok(Json(json!({
        "message": "Patient deleted successfully"
    })))
}
