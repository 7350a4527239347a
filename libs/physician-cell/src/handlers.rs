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

use crate::models::{CreatePhysicianRequest, PhysicianSearchQuery, UpdatePhysicianRequest};
use crate::router::PhysicianState;
use crate::services::physician;

#[axum::debug_handler]
pub async fn list_physicians(
    State(state): State<PhysicianState>,
    Extension(_user): Extension<User>,
    QueryParams(query): QueryParams<PhysicianSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let physicians = physician::list_physicians(state.store.as_ref(), query.search.as_deref()).await?;

    Ok(Json(json!({
        "physicians": physicians,
        "total": physicians.len()
    })))
}

#[axum::debug_handler]
pub async fn get_physician(
    State(state): State<PhysicianState>,
    Extension(_user): Extension<User>,
    PathParam(physician_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let physician = physician::get_physician(state.store.as_ref(), physician_id).await?;
    Ok(Json(json!(physician)))
}

#[axum::debug_handler]
pub async fn create_physician(
    State(state): State<PhysicianState>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<CreatePhysicianRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let physician = physician::create_physician(state.store.as_ref(), request, &user).await?;
    Ok((StatusCode::CREATED, Json(json!(physician))))
}

#[axum::debug_handler]
pub async fn update_physician(
    State(state): State<PhysicianState>,
    Extension(user): Extension<User>,
    PathParam(physician_id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdatePhysicianRequest>,
) -> Result<Json<Value>, AppError> {
    let physician =
        physician::update_physician(state.store.as_ref(), physician_id, request, &user).await?;
    Ok(Json(json!(physician)))
}

#[axum::debug_handler]
pub async fn delete_physician(
    State(state): State<PhysicianState>,
    Extension(user): Extension<User>,
    PathParam(physician_id): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    physician::delete_physician(state.store.as_ref(), physician_id, &user).await?;

    Ok(Json(json!({
        "message": "Physician deleted successfully"
    })))
}
