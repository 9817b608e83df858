// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{DateTime, FixedOffset};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, CancelAppointmentRequest, CommitAppointmentRequest};
use crate::services::commit::CommitService;
use crate::services::ledger::AppointmentLedger;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentRangeQuery {
    pub professional_id: Uuid,
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub professional_id: Uuid,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleBody {
    pub new_start_time: DateTime<FixedOffset>,
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        AppointmentError::ConflictDetected => {
            AppError::Conflict("Appointment slot is no longer available".to_string())
        }
        AppointmentError::InvalidTime(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Appointment cannot be modified in status {}", status))
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<AppointmentRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let ledger = AppointmentLedger::new(Arc::new(SupabaseClient::new(&state)));

    let appointments = ledger
        .appointments_in_range(query.professional_id, query.from, query.to, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let ledger = AppointmentLedger::new(Arc::new(SupabaseClient::new(&state)));

    let response = ledger
        .has_conflict(
            query.professional_id,
            query.start_time,
            query.end_time,
            query.exclude_appointment_id,
            Some(auth.token()),
        )
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "conflict_check": response
    })))
}

#[axum::debug_handler]
pub async fn commit_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CommitAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if user.barbershop_id.as_deref() != Some(request.barbershop_id.to_string().as_str()) {
        return Err(AppError::Auth("Token is not scoped to this barbershop".to_string()));
    }

    let commit_service = CommitService::new(Arc::new(SupabaseClient::new(&state)));

    let appointment = commit_service
        .commit(request, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment committed"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let commit_service = CommitService::new(Arc::new(SupabaseClient::new(&state)));

    let appointment = commit_service
        .get_appointment(appointment_id, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<Value>, AppError> {
    let commit_service = CommitService::new(Arc::new(SupabaseClient::new(&state)));

    let appointment = commit_service
        .reschedule(appointment_id, body.new_start_time, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let commit_service = CommitService::new(Arc::new(SupabaseClient::new(&state)));

    let appointment = commit_service
        .cancel(appointment_id, request, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let commit_service = CommitService::new(Arc::new(SupabaseClient::new(&state)));

    let appointment = commit_service
        .confirm(appointment_id, Some(auth.token()))
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment confirmed"
    })))
}
