// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use appointment_cell::services::catalog::ServiceCatalog;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::tenants::TenantDirectory;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateOverrideRequest, ScheduleError, SlotPolicy, UpsertScheduleDayRequest};
use crate::services::schedule::ScheduleService;
use crate::services::slots::AvailabilityService;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub barbershop_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<Uuid>,
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::ProfessionalNotFound => AppError::NotFound("Professional not found".to_string()),
        ScheduleError::InvalidSchedule(msg) => AppError::ValidationError(msg),
        ScheduleError::InvalidDate(msg) => AppError::BadRequest(msg),
        ScheduleError::OverrideExists => {
            AppError::BadRequest("Override already exists for this date".to_string())
        }
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_week(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedule = ScheduleService::new(Arc::new(SupabaseClient::new(&state)));

    let week = schedule
        .get_week(professional_id, Some(auth.token()))
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "week": week
    })))
}

#[axum::debug_handler]
pub async fn upsert_day(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertScheduleDayRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_staff() {
        return Err(AppError::Auth("Only staff can edit schedules".to_string()));
    }

    let schedule = ScheduleService::new(Arc::new(SupabaseClient::new(&state)));

    let day = schedule
        .upsert_day(professional_id, request, Some(auth.token()))
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "day": day
    })))
}

#[axum::debug_handler]
pub async fn create_override(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateOverrideRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_staff() {
        return Err(AppError::Auth("Only staff can edit schedules".to_string()));
    }

    let schedule = ScheduleService::new(Arc::new(SupabaseClient::new(&state)));

    let override_entry = schedule
        .create_override(professional_id, request, Some(auth.token()))
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "override": override_entry
    })))
}

#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let token = auth.token();

    let tenants = TenantDirectory::new(Arc::clone(&supabase));
    let barbershop = tenants
        .get_barbershop(query.barbershop_id, Some(token))
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let catalog = ServiceCatalog::new(Arc::clone(&supabase));
    let service = catalog
        .get_service(query.service_id, Some(token))
        .await
        .map_err(|_| AppError::NotFound("Service not found".to_string()))?;

    let policy = SlotPolicy {
        step_minutes: barbershop.slot_step_or(state.slot_step_minutes),
    };

    let availability = AvailabilityService::new(supabase);
    let slots = availability
        .available_slots(
            query.professional_id,
            query.date,
            service.duration_minutes as i64,
            policy,
            barbershop.utc_offset(),
            query.exclude_appointment_id,
            Some(token),
        )
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "slots": slots
    })))
}
