// libs/booking-cell/src/handlers.rs
//
// One handler set serves both surfaces: the staff router mounts these
// behind the auth middleware, the public router mounts them bare. The
// auth header is therefore optional here; when present its token rides
// along to the store, when absent the anon key does.

use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::tenants::TenantDirectory;
use shared_models::error::AppError;

use crate::models::{BookingError, BookingSession, BookingStep, LimitResolution};
use crate::services::orchestrator::BookingOrchestrator;

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub barbershop_id: Option<Uuid>,
    /// Public flow addresses the tenant by slug instead.
    pub barbershop_slug: Option<String>,
    /// Staff-initiated sessions may skip identification entirely.
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    pub session: BookingSession,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session: BookingSession,
}

#[derive(Debug, Deserialize)]
pub struct SelectServiceRequest {
    pub session: BookingSession,
    pub service_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DateRequest {
    pub session: BookingSession,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SelectProfessionalRequest {
    pub session: BookingSession,
    pub professional_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SelectTimeRequest {
    pub session: BookingSession,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub session: BookingSession,
    /// Name for a client being created at commit time.
    pub client_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveLimitRequest {
    pub session: BookingSession,
    pub resolution: LimitResolution,
}

#[derive(Debug, Deserialize)]
pub struct BackRequest {
    pub session: BookingSession,
    pub target: BookingStep,
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::Validation(msg) => AppError::ValidationError(msg),
        BookingError::Conflict(msg) => AppError::Conflict(msg),
        BookingError::NotFound(msg) => AppError::NotFound(msg),
        BookingError::Store(msg) => AppError::Database(msg),
    }
}

fn token_of(auth: &Option<TypedHeader<Authorization<Bearer>>>) -> Option<&str> {
    auth.as_ref().map(|TypedHeader(header)| header.token())
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = token_of(&auth);
    let supabase = Arc::new(SupabaseClient::new(&state));
    let tenants = TenantDirectory::new(supabase);

    let barbershop = match (request.barbershop_id, request.barbershop_slug.as_deref()) {
        (Some(id), _) => tenants
            .get_barbershop(id, token)
            .await
            .map_err(|e| AppError::NotFound(e.to_string()))?,
        (None, Some(slug)) => tenants
            .get_barbershop_by_slug(slug, token)
            .await
            .map_err(|e| AppError::NotFound(e.to_string()))?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "barbershop_id or barbershop_slug is required".to_string(),
            ))
        }
    };

    // Starting with a known client is the staff modal's path; row-level
    // security on the client table stops anonymous callers from reading
    // someone else's history through it.
    let orchestrator = BookingOrchestrator::new(&state);
    let session = match request.client_id {
        Some(client_id) => orchestrator.start_session_for_client(barbershop.id, client_id),
        None => orchestrator.start_session(barbershop.id),
    };

    Ok(Json(json!({
        "success": true,
        "session": session,
        "barbershop": barbershop
    })))
}

#[axum::debug_handler]
pub async fn identify(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    let outcome = orchestrator
        .identify(&mut session, &request.phone, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session,
        "outcome": outcome
    })))
}

#[axum::debug_handler]
pub async fn begin_reschedule(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    let appointment = orchestrator
        .begin_reschedule(&mut session, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_existing(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    orchestrator
        .cancel_existing(&mut session, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);

    let services = orchestrator
        .list_services(&request.session, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": request.session,
        "services": services
    })))
}

#[axum::debug_handler]
pub async fn select_service(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SelectServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    orchestrator
        .select_service(&mut session, request.service_id, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn list_professionals(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<DateRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);

    let professionals = orchestrator
        .list_professionals(&request.session, request.date, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": request.session,
        "professionals": professionals
    })))
}

#[axum::debug_handler]
pub async fn select_professional(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SelectProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    orchestrator
        .select_professional(&mut session, request.professional_id, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<DateRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);

    let slots = orchestrator
        .list_slots(&request.session, request.date, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": request.session,
        "date": request.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn select_time(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<SelectTimeRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    orchestrator
        .select_time(&mut session, request.date, &request.time, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}

#[axum::debug_handler]
pub async fn confirm(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    if session.client_id.is_none() && request.client_name.is_some() {
        session.client_name = request.client_name;
    }

    let outcome = orchestrator
        .confirm(&mut session, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session,
        "outcome": outcome
    })))
}

#[axum::debug_handler]
pub async fn resolve_limit(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<ResolveLimitRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    let appointment = orchestrator
        .resolve_limit(&mut session, request.resolution, token_of(&auth))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn go_back(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BackRequest>,
) -> Result<Json<Value>, AppError> {
    let orchestrator = BookingOrchestrator::new(&state);
    let mut session = request.session;

    orchestrator
        .go_back(&mut session, request.target)
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "session": session
    })))
}
