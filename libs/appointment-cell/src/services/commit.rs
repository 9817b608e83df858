// libs/appointment-cell/src/services/commit.rs
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::supabase::{is_conflict_error, SupabaseClient};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CancelAppointmentRequest, ClientRef,
    CommitAppointmentRequest,
};
use crate::services::catalog::ServiceCatalog;
use crate::services::ledger::AppointmentLedger;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Write side of the appointment store. Creation and reschedule go
/// through Postgres RPCs that re-run the overlap check and write the row
/// in one transaction, so two near-simultaneous commits for overlapping
/// intervals cannot both succeed. The pre-checks here are advisory; the
/// RPC is the authority.
pub struct CommitService {
    supabase: Arc<SupabaseClient>,
    ledger: AppointmentLedger,
    catalog: ServiceCatalog,
    lifecycle: AppointmentLifecycleService,
}

impl CommitService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        let ledger = AppointmentLedger::new(Arc::clone(&supabase));
        let catalog = ServiceCatalog::new(Arc::clone(&supabase));
        Self {
            supabase,
            ledger,
            catalog,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Create a new appointment (status `pending`) or, when
    /// `reschedule_of` is set, move that existing row in place. Returns
    /// the committed row.
    pub async fn commit(
        &self,
        request: CommitAppointmentRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        if let Some(appointment_id) = request.reschedule_of {
            return self.reschedule(appointment_id, request.start_time, auth_token).await;
        }

        if request.start_time < Utc::now() {
            return Err(AppointmentError::InvalidTime(
                "Appointment start time is in the past".to_string(),
            ));
        }

        let service = self.catalog.get_service(request.service_id, auth_token).await?;
        let end_time = request.start_time + service.duration();

        // Advisory re-check before touching the store; the RPC repeats it
        // atomically and remains the authority under races.
        let conflict_check = self
            .ledger
            .has_conflict(request.professional_id, request.start_time, end_time, None, auth_token)
            .await?;

        if conflict_check.has_conflict {
            warn!(
                "Pre-commit conflict for professional {} at {}",
                request.professional_id, request.start_time
            );
            return Err(AppointmentError::ConflictDetected);
        }

        self.create_pending(&request, end_time, auth_token).await
    }

    /// Move an existing appointment to a new start, excluding its own
    /// interval from the conflict test. The row is mutated, not
    /// duplicated. When the booked service no longer exists the current
    /// interval length is preserved.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_start: DateTime<FixedOffset>,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {} to {}", appointment_id, new_start);

        if new_start < Utc::now() {
            return Err(AppointmentError::InvalidTime(
                "Rescheduled time must be in the future".to_string(),
            ));
        }

        let current = self.get_appointment(appointment_id, auth_token).await?;
        if !current.blocks_calendar() {
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        let duration = match self.catalog.get_service(current.service_id, auth_token).await {
            Ok(service) => service.duration(),
            Err(AppointmentError::ServiceNotFound) => current.end_or_assumed() - current.start_time,
            Err(e) => return Err(e),
        };
        let new_end = new_start + duration;

        let conflict_check = self
            .ledger
            .has_conflict(
                current.professional_id,
                new_start,
                new_end,
                Some(appointment_id),
                auth_token,
            )
            .await?;

        if conflict_check.has_conflict {
            return Err(AppointmentError::ConflictDetected);
        }

        self.reschedule_in_place(appointment_id, new_start, new_end, auth_token)
            .await
    }

    /// Cancel an appointment, freeing its interval. Plain status change;
    /// no interval contention, so no RPC needed.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle
            .validate_status_transition(&current.status, &AppointmentStatus::Cancelled)?;

        let update_data = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "cancellation_reason": format!("Cancelled by {:?}: {}", request.cancelled_by, request.reason),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, auth_token, Some(update_data), Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let cancelled = result
            .first()
            .ok_or(AppointmentError::NotFound)
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
            })?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(cancelled)
    }

    /// Confirm a pending appointment.
    pub async fn confirm(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle
            .validate_status_transition(&current.status, &AppointmentStatus::Confirmed)?;

        let update_data = json!({
            "status": AppointmentStatus::Confirmed.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, auth_token, Some(update_data), Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .first()
            .ok_or(AppointmentError::NotFound)
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
            })
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn create_pending(
        &self,
        request: &CommitAppointmentRequest,
        end_time: DateTime<FixedOffset>,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let mut args = json!({
            "p_barbershop_id": request.barbershop_id,
            "p_professional_id": request.professional_id,
            "p_service_id": request.service_id,
            "p_start_time": request.start_time.to_rfc3339(),
            "p_end_time": end_time.to_rfc3339(),
        });

        match &request.client {
            ClientRef::Existing { client_id } => {
                args["p_client_id"] = json!(client_id);
            }
            ClientRef::New { name, phone } => {
                args["p_client_name"] = json!(name);
                args["p_client_phone"] = json!(phone);
            }
        }

        let row: Value = self
            .supabase
            .rpc("commit_appointment", auth_token, args)
            .await
            .map_err(map_commit_error)?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e)))?;

        info!(
            "Appointment {} committed for professional {} at {}",
            appointment.id, appointment.professional_id, appointment.start_time
        );
        Ok(appointment)
    }

    async fn reschedule_in_place(
        &self,
        appointment_id: Uuid,
        new_start: DateTime<FixedOffset>,
        new_end: DateTime<FixedOffset>,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let args = json!({
            "p_appointment_id": appointment_id,
            "p_start_time": new_start.to_rfc3339(),
            "p_end_time": new_end.to_rfc3339(),
        });

        let row: Value = self
            .supabase
            .rpc("reschedule_appointment", auth_token, args)
            .await
            .map_err(map_commit_error)?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse rescheduled appointment: {}", e)))?;

        info!("Appointment {} moved to {}", appointment.id, appointment.start_time);
        Ok(appointment)
    }
}

fn map_commit_error(err: anyhow::Error) -> AppointmentError {
    if is_conflict_error(&err) {
        AppointmentError::ConflictDetected
    } else {
        AppointmentError::DatabaseError(err.to_string())
    }
}
