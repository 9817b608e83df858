// libs/appointment-cell/src/services/ledger.rs
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{conflicting, Appointment, AppointmentError, ConflictCheckResponse};

/// Read side of the appointment store. Reads never mutate; all writes go
/// through [`crate::services::commit::CommitService`].
pub struct AppointmentLedger {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All appointments for a professional whose interval intersects
    /// `[from, to)`. Rows without an end_time are included and resolved
    /// through the assumed-duration fallback by the pure predicate.
    pub async fn appointments_in_range(
        &self,
        professional_id: Uuid,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!(
            "Fetching appointments for professional {} between {} and {}",
            professional_id, from, to
        );

        let from_str = from.to_rfc3339();
        let to_str = to.to_rfc3339();
        let from_enc = urlencoding::encode(&from_str);
        let to_enc = urlencoding::encode(&to_str);

        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&start_time=lt.{}&or=(end_time.gt.{},end_time.is.null)&order=start_time.asc",
            professional_id, to_enc, from_enc
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments)
    }

    /// Appointments whose interval touches the given tenant-local date.
    pub async fn appointments_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        tenant_offset: FixedOffset,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .and_then(|ndt| ndt.and_local_timezone(tenant_offset).single())
            .ok_or_else(|| AppointmentError::InvalidTime(format!("Invalid date: {}", date)))?;
        let day_end = day_start + chrono::Duration::days(1);

        self.appointments_in_range(professional_id, day_start, day_end, auth_token)
            .await
    }

    /// The authoritative advisory predicate: does `[start, end)` collide
    /// with a calendar-blocking appointment of this professional? Both
    /// slot rendering and the pre-commit re-check call this; the overlap
    /// rule itself lives in [`crate::models::conflicting`].
    pub async fn has_conflict(
        &self,
        professional_id: Uuid,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        exclude_appointment_id: Option<Uuid>,
        auth_token: Option<&str>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let existing = self
            .appointments_in_range(professional_id, start, end, auth_token)
            .await?;

        let conflicts: Vec<Appointment> = conflicting(&existing, start, end, exclude_appointment_id)
            .into_iter()
            .cloned()
            .collect();

        if !conflicts.is_empty() {
            warn!(
                "Conflict detected for professional {} - {} overlapping appointments",
                professional_id,
                conflicts.len()
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict: !conflicts.is_empty(),
            conflicting_appointments: conflicts,
        })
    }
}
