// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Assumed length of an appointment whose service was deleted after
/// booking and whose row carries no explicit end_time.
pub const FALLBACK_SERVICE_DURATION_MINUTES: i64 = 30;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub barbershop_id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Option<Uuid>,
    pub service_id: Uuid,
    /// Tenant-local instant with explicit UTC offset.
    pub start_time: DateTime<FixedOffset>,
    /// Historical rows may lack this; see [`Appointment::end_or_assumed`].
    pub end_time: Option<DateTime<FixedOffset>>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// End of the occupied interval, assuming the fallback duration when
    /// the row predates the end_time column or its service was deleted.
    pub fn end_or_assumed(&self) -> DateTime<FixedOffset> {
        self.end_time
            .unwrap_or_else(|| self.start_time + Duration::minutes(FALLBACK_SERVICE_DURATION_MINUTES))
    }

    /// Whether this appointment occupies calendar time for conflict
    /// purposes. Completed and cancelled rows free their interval.
    pub fn blocks_calendar(&self) -> bool {
        matches!(self.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// OVERLAP RULE (single source of truth)
// ==============================================================================

/// Half-open interval intersection: `[a0, a1)` and `[b0, b1)` overlap iff
/// `a0 < b1 && b0 < a1`. A booking ending exactly when another starts is
/// not a conflict. Every conflict decision in the engine goes through
/// here; both the advisory slot listing and the authoritative commit-time
/// check delegate to [`conflicting`].
pub fn intervals_overlap(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// The calendar-blocking appointments whose intervals intersect the
/// candidate, minus the excluded one (reschedule self-exclusion).
pub fn conflicting<'a>(
    appointments: &'a [Appointment],
    candidate_start: DateTime<FixedOffset>,
    candidate_end: DateTime<FixedOffset>,
    exclude_appointment_id: Option<Uuid>,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|apt| Some(apt.id) != exclude_appointment_id)
        .filter(|apt| apt.blocks_calendar())
        .filter(|apt| {
            intervals_overlap(candidate_start, candidate_end, apt.start_time, apt.end_or_assumed())
        })
        .collect()
}

// ==============================================================================
// SERVICE CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub barbershop_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub active: bool,
    /// Present only on package services. Components are plain services;
    /// packages are never nested. Pricing and total duration of a package
    /// are captured here at composition time, not re-derived at booking.
    pub package_items: Option<Vec<PackageItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageItem {
    pub service_id: Uuid,
    pub quantity: i32,
}

impl Service {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes as i64)
    }

    pub fn is_package(&self) -> bool {
        self.package_items.as_ref().is_some_and(|items| !items.is_empty())
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Who the appointment is for: an existing client row, or name+phone the
/// commit RPC uses to create one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRef {
    Existing { client_id: Uuid },
    New { name: String, phone: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAppointmentRequest {
    pub barbershop_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub client: ClientRef,
    pub start_time: DateTime<FixedOffset>,
    /// Set on reschedule commits; the target row is mutated in place and
    /// its own interval excluded from the conflict test.
    pub reschedule_of: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
    pub cancelled_by: CancelledBy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Client,
    Staff,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Appointment conflicts with existing booking")]
    ConflictDetected,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 9, hour, min, 0)
            .unwrap()
    }

    fn appointment(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            barbershop_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            client_id: None,
            service_id: Uuid::new_v4(),
            start_time: start,
            end_time: Some(end),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn boundary_adjacent_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(9, 0), at(9, 30), at(9, 30), at(10, 0)));
        assert!(!intervals_overlap(at(9, 30), at(10, 0), at(9, 0), at(9, 30)));
        assert!(intervals_overlap(at(9, 0), at(9, 31), at(9, 30), at(10, 0)));
    }

    #[test]
    fn cancelled_appointments_free_their_interval() {
        let booked = vec![appointment(at(10, 0), at(10, 30), AppointmentStatus::Cancelled)];
        assert!(conflicting(&booked, at(10, 0), at(10, 30), None).is_empty());
    }

    #[test]
    fn exclusion_ignores_the_appointment_being_rescheduled() {
        let own = appointment(at(14, 0), at(14, 30), AppointmentStatus::Confirmed);
        let own_id = own.id;
        let booked = vec![own];

        assert_eq!(conflicting(&booked, at(14, 0), at(14, 30), None).len(), 1);
        assert!(conflicting(&booked, at(14, 0), at(14, 30), Some(own_id)).is_empty());
    }

    #[test]
    fn missing_end_time_assumes_fallback_duration() {
        let mut apt = appointment(at(10, 0), at(10, 0), AppointmentStatus::Confirmed);
        apt.end_time = None;
        assert_eq!(apt.end_or_assumed(), at(10, 30));
    }
}
