// libs/booking-cell/src/models.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use schedule_cell::models::Professional;
use subscription_cell::models::Credit;

// ==============================================================================
// WIZARD STATE
// ==============================================================================

/// Steps of the booking wizard, in order. `Committed` and `LimitPrompt`
/// are terminal-ish: `LimitPrompt` still needs an explicit operator
/// decision before the session is done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    IdentifyClient,
    SelectService,
    SelectProfessional,
    SelectTime,
    Confirm,
    Committed,
    LimitPrompt,
}

impl BookingStep {
    /// Position in the linear flow; used for backward navigation.
    pub fn index(&self) -> u8 {
        match self {
            BookingStep::IdentifyClient => 0,
            BookingStep::SelectService => 1,
            BookingStep::SelectProfessional => 2,
            BookingStep::SelectTime => 3,
            BookingStep::Confirm => 4,
            BookingStep::Committed => 5,
            BookingStep::LimitPrompt => 5,
        }
    }
}

/// The whole wizard state, round-tripped by the caller between step
/// endpoints. Everything captured at or after a step is cleared when the
/// user navigates back past it: selections made under an old service or
/// professional are only valid for that choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSession {
    pub barbershop_id: Uuid,
    pub step: BookingStep,

    // IDENTIFY_CLIENT
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    /// Upcoming appointment surfaced during identification; blocks the
    /// flow until the caller reschedules or cancels it.
    pub existing_appointment_id: Option<Uuid>,
    /// Set when this session moves an existing appointment instead of
    /// creating one.
    pub reschedule_of: Option<Uuid>,

    // SELECT_SERVICE
    pub service_id: Option<Uuid>,
    pub service_duration_minutes: Option<i64>,

    // SELECT_PROFESSIONAL
    pub professional_id: Option<Uuid>,

    // SELECT_TIME
    pub slot_start: Option<DateTime<FixedOffset>>,

    // COMMIT / LIMIT_PROMPT
    pub pending_appointment_id: Option<Uuid>,
}

impl BookingSession {
    /// Fresh public-flow session: the caller must identify first.
    pub fn new(barbershop_id: Uuid) -> Self {
        Self {
            barbershop_id,
            step: BookingStep::IdentifyClient,
            client_id: None,
            client_name: None,
            client_phone: None,
            existing_appointment_id: None,
            reschedule_of: None,
            service_id: None,
            service_duration_minutes: None,
            professional_id: None,
            slot_start: None,
            pending_appointment_id: None,
        }
    }

    /// Staff-initiated session for an already known client; the identify
    /// step is skipped entirely.
    pub fn for_known_client(barbershop_id: Uuid, client_id: Uuid) -> Self {
        let mut session = Self::new(barbershop_id);
        session.client_id = Some(client_id);
        session.step = BookingStep::SelectService;
        session
    }

    /// Rewind to `target`, dropping all state captured at or after it.
    pub fn clear_from(&mut self, target: BookingStep) {
        if target.index() <= BookingStep::Confirm.index() {
            self.pending_appointment_id = None;
        }
        if target.index() <= BookingStep::SelectTime.index() {
            self.slot_start = None;
        }
        if target.index() <= BookingStep::SelectProfessional.index() {
            self.professional_id = None;
        }
        if target.index() <= BookingStep::SelectService.index() {
            self.service_id = None;
            self.service_duration_minutes = None;
        }
        if target.index() <= BookingStep::IdentifyClient.index() {
            self.client_id = None;
            self.client_name = None;
            self.client_phone = None;
            self.existing_appointment_id = None;
            self.reschedule_of = None;
        }
        self.step = target;
    }

    pub fn has_full_tuple(&self) -> bool {
        self.service_id.is_some() && self.professional_id.is_some() && self.slot_start.is_some()
    }
}

// ==============================================================================
// STEP RESULTS
// ==============================================================================

/// Outcome of the identify step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyOutcome {
    /// Phone unknown (or lookup degraded); flow continues as new client.
    NewClient,
    KnownClient {
        client_name: String,
    },
    /// The client already holds an upcoming appointment; the flow
    /// branches to reschedule-or-cancel instead of proceeding.
    ActiveAppointmentFound {
        client_name: String,
        appointment: Appointment,
    },
}

/// Service list entry, annotated with the session client's credit so the
/// picker can flag "included in plan" and exhausted limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOption {
    pub service: appointment_cell::models::Service,
    pub credit: Option<Credit>,
    pub included_in_plan: bool,
}

/// Professional picker entry. `working_today` is a schedule-template
/// annotation only; slots are not generated until one is chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalOption {
    pub professional: Professional,
    pub working_today: bool,
}

/// Result of the commit. `AwaitingLimitDecision` is not a failure: the
/// appointment row already exists, only the usage-recording decision is
/// deferred to an explicit operator choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Booked {
        appointment: Appointment,
        covered_by_plan: bool,
    },
    AwaitingLimitDecision {
        appointment: Appointment,
        credit: Credit,
    },
}

/// The two ways out of `LimitPrompt`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitResolution {
    /// Charge the service normally; no credit consumed.
    ChargeSeparately,
    /// Record usage past the cap; an explicit business decision.
    OverrideLimit,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Commit-time overlap; the session has been returned to time
    /// selection and the caller should refresh the slot listing.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}
