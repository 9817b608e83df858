// libs/booking-cell/src/services/orchestrator.rs
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, CancelAppointmentRequest, CancelledBy, ClientRef,
    CommitAppointmentRequest,
};
use appointment_cell::services::catalog::ServiceCatalog;
use appointment_cell::services::commit::CommitService;
use appointment_cell::services::ledger::AppointmentLedger;
use client_cell::models::{normalize_phone, MIN_PHONE_DIGITS};
use client_cell::services::resolver::ClientResolverService;
use schedule_cell::models::{ScheduleError, SlotPolicy, TimeSlot};
use schedule_cell::services::professionals::ProfessionalService;
use schedule_cell::services::slots::AvailabilityService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::tenants::TenantDirectory;
use shared_models::tenant::Barbershop;
use subscription_cell::models::{decide_for_service, CreditDecision, CreditError};
use subscription_cell::services::credits::CreditLedger;

use crate::events::{BookingEvents, LogBookingEvents};
use crate::models::{
    BookingError, BookingSession, BookingStep, CommitOutcome, IdentifyOutcome, LimitResolution,
    ProfessionalOption, ServiceOption,
};

/// Drives the booking wizard: identification, selection steps, the
/// mandatory pre-commit re-check and the credit policy. The session value
/// is owned by the caller; every method validates the step it mutates, so
/// a stale or tampered session fails loudly instead of booking nonsense.
///
/// Both the staff modal and the public flow run through this same type;
/// the only difference is who supplies the client.
pub struct BookingOrchestrator {
    tenants: TenantDirectory,
    resolver: ClientResolverService,
    catalog: ServiceCatalog,
    professionals: ProfessionalService,
    availability: AvailabilityService,
    ledger: AppointmentLedger,
    commit_service: CommitService,
    credits: CreditLedger,
    events: Arc<dyn BookingEvents>,
    default_slot_step_minutes: i64,
}

impl BookingOrchestrator {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_events(config, Arc::new(LogBookingEvents))
    }

    pub fn with_events(config: &AppConfig, events: Arc<dyn BookingEvents>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            tenants: TenantDirectory::new(Arc::clone(&supabase)),
            resolver: ClientResolverService::new(Arc::clone(&supabase)),
            catalog: ServiceCatalog::new(Arc::clone(&supabase)),
            professionals: ProfessionalService::new(Arc::clone(&supabase)),
            availability: AvailabilityService::new(Arc::clone(&supabase)),
            ledger: AppointmentLedger::new(Arc::clone(&supabase)),
            commit_service: CommitService::new(Arc::clone(&supabase)),
            credits: CreditLedger::new(supabase),
            events,
            default_slot_step_minutes: config.slot_step_minutes,
        }
    }

    // ==============================================================================
    // SESSION LIFECYCLE
    // ==============================================================================

    pub fn start_session(&self, barbershop_id: Uuid) -> BookingSession {
        BookingSession::new(barbershop_id)
    }

    pub fn start_session_for_client(&self, barbershop_id: Uuid, client_id: Uuid) -> BookingSession {
        BookingSession::for_known_client(barbershop_id, client_id)
    }

    /// Backward navigation. Everything captured at or after the target
    /// step is dropped; forward jumps and post-commit rewinds are
    /// rejected.
    pub fn go_back(
        &self,
        session: &mut BookingSession,
        target: BookingStep,
    ) -> Result<(), BookingError> {
        if matches!(session.step, BookingStep::Committed | BookingStep::LimitPrompt) {
            return Err(BookingError::Validation(
                "Cannot navigate back after commit".to_string(),
            ));
        }
        if target.index() > BookingStep::Confirm.index() || target.index() >= session.step.index() {
            return Err(BookingError::Validation(
                "Can only navigate to an earlier step".to_string(),
            ));
        }

        session.clear_from(target);
        Ok(())
    }

    // ==============================================================================
    // IDENTIFY_CLIENT
    // ==============================================================================

    /// Resolve the caller's phone. A known client moves the flow on; a
    /// client with an upcoming appointment is held at this step until the
    /// caller reschedules or cancels it; an unknown phone (or a degraded
    /// lookup) continues as a new client.
    pub async fn identify(
        &self,
        session: &mut BookingSession,
        phone: &str,
        auth_token: Option<&str>,
    ) -> Result<IdentifyOutcome, BookingError> {
        self.require_step(session, BookingStep::IdentifyClient)?;

        let normalized = normalize_phone(phone);
        if normalized.len() < MIN_PHONE_DIGITS {
            return Err(BookingError::Validation(format!(
                "Phone must have at least {} digits",
                MIN_PHONE_DIGITS
            )));
        }

        let barbershop = self.tenant(session, auth_token).await?;
        let resolution = self
            .resolver
            .resolve(session.barbershop_id, &normalized, barbershop.utc_offset(), auth_token)
            .await;

        session.client_phone = Some(normalized);

        let Some(client) = resolution.client else {
            debug!("Phone not on file; continuing as new client");
            session.step = BookingStep::SelectService;
            return Ok(IdentifyOutcome::NewClient);
        };

        session.client_id = Some(client.id);
        session.client_name = Some(client.name.clone());

        if let Some(appointment) = resolution.active_appointment {
            info!(
                "Client {} already holds appointment {}; offering reschedule-or-cancel",
                client.id, appointment.id
            );
            session.existing_appointment_id = Some(appointment.id);
            return Ok(IdentifyOutcome::ActiveAppointmentFound {
                client_name: client.name,
                appointment,
            });
        }

        session.step = BookingStep::SelectService;
        Ok(IdentifyOutcome::KnownClient { client_name: client.name })
    }

    /// Branch taken from `ActiveAppointmentFound`: keep the appointment
    /// but move it. Service and professional carry over from the existing
    /// row; the flow jumps straight to time selection with the row's own
    /// interval excluded from conflict tests.
    pub async fn begin_reschedule(
        &self,
        session: &mut BookingSession,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let appointment_id = session.existing_appointment_id.ok_or_else(|| {
            BookingError::Validation("No existing appointment to reschedule".to_string())
        })?;

        let appointment = self
            .commit_service
            .get_appointment(appointment_id, auth_token)
            .await
            .map_err(map_appointment_error)?;

        let duration_minutes = match self.catalog.get_service(appointment.service_id, auth_token).await {
            Ok(service) => service.duration_minutes as i64,
            Err(AppointmentError::ServiceNotFound) => {
                (appointment.end_or_assumed() - appointment.start_time).num_minutes()
            }
            Err(e) => return Err(map_appointment_error(e)),
        };

        session.reschedule_of = Some(appointment.id);
        session.service_id = Some(appointment.service_id);
        session.service_duration_minutes = Some(duration_minutes);
        session.professional_id = Some(appointment.professional_id);
        session.slot_start = None;
        session.step = BookingStep::SelectTime;

        Ok(appointment)
    }

    /// The other branch: drop the existing appointment and start over
    /// with service selection.
    pub async fn cancel_existing(
        &self,
        session: &mut BookingSession,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        let appointment_id = session.existing_appointment_id.ok_or_else(|| {
            BookingError::Validation("No existing appointment to cancel".to_string())
        })?;

        self.commit_service
            .cancel(
                appointment_id,
                CancelAppointmentRequest {
                    reason: "Client chose to rebook".to_string(),
                    cancelled_by: CancelledBy::Client,
                },
                auth_token,
            )
            .await
            .map_err(map_appointment_error)?;

        session.existing_appointment_id = None;
        session.step = BookingStep::SelectService;
        Ok(())
    }

    // ==============================================================================
    // SELECT_SERVICE
    // ==============================================================================

    /// Services annotated with the session client's credits. The catalog
    /// and the credit derivation are independent reads and run
    /// concurrently.
    pub async fn list_services(
        &self,
        session: &BookingSession,
        auth_token: Option<&str>,
    ) -> Result<Vec<ServiceOption>, BookingError> {
        self.require_at_least(session, BookingStep::SelectService)?;

        let barbershop = self.tenant(session, auth_token).await?;
        let today = Utc::now().with_timezone(&barbershop.utc_offset()).date_naive();

        let (services, credits) = tokio::join!(
            self.catalog.list_services(session.barbershop_id, auth_token),
            async {
                match session.client_id {
                    Some(client_id) => {
                        self.credits
                            .compute_credits(
                                client_id,
                                session.barbershop_id,
                                today,
                                barbershop.utc_offset(),
                                auth_token,
                            )
                            .await
                    }
                    None => Ok(vec![]),
                }
            }
        );

        let services = services.map_err(map_appointment_error)?;
        // Credit annotation is advisory at this step; a degraded
        // derivation lists everything at normal price.
        let credits = credits.unwrap_or_else(|e| {
            warn!("Credit annotation degraded: {}", e);
            vec![]
        });

        Ok(services
            .into_iter()
            .map(|service| {
                let credit = credits.iter().find(|c| c.service_id == service.id).cloned();
                let included_in_plan = credit.is_some();
                ServiceOption {
                    service,
                    credit,
                    included_in_plan,
                }
            })
            .collect())
    }

    /// Locks in a service. Any previously chosen professional or slot was
    /// conditioned on the old service's duration and capability set, so
    /// both are dropped.
    pub async fn select_service(
        &self,
        session: &mut BookingSession,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        self.require_at_least(session, BookingStep::SelectService)?;

        let service = self
            .catalog
            .get_service(service_id, auth_token)
            .await
            .map_err(map_appointment_error)?;

        if service.barbershop_id != session.barbershop_id || !service.active {
            return Err(BookingError::Validation(
                "Service is not offered by this barbershop".to_string(),
            ));
        }

        session.clear_from(BookingStep::SelectService);
        session.service_id = Some(service.id);
        session.service_duration_minutes = Some(service.duration_minutes as i64);
        session.step = BookingStep::SelectProfessional;
        Ok(())
    }

    // ==============================================================================
    // SELECT_PROFESSIONAL
    // ==============================================================================

    /// Professionals qualified for the selected service, each annotated
    /// with a schedule-template check for the requested date. No slots
    /// are generated yet.
    pub async fn list_professionals(
        &self,
        session: &BookingSession,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<ProfessionalOption>, BookingError> {
        let service_id = session
            .service_id
            .ok_or_else(|| BookingError::Validation("Select a service first".to_string()))?;

        let qualified = self
            .professionals
            .qualified_for_service(session.barbershop_id, service_id, auth_token)
            .await
            .map_err(map_schedule_error)?;

        let annotated = futures::future::join_all(qualified.into_iter().map(|professional| async move {
            let working_today = match self
                .professionals
                .is_working_on(professional.id, date, auth_token)
                .await
            {
                Ok(working) => working,
                Err(e) => {
                    warn!("Working-day annotation degraded for {}: {}", professional.id, e);
                    false
                }
            };
            ProfessionalOption {
                professional,
                working_today,
            }
        }))
        .await;

        Ok(annotated)
    }

    pub async fn select_professional(
        &self,
        session: &mut BookingSession,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        self.require_at_least(session, BookingStep::SelectProfessional)?;
        let service_id = session
            .service_id
            .ok_or_else(|| BookingError::Validation("Select a service first".to_string()))?;

        let qualified = self
            .professionals
            .qualified_for_service(session.barbershop_id, service_id, auth_token)
            .await
            .map_err(map_schedule_error)?;

        if !qualified.iter().any(|p| p.id == professional_id) {
            return Err(BookingError::Validation(
                "Professional is not qualified for the selected service".to_string(),
            ));
        }

        session.clear_from(BookingStep::SelectProfessional);
        session.professional_id = Some(professional_id);
        session.step = BookingStep::SelectTime;
        Ok(())
    }

    // ==============================================================================
    // SELECT_TIME
    // ==============================================================================

    /// Full slot listing for a date, unavailable entries included. On a
    /// reschedule the session's own appointment is excluded from the
    /// conflict test.
    pub async fn list_slots(
        &self,
        session: &BookingSession,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let (professional_id, duration_minutes) = self.slot_inputs(session)?;
        let barbershop = self.tenant(session, auth_token).await?;

        self.availability
            .available_slots(
                professional_id,
                date,
                duration_minutes,
                self.slot_policy(&barbershop),
                barbershop.utc_offset(),
                session.reschedule_of,
                auth_token,
            )
            .await
            .map_err(map_schedule_error)
    }

    /// Picks a slot by its "HH:MM" label. The listing is regenerated
    /// first, so picking a slot that has meanwhile become unavailable is
    /// rejected with its reason.
    pub async fn select_time(
        &self,
        session: &mut BookingSession,
        date: NaiveDate,
        time: &str,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        self.require_at_least(session, BookingStep::SelectTime)?;
        self.slot_inputs(session)?;

        let parsed = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| BookingError::Validation(format!("Invalid time: {}", time)))?;

        let slots = self.list_slots(session, date, auth_token).await?;
        let slot = slots
            .iter()
            .find(|s| s.time == time)
            .ok_or_else(|| BookingError::Validation(format!("Slot {} is not offered on {}", time, date)))?;

        if !slot.available {
            let reason = slot
                .reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unavailable".to_string());
            return Err(BookingError::Validation(format!(
                "Slot {} is unavailable: {}",
                time, reason
            )));
        }

        let barbershop = self.tenant(session, auth_token).await?;
        let slot_start = date
            .and_time(parsed)
            .and_local_timezone(barbershop.utc_offset())
            .single()
            .ok_or_else(|| BookingError::Validation(format!("Invalid local time: {} {}", date, time)))?;

        session.slot_start = Some(slot_start);
        session.step = BookingStep::Confirm;
        Ok(())
    }

    // ==============================================================================
    // CONFIRM / COMMIT
    // ==============================================================================

    /// Re-validates the full tuple against the ledger and commits. The
    /// re-check is mandatory: the slot listing was a snapshot and another
    /// session may have taken the interval since. A conflict, here or
    /// from the atomic store commit, returns the session to time
    /// selection; the caller refreshes the listing rather than retrying
    /// blindly.
    pub async fn confirm(
        &self,
        session: &mut BookingSession,
        auth_token: Option<&str>,
    ) -> Result<CommitOutcome, BookingError> {
        self.require_step(session, BookingStep::Confirm)?;
        if !session.has_full_tuple() {
            return Err(BookingError::Validation(
                "Session is missing a service, professional or time".to_string(),
            ));
        }

        let (professional_id, duration_minutes) = self.slot_inputs(session)?;
        let service_id = session
            .service_id
            .ok_or_else(|| BookingError::Validation("Select a service first".to_string()))?;
        let start = session
            .slot_start
            .ok_or_else(|| BookingError::Validation("Select a time first".to_string()))?;
        let end = start + Duration::minutes(duration_minutes);

        let check = self
            .ledger
            .has_conflict(professional_id, start, end, session.reschedule_of, auth_token)
            .await
            .map_err(map_appointment_error)?;

        if check.has_conflict {
            session.clear_from(BookingStep::SelectTime);
            return Err(BookingError::Conflict(
                "The selected time was just taken; choose another slot".to_string(),
            ));
        }

        let request = CommitAppointmentRequest {
            barbershop_id: session.barbershop_id,
            professional_id,
            service_id,
            client: self.client_ref(session)?,
            start_time: start,
            reschedule_of: session.reschedule_of,
        };

        let is_reschedule = session.reschedule_of.is_some();
        let appointment = match self.commit_service.commit(request, auth_token).await {
            Ok(appointment) => appointment,
            Err(AppointmentError::ConflictDetected) => {
                session.clear_from(BookingStep::SelectTime);
                return Err(BookingError::Conflict(
                    "The selected time was just taken; choose another slot".to_string(),
                ));
            }
            Err(e) => return Err(map_appointment_error(e)),
        };

        if is_reschedule {
            self.events.appointment_rescheduled(&appointment);
            session.step = BookingStep::Committed;
            return Ok(CommitOutcome::Booked {
                appointment,
                covered_by_plan: false,
            });
        }

        self.events.appointment_created(&appointment);
        self.apply_credit_policy(session, service_id, appointment, auth_token)
            .await
    }

    /// Operator decision out of `LimitPrompt`. The appointment itself was
    /// never in question; only whether a usage record is appended.
    pub async fn resolve_limit(
        &self,
        session: &mut BookingSession,
        resolution: LimitResolution,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        self.require_step(session, BookingStep::LimitPrompt)?;
        let appointment_id = session.pending_appointment_id.ok_or_else(|| {
            BookingError::Validation("No appointment awaiting a limit decision".to_string())
        })?;

        let appointment = self
            .commit_service
            .get_appointment(appointment_id, auth_token)
            .await
            .map_err(map_appointment_error)?;

        if resolution == LimitResolution::OverrideLimit {
            let client_id = appointment
                .client_id
                .or(session.client_id)
                .ok_or_else(|| BookingError::Validation("Appointment has no client".to_string()))?;

            let subscription = self
                .credits
                .active_subscription(client_id, session.barbershop_id, auth_token)
                .await
                .map_err(map_credit_error)?
                .ok_or_else(|| BookingError::NotFound("Active subscription not found".to_string()))?;

            self.credits
                .record_usage(subscription.id, appointment.service_id, appointment.id, auth_token)
                .await
                .map_err(map_credit_error)?;

            info!(
                "Limit override recorded for appointment {} (subscription {})",
                appointment.id, subscription.id
            );
        } else {
            info!(
                "Appointment {} will be charged separately; no credit consumed",
                appointment.id
            );
        }

        session.pending_appointment_id = None;
        session.step = BookingStep::Committed;
        Ok(appointment)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn tenant(
        &self,
        session: &BookingSession,
        auth_token: Option<&str>,
    ) -> Result<Barbershop, BookingError> {
        self.tenants
            .get_barbershop(session.barbershop_id, auth_token)
            .await
            .map_err(|e| BookingError::NotFound(e.to_string()))
    }

    fn slot_policy(&self, barbershop: &Barbershop) -> SlotPolicy {
        SlotPolicy {
            step_minutes: barbershop.slot_step_or(self.default_slot_step_minutes),
        }
    }

    fn slot_inputs(&self, session: &BookingSession) -> Result<(Uuid, i64), BookingError> {
        let professional_id = session
            .professional_id
            .ok_or_else(|| BookingError::Validation("Select a professional first".to_string()))?;
        let duration_minutes = session
            .service_duration_minutes
            .ok_or_else(|| BookingError::Validation("Select a service first".to_string()))?;
        Ok((professional_id, duration_minutes))
    }

    fn client_ref(&self, session: &BookingSession) -> Result<ClientRef, BookingError> {
        if let Some(client_id) = session.client_id {
            return Ok(ClientRef::Existing { client_id });
        }

        let name = session
            .client_name
            .clone()
            .ok_or_else(|| BookingError::Validation("Client name is required".to_string()))?;
        let phone = session
            .client_phone
            .clone()
            .ok_or_else(|| BookingError::Validation("Client phone is required".to_string()))?;

        Ok(ClientRef::New { name, phone })
    }

    /// Post-commit credit policy: covered credits record usage
    /// automatically, an exhausted limit routes to the decision prompt,
    /// anything else books at normal price. The appointment already
    /// exists either way, so a degraded credit read defers the usage
    /// decision instead of failing the booking.
    async fn apply_credit_policy(
        &self,
        session: &mut BookingSession,
        service_id: Uuid,
        appointment: Appointment,
        auth_token: Option<&str>,
    ) -> Result<CommitOutcome, BookingError> {
        let Some(client_id) = appointment.client_id.or(session.client_id) else {
            session.step = BookingStep::Committed;
            return Ok(CommitOutcome::Booked {
                appointment,
                covered_by_plan: false,
            });
        };

        let barbershop = self.tenant(session, auth_token).await?;
        let today = Utc::now().with_timezone(&barbershop.utc_offset()).date_naive();

        let credits = match self
            .credits
            .compute_credits(
                client_id,
                session.barbershop_id,
                today,
                barbershop.utc_offset(),
                auth_token,
            )
            .await
        {
            Ok(credits) => credits,
            Err(e) => {
                warn!(
                    "Credit evaluation degraded for appointment {}; usage decision deferred: {}",
                    appointment.id, e
                );
                session.step = BookingStep::Committed;
                return Ok(CommitOutcome::Booked {
                    appointment,
                    covered_by_plan: false,
                });
            }
        };

        match decide_for_service(&credits, service_id) {
            CreditDecision::Covered { .. } => {
                let covered = self
                    .record_covered_usage(client_id, session.barbershop_id, &appointment, auth_token)
                    .await;
                session.step = BookingStep::Committed;
                Ok(CommitOutcome::Booked {
                    appointment,
                    covered_by_plan: covered,
                })
            }
            CreditDecision::LimitReached { credit } => {
                info!(
                    "Credit limit reached for service {}; appointment {} awaits a decision",
                    service_id, appointment.id
                );
                session.pending_appointment_id = Some(appointment.id);
                session.step = BookingStep::LimitPrompt;
                Ok(CommitOutcome::AwaitingLimitDecision { appointment, credit })
            }
            CreditDecision::NotCovered => {
                session.step = BookingStep::Committed;
                Ok(CommitOutcome::Booked {
                    appointment,
                    covered_by_plan: false,
                })
            }
        }
    }

    async fn record_covered_usage(
        &self,
        client_id: Uuid,
        barbershop_id: Uuid,
        appointment: &Appointment,
        auth_token: Option<&str>,
    ) -> bool {
        let subscription = match self
            .credits
            .active_subscription(client_id, barbershop_id, auth_token)
            .await
        {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                warn!(
                    "Credit said covered but no active subscription for client {}; usage deferred",
                    client_id
                );
                return false;
            }
            Err(e) => {
                warn!("Subscription lookup degraded; usage deferred: {}", e);
                return false;
            }
        };

        match self
            .credits
            .record_usage(subscription.id, appointment.service_id, appointment.id, auth_token)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Usage recording failed for appointment {}; decision deferred: {}",
                    appointment.id, e
                );
                false
            }
        }
    }

    fn require_step(
        &self,
        session: &BookingSession,
        expected: BookingStep,
    ) -> Result<(), BookingError> {
        if session.step != expected {
            return Err(BookingError::Validation(format!(
                "Session is at step {:?}, expected {:?}",
                session.step, expected
            )));
        }
        Ok(())
    }

    fn require_at_least(
        &self,
        session: &BookingSession,
        step: BookingStep,
    ) -> Result<(), BookingError> {
        if session.step.index() < step.index()
            || matches!(session.step, BookingStep::Committed | BookingStep::LimitPrompt)
        {
            return Err(BookingError::Validation(format!(
                "Session is at step {:?}, cannot perform {:?} yet",
                session.step, step
            )));
        }
        Ok(())
    }
}

fn map_appointment_error(e: AppointmentError) -> BookingError {
    match e {
        AppointmentError::ConflictDetected => {
            BookingError::Conflict("Appointment slot is no longer available".to_string())
        }
        AppointmentError::NotFound => BookingError::NotFound("Appointment not found".to_string()),
        AppointmentError::ServiceNotFound => BookingError::NotFound("Service not found".to_string()),
        AppointmentError::InvalidTime(msg) | AppointmentError::ValidationError(msg) => {
            BookingError::Validation(msg)
        }
        AppointmentError::InvalidStatusTransition(status) => {
            BookingError::Validation(format!("Appointment cannot be modified in status {}", status))
        }
        AppointmentError::DatabaseError(msg) => BookingError::Store(msg),
    }
}

fn map_schedule_error(e: ScheduleError) -> BookingError {
    match e {
        ScheduleError::ProfessionalNotFound => {
            BookingError::NotFound("Professional not found".to_string())
        }
        ScheduleError::InvalidSchedule(msg) | ScheduleError::InvalidDate(msg) => {
            BookingError::Validation(msg)
        }
        ScheduleError::OverrideExists => {
            BookingError::Validation("Override already exists for this date".to_string())
        }
        ScheduleError::DatabaseError(msg) => BookingError::Store(msg),
    }
}

fn map_credit_error(e: CreditError) -> BookingError {
    match e {
        CreditError::SubscriptionNotFound => {
            BookingError::NotFound("Subscription not found".to_string())
        }
        CreditError::UsageAlreadyRecorded(id) => {
            BookingError::Validation(format!("Usage already recorded for appointment {}", id))
        }
        CreditError::InvalidMonth(msg) => BookingError::Validation(msg),
        CreditError::DatabaseError(msg) => BookingError::Store(msg),
    }
}
