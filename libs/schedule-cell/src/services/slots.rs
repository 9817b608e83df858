// libs/schedule-cell/src/services/slots.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use appointment_cell::models::{conflicting, intervals_overlap, Appointment};
use appointment_cell::services::ledger::AppointmentLedger;
use shared_database::supabase::SupabaseClient;

use crate::models::{DayPlan, ScheduleDay, ScheduleError, SlotPolicy, SlotUnavailableReason, TimeSlot};
use crate::services::schedule::ScheduleService;

/// Walk candidate start times across a working window and mark each one
/// available or not. Pure; `now` is injected so the past-check is
/// deterministic under test. Candidates step at the policy granularity
/// regardless of service duration, and nothing is dropped: unavailable
/// slots come back with their reason.
pub fn walk_slots(
    day: &ScheduleDay,
    date: NaiveDate,
    duration_minutes: i64,
    policy: SlotPolicy,
    tenant_offset: FixedOffset,
    existing: &[Appointment],
    exclude_appointment_id: Option<Uuid>,
    now: DateTime<FixedOffset>,
) -> Vec<TimeSlot> {
    if !day.is_working || duration_minutes <= 0 {
        return vec![];
    }

    let (Some(window_start), Some(window_end)) = (
        local_instant(date, day.start_time, tenant_offset),
        local_instant(date, day.end_time, tenant_offset),
    ) else {
        return vec![];
    };

    // A zero-length break never trips the half-open overlap test, so it
    // is simply not materialized.
    let break_window = match (day.break_start, day.break_end) {
        (Some(break_start), Some(break_end)) if break_start < break_end => local_instant(date, break_start, tenant_offset)
            .zip(local_instant(date, break_end, tenant_offset)),
        _ => None,
    };

    let duration = Duration::minutes(duration_minutes);
    let step = Duration::minutes(policy.step_minutes.max(1));

    let mut slots = Vec::new();
    let mut candidate = window_start;

    // Last admissible start is `end - duration`, inclusive.
    while candidate + duration <= window_end {
        let candidate_end = candidate + duration;

        let reason = if candidate < now {
            Some(SlotUnavailableReason::Past)
        } else if break_window
            .is_some_and(|(break_start, break_end)| {
                intervals_overlap(candidate, candidate_end, break_start, break_end)
            })
        {
            Some(SlotUnavailableReason::Break)
        } else if !conflicting(existing, candidate, candidate_end, exclude_appointment_id).is_empty() {
            Some(SlotUnavailableReason::Booked)
        } else {
            None
        };

        slots.push(TimeSlot {
            time: candidate.format("%H:%M").to_string(),
            available: reason.is_none(),
            reason,
        });

        candidate += step;
    }

    slots
}

fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_time(time).and_local_timezone(offset).single()
}

/// Store-facing slot generation: resolves the day plan (template +
/// overrides), pulls the professional's bookings for the date and runs
/// the walk.
pub struct AvailabilityService {
    schedule: ScheduleService,
    ledger: AppointmentLedger,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            schedule: ScheduleService::new(Arc::clone(&supabase)),
            ledger: AppointmentLedger::new(supabase),
        }
    }

    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        duration_minutes: i64,
        policy: SlotPolicy,
        tenant_offset: FixedOffset,
        exclude_appointment_id: Option<Uuid>,
        auth_token: Option<&str>,
    ) -> Result<Vec<TimeSlot>, ScheduleError> {
        debug!(
            "Generating slots for professional {} on {} ({} min service)",
            professional_id, date, duration_minutes
        );

        let day = match self.schedule.day_plan(professional_id, date, auth_token).await? {
            DayPlan::Closed => return Ok(vec![]),
            DayPlan::Open(day) => day,
        };

        let existing = self
            .ledger
            .appointments_for_date(professional_id, date, tenant_offset, auth_token)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let now = Utc::now().with_timezone(&tenant_offset);

        Ok(walk_slots(
            &day,
            date,
            duration_minutes,
            policy,
            tenant_offset,
            &existing,
            exclude_appointment_id,
            now,
        ))
    }
}
