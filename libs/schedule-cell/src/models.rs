// libs/schedule-cell/src/models.rs
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_config::DEFAULT_SLOT_STEP_MINUTES;

// ==============================================================================
// PROFESSIONAL MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub barbershop_id: Uuid,
    pub display_name: String,
    pub role: ProfessionalRole,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalRole {
    Owner,
    Staff,
}

// ==============================================================================
// WEEKLY TEMPLATE MODELS
// ==============================================================================

/// One row per weekday per professional; absence of a row means not
/// working that weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: Uuid,
    pub professional_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: i32,
    pub is_working: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

impl ScheduleDay {
    /// Template invariants: a working day runs start < end, and a break,
    /// when present, sits inside the window with both ends set.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !self.is_working {
            return Ok(());
        }

        if self.start_time >= self.end_time {
            return Err(ScheduleError::InvalidSchedule(
                "Start time must be before end time".to_string(),
            ));
        }

        match (self.break_start, self.break_end) {
            (None, None) => Ok(()),
            (Some(break_start), Some(break_end)) => {
                if self.start_time <= break_start
                    && break_start < break_end
                    && break_end <= self.end_time
                {
                    Ok(())
                } else {
                    Err(ScheduleError::InvalidSchedule(
                        "Break must fall within the working window".to_string(),
                    ))
                }
            }
            _ => Err(ScheduleError::InvalidSchedule(
                "Break requires both a start and an end".to_string(),
            )),
        }
    }
}

/// Date-specific exception to the weekly template (day off, holiday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub override_date: NaiveDate,
    pub is_working: bool,
    pub reason: Option<String>,
}

/// Resolution of template + override for a concrete date.
#[derive(Debug, Clone)]
pub enum DayPlan {
    Closed,
    Open(ScheduleDay),
}

/// Weekday index used across the store: 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// Candidate-slot granularity. Resolved per request from the tenant row,
/// falling back to the deployment default.
#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    pub step_minutes: i64,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_SLOT_STEP_MINUTES,
        }
    }
}

/// One candidate start time. Unavailable slots are returned, not hidden,
/// so callers can render them greyed out with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Tenant-local wall clock, "HH:MM".
    pub time: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SlotUnavailableReason>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotUnavailableReason {
    Past,
    Break,
    Booked,
}

impl fmt::Display for SlotUnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotUnavailableReason::Past => write!(f, "past"),
            SlotUnavailableReason::Break => write!(f, "break"),
            SlotUnavailableReason::Booked => write!(f, "booked"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertScheduleDayRequest {
    pub weekday: i32,
    pub is_working: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOverrideRequest {
    pub override_date: NaiveDate,
    pub is_working: bool,
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ScheduleError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Override already exists for this date")]
    OverrideExists,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn working_day(start: (u32, u32), end: (u32, u32)) -> ScheduleDay {
        ScheduleDay {
            id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            weekday: 1,
            is_working: true,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            break_start: None,
            break_end: None,
        }
    }

    #[test]
    fn inverted_window_is_rejected() {
        let day = working_day((18, 0), (9, 0));
        assert!(day.validate().is_err());
    }

    #[test]
    fn break_outside_window_is_rejected() {
        let mut day = working_day((9, 0), (18, 0));
        day.break_start = NaiveTime::from_hms_opt(8, 0, 0);
        day.break_end = NaiveTime::from_hms_opt(13, 0, 0);
        assert!(day.validate().is_err());
    }

    #[test]
    fn half_open_break_is_rejected() {
        let mut day = working_day((9, 0), (18, 0));
        day.break_start = NaiveTime::from_hms_opt(12, 0, 0);
        assert!(day.validate().is_err());
    }

    #[test]
    fn non_working_day_skips_validation() {
        let mut day = working_day((18, 0), (9, 0));
        day.is_working = false;
        assert!(day.validate().is_ok());
    }

    #[test]
    fn weekday_index_starts_at_sunday() {
        // 2026-03-08 is a Sunday.
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()), 0);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()), 1);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()), 6);
    }
}
