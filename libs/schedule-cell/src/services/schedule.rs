// libs/schedule-cell/src/services/schedule.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{
    weekday_index, CreateOverrideRequest, DayPlan, ScheduleDay, ScheduleError, ScheduleOverride,
    UpsertScheduleDayRequest,
};

/// Weekly availability template plus date-specific overrides.
pub struct ScheduleService {
    supabase: Arc<SupabaseClient>,
}

impl ScheduleService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get_week(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<ScheduleDay>, ScheduleError> {
        debug!("Fetching weekly template for professional {}", professional_id);

        let path = format!(
            "/rest/v1/schedule_days?professional_id=eq.{}&order=weekday.asc",
            professional_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ScheduleDay>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse schedule days: {}", e)))
    }

    /// Create or replace the template row for one weekday.
    pub async fn upsert_day(
        &self,
        professional_id: Uuid,
        request: UpsertScheduleDayRequest,
        auth_token: Option<&str>,
    ) -> Result<ScheduleDay, ScheduleError> {
        if !(0..=6).contains(&request.weekday) {
            return Err(ScheduleError::InvalidSchedule(
                "Weekday must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        let candidate = ScheduleDay {
            id: Uuid::new_v4(),
            professional_id,
            weekday: request.weekday,
            is_working: request.is_working,
            start_time: request.start_time,
            end_time: request.end_time,
            break_start: request.break_start,
            break_end: request.break_end,
        };
        candidate.validate()?;

        let day_data = json!({
            "professional_id": professional_id,
            "weekday": request.weekday,
            "is_working": request.is_working,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "break_start": request.break_start.map(|t| t.format("%H:%M:%S").to_string()),
            "break_end": request.break_end.map(|t| t.format("%H:%M:%S").to_string()),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedule_days?on_conflict=professional_id,weekday",
                auth_token,
                Some(day_data),
                Some(headers),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .first()
            .ok_or_else(|| ScheduleError::DatabaseError("Failed to upsert schedule day".to_string()))
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse schedule day: {}", e)))
            })
    }

    /// Date-specific exception (day off, holiday).
    pub async fn create_override(
        &self,
        professional_id: Uuid,
        request: CreateOverrideRequest,
        auth_token: Option<&str>,
    ) -> Result<ScheduleOverride, ScheduleError> {
        debug!(
            "Creating schedule override for professional {} on {}",
            professional_id, request.override_date
        );

        let existing = self
            .override_for(professional_id, request.override_date, auth_token)
            .await?;
        if existing.is_some() {
            return Err(ScheduleError::OverrideExists);
        }

        let override_data = json!({
            "professional_id": professional_id,
            "override_date": request.override_date,
            "is_working": request.is_working,
            "reason": request.reason,
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedule_overrides",
                auth_token,
                Some(override_data),
                Some(headers),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .first()
            .ok_or_else(|| ScheduleError::DatabaseError("Failed to create override".to_string()))
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse override: {}", e)))
            })
    }

    /// Resolve what a concrete date looks like for a professional:
    /// override first, then the weekly template. Absence of a template
    /// row means not working.
    pub async fn day_plan(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<DayPlan, ScheduleError> {
        if let Some(override_entry) = self.override_for(professional_id, date, auth_token).await? {
            if !override_entry.is_working {
                debug!(
                    "Professional {} has a day off override on {}",
                    professional_id, date
                );
                return Ok(DayPlan::Closed);
            }
        }

        let weekday = weekday_index(date);
        let path = format!(
            "/rest/v1/schedule_days?professional_id=eq.{}&weekday=eq.{}",
            professional_id, weekday
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Ok(DayPlan::Closed);
        };

        let day: ScheduleDay = serde_json::from_value(row)
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse schedule day: {}", e)))?;

        if day.is_working {
            Ok(DayPlan::Open(day))
        } else {
            Ok(DayPlan::Closed)
        }
    }

    async fn override_for(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<ScheduleOverride>, ScheduleError> {
        let path = format!(
            "/rest/v1/schedule_overrides?professional_id=eq.{}&override_date=eq.{}",
            professional_id, date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse override: {}", e)))
            })
            .transpose()
    }
}
