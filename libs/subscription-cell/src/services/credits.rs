// libs/subscription-cell/src/services/credits.rs
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{derive_credits, Credit, CreditError, PlanItem, Subscription, UsageRecord};

/// Tenant-local calendar-month window for a reference date: first instant
/// of the month, half-open against the first instant of the next.
pub fn month_bounds(
    as_of_month: NaiveDate,
    tenant_offset: FixedOffset,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), CreditError> {
    let first = NaiveDate::from_ymd_opt(as_of_month.year(), as_of_month.month(), 1)
        .ok_or_else(|| CreditError::InvalidMonth(as_of_month.to_string()))?;

    let (next_year, next_month) = if as_of_month.month() == 12 {
        (as_of_month.year() + 1, 1)
    } else {
        (as_of_month.year(), as_of_month.month() + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| CreditError::InvalidMonth(as_of_month.to_string()))?;

    let window_start = first
        .and_hms_opt(0, 0, 0)
        .and_then(|ndt| ndt.and_local_timezone(tenant_offset).single())
        .ok_or_else(|| CreditError::InvalidMonth(as_of_month.to_string()))?;
    let window_end = next_first
        .and_hms_opt(0, 0, 0)
        .and_then(|ndt| ndt.and_local_timezone(tenant_offset).single())
        .ok_or_else(|| CreditError::InvalidMonth(as_of_month.to_string()))?;

    Ok((window_start, window_end))
}

/// Derives a client's per-service credits on demand and appends usage at
/// booking time. Nothing here is cached: usage changes invalidate any
/// earlier derivation.
pub struct CreditLedger {
    supabase: Arc<SupabaseClient>,
}

impl CreditLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The client's single active subscription for the tenant, if any.
    pub async fn active_subscription(
        &self,
        client_id: Uuid,
        barbershop_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<Subscription>, CreditError> {
        let path = format!(
            "/rest/v1/subscriptions?client_id=eq.{}&barbershop_id=eq.{}&status=eq.active",
            client_id, barbershop_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| CreditError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| CreditError::DatabaseError(format!("Failed to parse subscription: {}", e)))
            })
            .transpose()
    }

    /// Per-service credits for the reference month. No active
    /// subscription means no credits: every service is priced normally.
    pub async fn compute_credits(
        &self,
        client_id: Uuid,
        barbershop_id: Uuid,
        as_of_month: NaiveDate,
        tenant_offset: FixedOffset,
        auth_token: Option<&str>,
    ) -> Result<Vec<Credit>, CreditError> {
        debug!(
            "Computing credits for client {} in barbershop {} as of {}",
            client_id, barbershop_id, as_of_month
        );

        let Some(subscription) = self
            .active_subscription(client_id, barbershop_id, auth_token)
            .await?
        else {
            return Ok(vec![]);
        };

        let plan_items = self.plan_items(subscription.plan_id, auth_token).await?;
        let usage = self
            .usage_in_month(subscription.id, as_of_month, tenant_offset, auth_token)
            .await?;

        Ok(derive_credits(&plan_items, &usage))
    }

    /// Append one usage record for an appointment. Guarded: a second call
    /// for the same appointment is a caller bug and fails loudly instead
    /// of silently no-opping.
    pub async fn record_usage(
        &self,
        subscription_id: Uuid,
        service_id: Uuid,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<UsageRecord, CreditError> {
        let existing_path = format!(
            "/rest/v1/usage_records?appointment_id=eq.{}",
            appointment_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, auth_token, None)
            .await
            .map_err(|e| CreditError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(CreditError::UsageAlreadyRecorded(appointment_id));
        }

        let usage_data = json!({
            "subscription_id": subscription_id,
            "service_id": service_id,
            "appointment_id": appointment_id,
            "used_at": Utc::now().to_rfc3339(),
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
                "/rest/v1/usage_records",
                auth_token,
                Some(usage_data),
                Some(headers),
            )
            .await
            .map_err(|e| CreditError::DatabaseError(e.to_string()))?;

        let record: UsageRecord = result
            .first()
            .ok_or_else(|| CreditError::DatabaseError("Failed to record usage".to_string()))
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| CreditError::DatabaseError(format!("Failed to parse usage record: {}", e)))
            })?;

        info!(
            "Usage recorded for appointment {} against subscription {}",
            appointment_id, subscription_id
        );
        Ok(record)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn plan_items(
        &self,
        plan_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<PlanItem>, CreditError> {
        let path = format!("/rest/v1/plan_items?plan_id=eq.{}", plan_id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| CreditError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<PlanItem>, _>>()
            .map_err(|e| CreditError::DatabaseError(format!("Failed to parse plan items: {}", e)))
    }

    async fn usage_in_month(
        &self,
        subscription_id: Uuid,
        as_of_month: NaiveDate,
        tenant_offset: FixedOffset,
        auth_token: Option<&str>,
    ) -> Result<Vec<UsageRecord>, CreditError> {
        let (window_start, window_end) = month_bounds(as_of_month, tenant_offset)?;

        let start_str = window_start.to_rfc3339();
        let end_str = window_end.to_rfc3339();
        let start_enc = urlencoding::encode(&start_str);
        let end_enc = urlencoding::encode(&end_str);

        let path = format!(
            "/rest/v1/usage_records?subscription_id=eq.{}&used_at=gte.{}&used_at=lt.{}&order=used_at.asc",
            subscription_id, start_enc, end_enc
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| CreditError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<UsageRecord>, _>>()
            .map_err(|e| CreditError::DatabaseError(format!("Failed to parse usage records: {}", e)))
    }
}
