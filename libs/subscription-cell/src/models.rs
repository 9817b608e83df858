// libs/subscription-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Sentinel for "no monthly cap" in [`Credit::remaining`].
pub const UNLIMITED: i32 = -1;

// ==============================================================================
// SUBSCRIPTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub client_id: Uuid,
    pub barbershop_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
}

/// At most one subscription per (client, tenant) is `active` at a time;
/// the store enforces that, the engine relies on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    Canceled,
    Expired,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Trialing => write!(f, "trialing"),
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub service_id: Uuid,
    /// None or 0 means unlimited uses per calendar month.
    pub quantity_limit: Option<i32>,
}

impl PlanItem {
    pub fn is_unlimited(&self) -> bool {
        matches!(self.quantity_limit, None | Some(0))
    }
}

/// Append-only consumption trail. Never updated in place; cancellation
/// reconciliation happens outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub service_id: Uuid,
    pub appointment_id: Uuid,
    pub used_at: DateTime<Utc>,
}

/// Derived per booking session from subscription + plan + usage; never
/// cached across sessions since any new usage invalidates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credit {
    pub service_id: Uuid,
    pub limit: i32,
    pub used_this_month: i32,
    pub remaining: i32,
}

impl Credit {
    pub fn is_unlimited(&self) -> bool {
        self.remaining == UNLIMITED
    }

    /// Usable right now: unlimited, or something left under the cap.
    pub fn has_remaining(&self) -> bool {
        self.is_unlimited() || self.remaining > 0
    }
}

/// Outcome of checking a selected service against the session's credits.
/// `LimitReached` is a decision point, not a failure: the appointment is
/// already booked and only the usage-recording question is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditDecision {
    Covered { credit: Credit },
    LimitReached { credit: Credit },
    NotCovered,
}

// ==============================================================================
// PURE DERIVATION
// ==============================================================================

/// Fold plan items and this month's usage into per-service credits.
/// `usage` must already be windowed to the reference month; counting is
/// all that happens here.
pub fn derive_credits(plan_items: &[PlanItem], usage: &[UsageRecord]) -> Vec<Credit> {
    let mut used_by_service: HashMap<Uuid, i32> = HashMap::new();
    for record in usage {
        *used_by_service.entry(record.service_id).or_insert(0) += 1;
    }

    plan_items
        .iter()
        .map(|item| {
            let used = used_by_service.get(&item.service_id).copied().unwrap_or(0);
            let (limit, remaining) = if item.is_unlimited() {
                (0, UNLIMITED)
            } else {
                let limit = item.quantity_limit.unwrap_or(0);
                (limit, (limit - used).max(0))
            };

            Credit {
                service_id: item.service_id,
                limit,
                used_this_month: used,
                remaining,
            }
        })
        .collect()
}

/// Policy applied at booking time for one service.
pub fn decide_for_service(credits: &[Credit], service_id: Uuid) -> CreditDecision {
    match credits.iter().find(|c| c.service_id == service_id) {
        Some(credit) if credit.has_remaining() => CreditDecision::Covered { credit: credit.clone() },
        Some(credit) => CreditDecision::LimitReached { credit: credit.clone() },
        None => CreditDecision::NotCovered,
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum CreditError {
    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Usage already recorded for appointment {0}")]
    UsageAlreadyRecorded(Uuid),

    #[error("Invalid month reference: {0}")]
    InvalidMonth(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
