// libs/subscription-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::tenants::TenantDirectory;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreditError;
use crate::services::credits::CreditLedger;

#[derive(Debug, Deserialize)]
pub struct CreditsQuery {
    pub client_id: Uuid,
    pub barbershop_id: Uuid,
    /// Any date inside the reference month; defaults to today.
    pub month: Option<NaiveDate>,
}

fn map_credit_error(e: CreditError) -> AppError {
    match e {
        CreditError::SubscriptionNotFound => AppError::NotFound("Subscription not found".to_string()),
        CreditError::UsageAlreadyRecorded(id) => {
            AppError::BadRequest(format!("Usage already recorded for appointment {}", id))
        }
        CreditError::InvalidMonth(msg) => AppError::BadRequest(msg),
        CreditError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_credits(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<CreditsQuery>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let token = auth.token();

    let tenants = TenantDirectory::new(Arc::clone(&supabase));
    let barbershop = tenants
        .get_barbershop(query.barbershop_id, Some(token))
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let as_of_month = query
        .month
        .unwrap_or_else(|| chrono::Utc::now().with_timezone(&barbershop.utc_offset()).date_naive());

    let ledger = CreditLedger::new(supabase);
    let credits = ledger
        .compute_credits(
            query.client_id,
            query.barbershop_id,
            as_of_month,
            barbershop.utc_offset(),
            Some(token),
        )
        .await
        .map_err(map_credit_error)?;

    Ok(Json(json!({
        "success": true,
        "credits": credits
    })))
}
