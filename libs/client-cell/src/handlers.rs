// libs/client-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::tenants::TenantDirectory;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{normalize_phone, ClientError, CreateClientRequest, MIN_PHONE_DIGITS};
use crate::services::resolver::ClientResolverService;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub barbershop_id: Uuid,
    pub phone: String,
}

fn map_client_error(e: ClientError) -> AppError {
    match e {
        ClientError::NotFound => AppError::NotFound("Client not found".to_string()),
        ClientError::InvalidPhone(msg) => AppError::ValidationError(msg),
        ClientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn resolve_client(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Value>, AppError> {
    if normalize_phone(&query.phone).len() < MIN_PHONE_DIGITS {
        return Err(AppError::ValidationError(format!(
            "Phone must have at least {} digits",
            MIN_PHONE_DIGITS
        )));
    }

    let supabase = Arc::new(SupabaseClient::new(&state));
    let token = auth.token();

    let tenants = TenantDirectory::new(Arc::clone(&supabase));
    let barbershop = tenants
        .get_barbershop(query.barbershop_id, Some(token))
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let resolver = ClientResolverService::new(supabase);
    let resolution = resolver
        .resolve(query.barbershop_id, &query.phone, barbershop.utc_offset(), Some(token))
        .await;

    Ok(Json(json!({
        "success": true,
        "resolution": resolution
    })))
}

#[axum::debug_handler]
pub async fn create_client(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let barbershop_id = user
        .barbershop_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| AppError::Auth("Token is not scoped to a barbershop".to_string()))?;

    let resolver = ClientResolverService::new(Arc::new(SupabaseClient::new(&state)));
    let client = resolver
        .create_client(barbershop_id, request, Some(auth.token()))
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({
        "success": true,
        "client": client
    })))
}
