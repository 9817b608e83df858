// libs/client-cell/src/services/resolver.rs
use chrono::{FixedOffset, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    normalize_phone, phone_variants, Client, ClientError, ClientResolution, CreateClientRequest,
};

/// Maps a phone number to a client record and that client's upcoming
/// appointment, if any. Resolution is deliberately forgiving: a store
/// failure degrades to "unknown client" so the booking flow never blocks
/// on history lookup.
pub struct ClientResolverService {
    supabase: Arc<SupabaseClient>,
}

impl ClientResolverService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn resolve(
        &self,
        barbershop_id: Uuid,
        phone_raw: &str,
        tenant_offset: FixedOffset,
        auth_token: Option<&str>,
    ) -> ClientResolution {
        let normalized = normalize_phone(phone_raw);
        debug!("Resolving phone {} for barbershop {}", normalized, barbershop_id);

        let client = match self.find_by_phone(barbershop_id, &normalized, auth_token).await {
            Ok(found) => found,
            Err(e) => {
                // Degraded path: booking proceeds as a new client, at the
                // cost of a possible duplicate active appointment.
                warn!("Client lookup degraded, treating as new client: {}", e);
                return ClientResolution::default();
            }
        };

        let Some(client) = client else {
            return ClientResolution::default();
        };

        let active_appointment = match self
            .find_active_appointment(&client, tenant_offset, auth_token)
            .await
        {
            Ok(appointment) => appointment,
            Err(e) => {
                warn!("Active-appointment lookup degraded for client {}: {}", client.id, e);
                None
            }
        };

        ClientResolution {
            client: Some(client),
            active_appointment,
        }
    }

    pub async fn get_client(
        &self,
        client_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Client, ClientError> {
        let path = format!("/rest/v1/clients?id=eq.{}", client_id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ClientError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))
    }

    pub async fn create_client(
        &self,
        barbershop_id: Uuid,
        request: CreateClientRequest,
        auth_token: Option<&str>,
    ) -> Result<Client, ClientError> {
        let normalized = normalize_phone(&request.phone);
        if normalized.len() < crate::models::MIN_PHONE_DIGITS {
            return Err(ClientError::InvalidPhone(format!(
                "Phone must have at least {} digits",
                crate::models::MIN_PHONE_DIGITS
            )));
        }

        let client_data = json!({
            "barbershop_id": barbershop_id,
            "name": request.name,
            "phone": normalized,
            "email": request.email,
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
                "/rest/v1/clients",
                auth_token,
                Some(client_data),
                Some(headers),
            )
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        result
            .first()
            .ok_or_else(|| ClientError::DatabaseError("Failed to create client".to_string()))
            .and_then(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))
            })
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn find_by_phone(
        &self,
        barbershop_id: Uuid,
        normalized: &str,
        auth_token: Option<&str>,
    ) -> Result<Option<Client>, ClientError> {
        for variant in phone_variants(normalized) {
            let path = format!(
                "/rest/v1/clients?barbershop_id=eq.{}&phone=eq.{}",
                barbershop_id, variant
            );

            let result: Vec<Value> = self
                .supabase
                .request(Method::GET, &path, auth_token, None)
                .await
                .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

            if let Some(row) = result.into_iter().next() {
                let client: Client = serde_json::from_value(row)
                    .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))?;
                return Ok(Some(client));
            }
        }

        Ok(None)
    }

    /// The client's next calendar-blocking appointment, tenant-local
    /// "now" onward. Steady state is at most one; callers surface it
    /// instead of creating a duplicate.
    async fn find_active_appointment(
        &self,
        client: &Client,
        tenant_offset: FixedOffset,
        auth_token: Option<&str>,
    ) -> Result<Option<Appointment>, ClientError> {
        let now = Utc::now().with_timezone(&tenant_offset);
        let now_str = now.to_rfc3339();
        let now_enc = urlencoding::encode(&now_str);

        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&status=in.(pending,confirmed)&start_time=gte.{}&order=start_time.asc&limit=1",
            client.id, now_enc
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| ClientError::DatabaseError(format!("Failed to parse appointment: {}", e)))
            })
            .transpose()
    }
}
