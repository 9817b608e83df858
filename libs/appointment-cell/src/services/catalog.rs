// libs/appointment-cell/src/services/catalog.rs
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, Service};

/// Read access to the tenant's service catalog. Catalog CRUD lives in the
/// admin surface; the engine only ever reads.
pub struct ServiceCatalog {
    supabase: Arc<SupabaseClient>,
}

impl ServiceCatalog {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn list_services(
        &self,
        barbershop_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<Service>, AppointmentError> {
        debug!("Listing services for barbershop {}", barbershop_id);

        let path = format!(
            "/rest/v1/services?barbershop_id=eq.{}&active=eq.true&order=name.asc",
            barbershop_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Service>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse services: {}", e)))
    }

    pub async fn get_service(
        &self,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Service, AppointmentError> {
        let path = format!("/rest/v1/services?id=eq.{}", service_id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ServiceNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse service: {}", e)))
    }
}
