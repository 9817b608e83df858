use anyhow::{anyhow, Result};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_models::tenant::Barbershop;

use crate::supabase::SupabaseClient;

/// Tenant row lookups. Every engine entry point resolves the barbershop
/// first: its UTC offset anchors all wall-clock math and its slot step
/// overrides the deployment default.
pub struct TenantDirectory {
    supabase: Arc<SupabaseClient>,
}

impl TenantDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get_barbershop(
        &self,
        barbershop_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Barbershop> {
        debug!("Fetching barbershop {}", barbershop_id);

        let path = format!("/rest/v1/barbershops?id=eq.{}", barbershop_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Barbershop not found: {}", barbershop_id))?;

        Ok(serde_json::from_value(row)?)
    }

    /// Public booking flow addresses tenants by slug.
    pub async fn get_barbershop_by_slug(
        &self,
        slug: &str,
        auth_token: Option<&str>,
    ) -> Result<Barbershop> {
        debug!("Fetching barbershop by slug {}", slug);

        let path = format!("/rest/v1/barbershops?slug=eq.{}", slug);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Barbershop not found: {}", slug))?;

        Ok(serde_json::from_value(row)?)
    }
}
