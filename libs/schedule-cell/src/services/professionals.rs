// libs/schedule-cell/src/services/professionals.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{DayPlan, Professional, ScheduleError};
use crate::services::schedule::ScheduleService;

/// Professional lookups, including the explicit staff-to-service
/// capability mapping. Qualification is declared in the store, never
/// derived.
pub struct ProfessionalService {
    supabase: Arc<SupabaseClient>,
    schedule: ScheduleService,
}

impl ProfessionalService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        let schedule = ScheduleService::new(Arc::clone(&supabase));
        Self { supabase, schedule }
    }

    pub async fn get_professional(
        &self,
        professional_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Professional, ScheduleError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ScheduleError::ProfessionalNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse professional: {}", e)))
    }

    pub async fn list_active(
        &self,
        barbershop_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<Professional>, ScheduleError> {
        let path = format!(
            "/rest/v1/professionals?barbershop_id=eq.{}&active=eq.true&order=display_name.asc",
            barbershop_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse professionals: {}", e)))
    }

    /// Professionals declared capable of a service via the
    /// professional_services mapping table.
    pub async fn qualified_for_service(
        &self,
        barbershop_id: Uuid,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<Professional>, ScheduleError> {
        debug!("Listing professionals qualified for service {}", service_id);

        let mapping_path = format!(
            "/rest/v1/professional_services?service_id=eq.{}&select=professional_id",
            service_id
        );

        let mappings: Vec<Value> = self
            .supabase
            .request(Method::GET, &mapping_path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let ids: Vec<String> = mappings
            .iter()
            .filter_map(|row| row["professional_id"].as_str().map(str::to_string))
            .collect();

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let path = format!(
            "/rest/v1/professionals?barbershop_id=eq.{}&active=eq.true&id=in.({})&order=display_name.asc",
            barbershop_id,
            ids.join(",")
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse professionals: {}", e)))
    }

    /// Schedule-template check only; no slot generation. Used to annotate
    /// the professional picker before a time is chosen.
    pub async fn is_working_on(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<bool, ScheduleError> {
        let plan = self.schedule.day_plan(professional_id, date, auth_token).await?;
        Ok(matches!(plan, DayPlan::Open(_)))
    }
}
