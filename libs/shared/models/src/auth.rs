use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Tenant the staff token is scoped to.
    pub barbershop_id: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    /// "owner" or "staff" for salon tokens.
    pub role: Option<String>,
    pub barbershop_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_owner(&self) -> bool {
        self.role.as_deref() == Some("owner")
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role.as_deref(), Some("owner") | Some("staff"))
    }
}
