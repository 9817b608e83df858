// libs/client-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::Appointment;

/// Minimum digits a bookable phone number must carry (DDD + number).
pub const MIN_PHONE_DIGITS: usize = 10;

const BR_COUNTRY_CODE: &str = "55";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub barbershop_id: Uuid,
    pub name: String,
    /// Canonical digits-only form; historical rows may still carry the
    /// country code, which resolution tolerates.
    pub phone: String,
    pub email: Option<String>,
}

/// What a phone number resolves to: possibly a known client, possibly
/// their upcoming appointment. Both empty means "treat as new client".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientResolution {
    pub client: Option<Client>,
    pub active_appointment: Option<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Strip a phone number down to its digits. All storage and comparison
/// happens on this form.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Lookup forms for a normalized number. Historical rows were stored
/// with and without the leading "55" country code, so resolution must
/// match either way.
pub fn phone_variants(normalized: &str) -> Vec<String> {
    let mut variants = vec![normalized.to_string()];

    if normalized.starts_with(BR_COUNTRY_CODE) && normalized.len() > MIN_PHONE_DIGITS + 1 {
        variants.push(normalized[BR_COUNTRY_CODE.len()..].to_string());
    } else {
        variants.push(format!("{}{}", BR_COUNTRY_CODE, normalized));
    }

    variants
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ClientError {
    #[error("Client not found")]
    NotFound,

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_formatting() {
        assert_eq!(normalize_phone("+55 (11) 98765-4321"), "5511987654321");
        assert_eq!(normalize_phone("(11) 3456-7890"), "1134567890");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn prefixed_number_also_tries_stripped_form() {
        let variants = phone_variants("5511987654321");
        assert!(variants.contains(&"5511987654321".to_string()));
        assert!(variants.contains(&"11987654321".to_string()));
    }

    #[test]
    fn bare_number_also_tries_prefixed_form() {
        let variants = phone_variants("11987654321");
        assert!(variants.contains(&"11987654321".to_string()));
        assert!(variants.contains(&"5511987654321".to_string()));
    }

    #[test]
    fn short_number_starting_with_55_is_not_treated_as_prefixed() {
        // A local number that merely begins with 55; stripping would
        // mangle it.
        let variants = phone_variants("5534567890");
        assert_eq!(variants[0], "5534567890");
        assert!(variants.contains(&"555534567890".to_string()));
    }
}
