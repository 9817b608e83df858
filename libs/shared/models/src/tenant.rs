use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant row. Every professional, service, client, appointment and plan
/// hangs off one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barbershop {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// Offset of the shop's wall clock from UTC, in minutes. All
    /// appointment instants are stored with this offset attached.
    pub utc_offset_minutes: i32,
    /// Per-tenant slot granularity; falls back to the deployment default
    /// when absent.
    pub slot_step_minutes: Option<i64>,
}

impl Barbershop {
    /// The shop's wall-clock offset as a chrono timezone.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    pub fn slot_step_or(&self, default_minutes: i64) -> i64 {
        self.slot_step_minutes
            .filter(|step| *step > 0)
            .unwrap_or(default_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(offset_minutes: i32, step: Option<i64>) -> Barbershop {
        Barbershop {
            id: Uuid::new_v4(),
            name: "Navalha Centro".to_string(),
            slug: "navalha-centro".to_string(),
            utc_offset_minutes: offset_minutes,
            slot_step_minutes: step,
        }
    }

    #[test]
    fn offset_is_applied_east_of_utc() {
        let shop = shop(-180, None); // UTC-3
        assert_eq!(shop.utc_offset().local_minus_utc(), -180 * 60);
    }

    #[test]
    fn slot_step_falls_back_to_default() {
        assert_eq!(shop(0, None).slot_step_or(30), 30);
        assert_eq!(shop(0, Some(15)).slot_step_or(30), 15);
        assert_eq!(shop(0, Some(0)).slot_step_or(30), 30);
    }
}
