// libs/booking-cell/src/events.rs
use tracing::info;

use appointment_cell::models::Appointment;

/// Observer for booking lifecycle events. The messaging collaborator
/// hangs off this seam; from the engine's perspective every call is
/// fire-and-forget. Passed by reference into the orchestrator instead of
/// riding an ambient event bus.
pub trait BookingEvents: Send + Sync {
    fn appointment_created(&self, appointment: &Appointment);
    fn appointment_rescheduled(&self, appointment: &Appointment);
}

/// Default observer: structured log lines only.
pub struct LogBookingEvents;

impl BookingEvents for LogBookingEvents {
    fn appointment_created(&self, appointment: &Appointment) {
        info!(
            appointment_id = %appointment.id,
            professional_id = %appointment.professional_id,
            start_time = %appointment.start_time,
            "appointment created"
        );
    }

    fn appointment_rescheduled(&self, appointment: &Appointment) {
        info!(
            appointment_id = %appointment.id,
            professional_id = %appointment.professional_id,
            start_time = %appointment.start_time,
            "appointment rescheduled"
        );
    }
}
