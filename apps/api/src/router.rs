use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use booking_cell::router::{booking_routes, public_booking_routes};
use client_cell::router::client_routes;
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;
use subscription_cell::router::subscription_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Navalha API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/subscriptions", subscription_routes(state.clone()))
        .nest("/clients", client_routes(state.clone()))
        .nest("/booking", booking_routes(state.clone()))
        .nest("/public/booking", public_booking_routes(state))
}
