// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

fn wizard_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/session", post(handlers::start_session))
        .route("/identify", post(handlers::identify))
        .route("/reschedule", post(handlers::begin_reschedule))
        .route("/cancel-existing", post(handlers::cancel_existing))
        .route("/services", post(handlers::list_services))
        .route("/select-service", post(handlers::select_service))
        .route("/professionals", post(handlers::list_professionals))
        .route("/select-professional", post(handlers::select_professional))
        .route("/slots", post(handlers::list_slots))
        .route("/select-time", post(handlers::select_time))
        .route("/confirm", post(handlers::confirm))
        .route("/resolve-limit", post(handlers::resolve_limit))
        .route("/back", post(handlers::go_back))
}

/// Staff-facing wizard: same steps, behind authentication.
pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    let protected = wizard_routes()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected).with_state(state)
}

/// Client-facing wizard: no auth; the store is reached with the anon key
/// and the tenant is addressed by slug.
pub fn public_booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new().merge(wizard_routes()).with_state(state)
}
