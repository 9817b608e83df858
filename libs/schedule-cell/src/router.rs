// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/professionals/{professional_id}/week", get(handlers::get_week))
        .route("/professionals/{professional_id}/week", put(handlers::upsert_day))
        .route("/professionals/{professional_id}/overrides", post(handlers::create_override))
        .route("/slots", get(handlers::get_slots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
