// libs/client-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn client_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/resolve", get(handlers::resolve_client))
        .route("/", post(handlers::create_client))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
