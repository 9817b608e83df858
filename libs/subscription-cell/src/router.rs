// libs/subscription-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn subscription_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/credits", get(handlers::get_credits))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
