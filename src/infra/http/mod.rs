pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};

use crate::application::repos::HealthProbe;
use crate::application::users::UserService;

#[derive(Clone)]
pub struct ApiState {
    pub users: Arc<UserService>,
    pub db: Arc<dyn HealthProbe>,
    /// When set, the update operation answers with the persisted record
    /// instead of echoing the submitted body.
    pub update_returns_record: bool,
}

pub fn build_router(state: ApiState) -> Router {
    // Per-method-router fallbacks answer requests whose path matched but
    // whose method did not, keeping the wire envelope uniform.
    Router::new()
        .route(
            "/users",
            get(handlers::list_users)
                .post(handlers::create_user)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/health/db",
            get(handlers::db_health).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::unknown_route)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
