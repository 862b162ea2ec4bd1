//! API routes

pub mod devices;
pub mod health;
pub mod modules;
pub mod register;
pub mod share;


use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_device_auth;
use crate::state::AppState;

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready));

    // Registration is the only route reachable without device authorization
    let public_api_routes = Router::new().route("/auth/register", post(register::register));

    // Everything else goes through the device authorization protocol
    let protected_api_routes = Router::new()
        .route("/auth/share", post(share::share))
        .route("/devices", get(devices::list_devices))
        .route("/modules", delete(modules::delete_modules))
        .route(
            "/modules/:name",
            get(modules::get_module).put(modules::set_module),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_device_auth,
        ));

    let api_v1_routes = Router::new()
        .merge(public_api_routes)
        .merge(protected_api_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.max_request_body_bytes))
        .with_state(state)
}
