//! Main router configuration assembling the registration, token and lookup endpoints.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState,
    handler_applications::{handle_get_application, handle_register_application},
    handler_introspect::{handle_inspect, handle_validate},
    handler_oauth::handle_oauth_token,
    handler_oauth_clients::{handle_get_client, handle_register_client},
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let register_routes = Router::new()
        .route("/application", post(handle_register_application))
        .route("/client", post(handle_register_client));

    Router::new()
        .nest("/register", register_routes)
        .route("/token", get(handle_oauth_token).post(handle_oauth_token))
        .route("/inspect", get(handle_inspect).post(handle_inspect))
        .route("/validate", get(handle_validate).post(handle_validate))
        .route("/applications/{application_id}", get(handle_get_application))
        .route("/clients/{client_id}", get(handle_get_client))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
