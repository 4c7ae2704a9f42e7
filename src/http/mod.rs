//! Axum HTTP server handlers for registration, token, and introspection endpoints.

pub mod context;
mod handler_applications;
mod handler_introspect;
mod handler_oauth;
mod handler_oauth_clients;
mod middleware_auth;
pub mod server;
mod utils_oauth;

pub use context::AppState;
pub use handler_applications::{RegisterApplicationRequest, RegisterApplicationResponse};
pub use handler_introspect::InspectResponse;
pub use handler_oauth::TokenForm;
pub use handler_oauth_clients::{ClientView, RegisterClientRequest, RegisterClientResponse};
pub use middleware_auth::BearerToken;
pub use server::build_router;
