//! Application state shared by every request handler.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::{ApplicationRegistry, ClientRegistry, TokenAuthority};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Registry of applications keyed by name
    pub applications: Arc<ApplicationRegistry>,
    /// Registry of clients keyed by derived client id
    pub clients: Arc<ClientRegistry>,
    /// Issues and checks access and refresh tokens
    pub tokens: Arc<TokenAuthority>,
}
