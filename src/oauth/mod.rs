//! Application and client registries, credential derivation, and token lifecycle.

pub mod applications;
pub mod clients;
pub mod clock;
pub mod credentials;
pub mod scope;
pub mod token_authority;
pub mod token_sweeper;
pub mod types;

// Re-export frequently used items from each module
pub use crate::storage::{
    inmemory::MemoryAuthStorage,
    traits::{AccessTokenStore, ApplicationStore, AuthStorage, ClientStore, RefreshTokenStore},
};
pub use applications::ApplicationRegistry;
pub use clients::{ClientRegistry, MAX_CREDENTIAL_ATTEMPTS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialDeriver, OsSaltSource, SaltSource};
pub use scope::ScopeSet;
pub use token_authority::{TokenAuthority, TokenSettings};
pub use token_sweeper::run_token_sweeper;
pub use types::{
    AccessToken, Application, Client, ClientInfo, GrantType, IssuedToken, RefreshToken,
    RegisteredClient, TokenInfo, TokenResponse, TokenType,
};
