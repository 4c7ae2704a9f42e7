//! In-memory storage implementations
//!
//! This module provides in-memory implementations of all storage traits.
//! State is volatile and lost when the process exits.

mod oauth;

pub use oauth::MemoryAuthStorage;
