//! Trait-based storage abstractions with an in-memory backend.

pub mod inmemory;
pub mod traits;

// Re-export commonly used types and traits
pub use inmemory::MemoryAuthStorage;
pub use traits::*;
