//! Application authorization service library crate.
//!
//! Registers applications and their clients, derives client credentials, and
//! issues bearer tokens scoped to what each client was granted.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
