//! Token Service — a registry of named tokens with soft-delete and reactivation.
//!
//! The binary in `main.rs` wires these modules together; integration tests in
//! `tests/` drive the router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod store;

use store::TokenStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub db: TokenStore,
    pub config: config::Config,
}
