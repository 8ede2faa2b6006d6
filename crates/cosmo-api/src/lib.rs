//! cosmo-api: HTTP API layer for CosmoDEX
//!
//! Exposes pool queries and mutations as JSON endpoints.

pub mod dto;
pub mod relay;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
