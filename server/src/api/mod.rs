//! HTTP API surface

pub mod extractors;
pub mod routes;
pub mod server;
pub mod types;

pub use server::{ApiServer, AppState};
