//! ThreadTrace server
//!
//! Receives trace/span telemetry batches from an instrumented agent chat
//! runtime, reconciles them into structurally valid trace trees, and serves
//! them back to the chat UI.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;

pub use app::CoreApp;
