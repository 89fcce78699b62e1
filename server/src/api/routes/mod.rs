//! API route handlers

pub mod health;
pub mod ingest;
pub mod traces;
