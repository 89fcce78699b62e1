//! Domain logic

pub mod ingest;
