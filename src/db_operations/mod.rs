//! Persistence layer over the embedded sled database.
//!
//! One named tree per record collection, JSON-encoded values. The generic
//! helpers live in [`core`]; per-collection operations are layered on top in
//! their own files so the stores above never touch sled directly.

pub mod core;
mod export_operations;
mod schema_operations;
mod submission_operations;

pub use core::DbOperations;
