//! Field type registry: the supported field variants and their validation
//! and serialization rules.
//!
//! This is the leaf of the system. [`FieldType`] enumerates the variants,
//! [`FieldDefinition`] carries the per-field configuration authored in the
//! form builder, and [`validation`] holds the pure validation functions.

pub mod types;
pub mod validation;

pub use types::{FieldDefinition, FieldType, FileMetadata};
pub use validation::{validate_file, validate_submission, validate_value};
