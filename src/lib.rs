//! FormFold: an embedded form-platform core.
//!
//! Form schemas are runtime data, not compile-time types: administrators
//! assemble forms from a registry of field types, publish them behind
//! opaque share tokens, and collect submissions whose values are stored as
//! schema-less JSON maps reconciled back to their fields by an identity
//! resolver. Collected data leaves the system as time-limited CSV export
//! artifacts.
//!
//! The crate is organized as stores over an embedded sled database:
//!
//! - [`fields`] — the field type registry and pure validation rules
//! - [`schema`] — schema documents, their store, and the identity resolver
//! - [`submission`] — submissions, attachments, and pre-upload staging
//! - [`export`] — CSV generation and export artifact lifecycle
//! - [`formfold`] — the façade that wires the stores together
//!
//! ```no_run
//! use formfold::{FormFold, FormFoldConfig};
//!
//! # fn main() -> Result<(), formfold::FormFoldError> {
//! let fold = FormFold::new(FormFoldConfig::default())?;
//! let schema = fold.schemas().create("Contact", "Reach out to us")?;
//! println!("share token: {}", schema.share_token);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db_operations;
pub mod error;
pub mod export;
pub mod fields;
pub mod formfold;
pub mod schema;
pub mod storage;
pub mod submission;

pub use config::FormFoldConfig;
pub use error::{FieldError, FormFoldError, FormFoldResult};
pub use export::{ExportJob, ExportLifecycle, ExportPipeline, ExportStats};
pub use fields::{FieldDefinition, FieldType, FileMetadata};
pub use formfold::FormFold;
pub use schema::{FormSchema, FormSettings, SchemaDeleteReport, SchemaStore, SchemaSummary};
pub use submission::{
    FileAttachment, FileClaim, Submission, SubmissionDetail, SubmissionFilter, SubmissionPage,
    SubmissionStatus, SubmissionStore,
};
