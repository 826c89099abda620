//! The FormFold façade.
//!
//! Owns the database handle, the file store, and the four stores built on
//! top of them, and exposes the handful of cross-store operations (public
//! submission, maintenance sweeps) that need more than one of them.

use crate::config::FormFoldConfig;
use crate::db_operations::DbOperations;
use crate::error::{FormFoldError, FormFoldResult};
use crate::export::{ExportJob, ExportLifecycle, ExportPipeline};
use crate::fields::{validate_submission, FileMetadata};
use crate::schema::{FormSchema, SchemaStore};
use crate::storage::{FileStore, LocalFileStore};
use crate::submission::types::{FileClaim, Submission, SubmissionFilter};
use crate::submission::SubmissionStore;
use log::info;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct FormFold {
    config: FormFoldConfig,
    db_ops: Arc<DbOperations>,
    schemas: SchemaStore,
    submissions: Arc<SubmissionStore>,
    exports: ExportPipeline,
    lifecycle: ExportLifecycle,
}

impl FormFold {
    /// Opens (or creates) a FormFold instance rooted at the configured
    /// directories.
    pub fn new(config: FormFoldConfig) -> FormFoldResult<Self> {
        config.validate()?;
        let db = sled::open(&config.data_dir)?;
        Self::with_db(config, db)
    }

    /// Builds an instance over an already-open database. Tests use this
    /// with a temporary sled instance.
    pub fn with_db(config: FormFoldConfig, db: sled::Db) -> FormFoldResult<Self> {
        let db_ops = Arc::new(DbOperations::new(db)?);
        let file_store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
        file_store.ensure_dir(&config.uploads_dir)?;
        file_store.ensure_dir(&config.temp_uploads_dir)?;
        file_store.ensure_dir(&config.exports_dir)?;

        let schemas = SchemaStore::new(Arc::clone(&db_ops), Arc::clone(&file_store), &config);
        let submissions = Arc::new(SubmissionStore::new(
            Arc::clone(&db_ops),
            Arc::clone(&file_store),
            &config,
        ));
        let exports = ExportPipeline::new(
            Arc::clone(&db_ops),
            Arc::clone(&submissions),
            Arc::clone(&file_store),
            &config,
        );
        let lifecycle = ExportLifecycle::new(Arc::clone(&db_ops), file_store);

        info!("FormFold ready at {}", config.data_dir.display());
        Ok(Self {
            config,
            db_ops,
            schemas,
            submissions,
            exports,
            lifecycle,
        })
    }

    pub fn config(&self) -> &FormFoldConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    pub fn submissions(&self) -> &SubmissionStore {
        &self.submissions
    }

    pub fn exports(&self) -> &ExportPipeline {
        &self.exports
    }

    pub fn export_lifecycle(&self) -> &ExportLifecycle {
        &self.lifecycle
    }

    /// Handles a public form submission against an active schema.
    ///
    /// Validates every field, collecting all failures, then persists the
    /// normalized values and claims the staged uploads. Submitting to an
    /// inactive form reads the same as submitting to a missing one.
    pub fn submit(
        &self,
        schema_id: &str,
        values: HashMap<String, Value>,
        files: Vec<FileClaim>,
        ip_address: &str,
        user_agent: &str,
    ) -> FormFoldResult<Submission> {
        let schema = self.schemas.get(schema_id)?;
        if !schema.is_active {
            return Err(FormFoldError::NotFound("Form not found".to_string()));
        }

        let file_metadata = self.claimed_file_metadata(&files)?;
        let normalized = validate_submission(&schema.fields, &values, &file_metadata)
            .map_err(FormFoldError::Validation)?;

        self.submissions
            .insert(schema_id, normalized, files, ip_address, user_agent)
    }

    /// Public submission addressed by share token rather than schema id.
    pub fn submit_by_token(
        &self,
        share_token: &str,
        values: HashMap<String, Value>,
        files: Vec<FileClaim>,
        ip_address: &str,
        user_agent: &str,
    ) -> FormFoldResult<Submission> {
        let schema = self.schemas.get_by_share_token(share_token)?;
        self.submit(&schema.id, values, files, ip_address, user_agent)
    }

    /// The public view of a shared form, served only while active.
    pub fn public_form(&self, share_token: &str) -> FormFoldResult<FormSchema> {
        let schema = self.schemas.get_by_share_token(share_token)?;
        if !schema.is_active {
            return Err(FormFoldError::NotFound("Form not found".to_string()));
        }
        Ok(schema)
    }

    /// Generates a CSV export for a schema's filtered submissions.
    pub fn build_export(
        &self,
        schema_id: &str,
        filter: &SubmissionFilter,
    ) -> FormFoldResult<ExportJob> {
        self.exports.build_export(schema_id, filter)
    }

    /// Runs both garbage sweeps: expired exports and stale pre-uploads.
    /// Returns (exports swept, uploads swept).
    pub fn maintenance_sweep(&self) -> FormFoldResult<(usize, usize)> {
        let exports = self.lifecycle.sweep_expired()?;
        let uploads = self.submissions.sweep_temp_uploads()?;
        Ok((exports, uploads))
    }

    /// Resolves staged uploads into the metadata the validator needs,
    /// keyed by the field reference each claim was made against.
    fn claimed_file_metadata(
        &self,
        files: &[FileClaim],
    ) -> FormFoldResult<HashMap<String, FileMetadata>> {
        let mut metadata = HashMap::new();
        for claim in files {
            let upload = self
                .submissions
                .get_staged_upload(&claim.token)?
                .ok_or_else(|| {
                    FormFoldError::NotFound(format!("Uploaded file {} not found", claim.token))
                })?;
            metadata.insert(claim.field_ref.clone(), upload.metadata());
        }
        Ok(metadata)
    }

    /// Tree-level record counts, for diagnostics.
    pub fn stats(&self) -> FormFoldResult<HashMap<String, u64>> {
        self.db_ops.get_stats()
    }
}
