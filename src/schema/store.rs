//! The schema store: owns FormSchema documents and their share tokens.
//!
//! All mutation is whole-config replace-and-persist (last-write-wins).
//! Field-level helpers are read-modify-replace over that primitive; they
//! are not atomic at the storage level, which is acceptable under the
//! single-admin assumption but would need serialization if concurrent
//! editors were introduced.

use crate::config::FormFoldConfig;
use crate::db_operations::DbOperations;
use crate::error::{FormFoldError, FormFoldResult};
use crate::fields::FieldDefinition;
use crate::schema::types::{FormSchema, FormSettings, SchemaDeleteReport, SchemaSummary};
use crate::storage::FileStore;
use chrono::Utc;
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

pub struct SchemaStore {
    db_ops: Arc<DbOperations>,
    file_store: Arc<dyn FileStore>,
    token_length: usize,
    token_max_retries: usize,
}

impl SchemaStore {
    pub fn new(
        db_ops: Arc<DbOperations>,
        file_store: Arc<dyn FileStore>,
        config: &FormFoldConfig,
    ) -> Self {
        Self {
            db_ops,
            file_store,
            token_length: config.share_token_length,
            token_max_retries: config.token_max_retries,
        }
    }

    /// Creates a new schema with an empty field list and a freshly
    /// generated unique share token.
    pub fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> FormFoldResult<FormSchema> {
        // Token collisions are retried internally a bounded number of
        // times; exhaustion surfaces as a storage error to the caller.
        let token = self.generate_unique_token().map_err(|e| match e {
            FormFoldError::Conflict(msg) => FormFoldError::Storage(msg),
            other => other,
        })?;

        let schema = FormSchema::new(title, description, token);
        self.db_ops.store_schema(&schema)?;
        self.db_ops
            .store_share_token(&schema.share_token, &schema.id)?;
        info!("created schema {} ({})", schema.id, schema.title);
        Ok(schema)
    }

    /// Retrieves a schema by id.
    pub fn get(&self, schema_id: &str) -> FormFoldResult<FormSchema> {
        self.db_ops
            .get_schema(schema_id)?
            .ok_or_else(|| FormFoldError::NotFound(format!("Schema {} not found", schema_id)))
    }

    /// Resolves a public share token to its schema.
    pub fn get_by_share_token(&self, token: &str) -> FormFoldResult<FormSchema> {
        let schema_id = self
            .db_ops
            .get_schema_id_by_token(token)?
            .ok_or_else(|| FormFoldError::NotFound("Form not found".to_string()))?;
        self.get(&schema_id)
    }

    /// Replaces a schema's entire field list and settings in one
    /// whole-document overwrite.
    pub fn replace_config(
        &self,
        schema_id: &str,
        fields: Vec<FieldDefinition>,
        settings: FormSettings,
    ) -> FormFoldResult<FormSchema> {
        FormSchema::validate_field_ids(&fields)?;
        let mut schema = self.get(schema_id)?;
        schema.fields = fields;
        schema.settings = settings;
        schema.updated_at = Utc::now();
        self.db_ops.store_schema(&schema)?;
        Ok(schema)
    }

    /// Updates title and description without touching the field config.
    pub fn update_basic_info(
        &self,
        schema_id: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> FormFoldResult<FormSchema> {
        let mut schema = self.get(schema_id)?;
        schema.title = title.into();
        schema.description = description.into();
        schema.updated_at = Utc::now();
        self.db_ops.store_schema(&schema)?;
        Ok(schema)
    }

    /// Activates or deactivates the public form.
    pub fn set_active(&self, schema_id: &str, active: bool) -> FormFoldResult<FormSchema> {
        let mut schema = self.get(schema_id)?;
        schema.is_active = active;
        schema.updated_at = Utc::now();
        self.db_ops.store_schema(&schema)?;
        Ok(schema)
    }

    /// Appends a field. Read-modify-replace over `replace_config`.
    pub fn add_field(&self, schema_id: &str, field: FieldDefinition) -> FormFoldResult<FormSchema> {
        let schema = self.get(schema_id)?;
        let mut fields = schema.fields;
        fields.push(field);
        self.replace_config(schema_id, fields, schema.settings)
    }

    /// Replaces the field with the same id. The id itself never changes.
    pub fn update_field(
        &self,
        schema_id: &str,
        field: FieldDefinition,
    ) -> FormFoldResult<FormSchema> {
        let schema = self.get(schema_id)?;
        let mut fields = schema.fields;
        let slot = fields
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or_else(|| {
                FormFoldError::NotFound(format!(
                    "Field {} not found in schema {}",
                    field.id, schema_id
                ))
            })?;
        *slot = field;
        self.replace_config(schema_id, fields, schema.settings)
    }

    /// Removes a field by id.
    pub fn remove_field(&self, schema_id: &str, field_id: &str) -> FormFoldResult<FormSchema> {
        let schema = self.get(schema_id)?;
        let mut fields = schema.fields;
        let before = fields.len();
        fields.retain(|f| f.id != field_id);
        if fields.len() == before {
            return Err(FormFoldError::NotFound(format!(
                "Field {} not found in schema {}",
                field_id, schema_id
            )));
        }
        self.replace_config(schema_id, fields, schema.settings)
    }

    /// Lists all schemas, newest first, each enriched with its submission
    /// count.
    pub fn list(&self) -> FormFoldResult<Vec<SchemaSummary>> {
        let counts = self.db_ops.count_submissions_by_schema()?;
        let mut schemas = self.db_ops.list_schemas()?;
        schemas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(schemas
            .iter()
            .map(|schema| {
                SchemaSummary::from_schema(schema, counts.get(&schema.id).copied().unwrap_or(0))
            })
            .collect())
    }

    /// Deletes a schema and everything hanging off it, in dependency
    /// order: export artifacts, then submissions with their attachment
    /// bytes, then the schema row and its share token. Individual
    /// failures are counted and the cascade continues.
    pub fn delete(&self, schema_id: &str) -> FormFoldResult<SchemaDeleteReport> {
        let schema = self.get(schema_id)?;
        let mut report = SchemaDeleteReport::default();

        for job in self.db_ops.list_export_jobs_for_schema(schema_id)? {
            if self.file_store.delete(Path::new(&job.path)).is_err() {
                warn!("failed to delete export file {}", job.path);
                report.failures += 1;
            }
            match self.db_ops.delete_export_job(&job.id) {
                Ok(true) => report.exports_deleted += 1,
                Ok(false) => {}
                Err(_) => report.failures += 1,
            }
        }

        for submission in self.db_ops.list_submissions_for_schema(schema_id)? {
            match self.db_ops.attachments_for_submission(&submission.id) {
                Ok(attachments) => {
                    for attachment in &attachments {
                        if self
                            .file_store
                            .delete(Path::new(&attachment.stored_path))
                            .is_err()
                        {
                            warn!(
                                "failed to delete attachment file {}",
                                attachment.stored_path
                            );
                            report.failures += 1;
                        }
                    }
                }
                Err(_) => report.failures += 1,
            }
            match self
                .db_ops
                .delete_attachments_for_submission(&submission.id)
            {
                Ok(count) => report.attachments_deleted += count,
                Err(_) => report.failures += 1,
            }
            match self.db_ops.delete_submission(&submission.id) {
                Ok(true) => report.submissions_deleted += 1,
                Ok(false) => {}
                Err(_) => report.failures += 1,
            }
        }

        self.db_ops.delete_share_token(&schema.share_token)?;
        self.db_ops.delete_schema(schema_id)?;
        info!(
            "deleted schema {}: {} submissions, {} attachments, {} exports, {} failures",
            schema_id,
            report.submissions_deleted,
            report.attachments_deleted,
            report.exports_deleted,
            report.failures
        );
        Ok(report)
    }

    /// Generates a share token, retrying against the uniqueness index a
    /// bounded number of times.
    fn generate_unique_token(&self) -> FormFoldResult<String> {
        for _ in 0..self.token_max_retries {
            let token: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(self.token_length)
                .map(char::from)
                .collect();
            if !self.db_ops.share_token_exists(&token)? {
                return Ok(token);
            }
        }
        Err(FormFoldError::Conflict(format!(
            "Could not generate a unique share token after {} attempts",
            self.token_max_retries
        )))
    }
}
