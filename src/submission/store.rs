//! The submission store: persisting respondent data and attachments,
//! filtered listing, and deletion.

use crate::config::FormFoldConfig;
use crate::db_operations::DbOperations;
use crate::error::{FormFoldError, FormFoldResult};
use crate::schema::resolver;
use crate::submission::types::{
    BulkDeleteReport, FileAttachment, FileClaim, Submission, SubmissionDetail, SubmissionFilter,
    SubmissionPage, SubmissionStatus,
};
use crate::storage::FileStore;
use chrono::Utc;
use log::{info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub struct SubmissionStore {
    pub(crate) db_ops: Arc<DbOperations>,
    pub(crate) file_store: Arc<dyn FileStore>,
    pub(crate) uploads_dir: PathBuf,
    pub(crate) temp_uploads_dir: PathBuf,
    pub(crate) temp_upload_ttl_secs: i64,
}

impl SubmissionStore {
    pub fn new(
        db_ops: Arc<DbOperations>,
        file_store: Arc<dyn FileStore>,
        config: &FormFoldConfig,
    ) -> Self {
        Self {
            db_ops,
            file_store,
            uploads_dir: config.uploads_dir.clone(),
            temp_uploads_dir: config.temp_uploads_dir.clone(),
            temp_upload_ttl_secs: config.temp_upload_ttl_secs,
        }
    }

    /// Persists a submission and claims its staged uploads.
    ///
    /// Values are re-keyed by immutable field id wherever the schema can
    /// resolve them; keys the schema no longer knows are kept verbatim so
    /// historical data survives schema edits. Staged files are moved out
    /// of the temporary area and recorded as attachments.
    pub fn insert(
        &self,
        schema_id: &str,
        values: HashMap<String, Value>,
        files: Vec<FileClaim>,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> FormFoldResult<Submission> {
        let schema = self
            .db_ops
            .get_schema(schema_id)?
            .ok_or_else(|| FormFoldError::NotFound(format!("Schema {} not found", schema_id)))?;

        // Claim staged uploads before anything is persisted, so a stale
        // token aborts the submission without leaving a partial record.
        let mut claimed = Vec::with_capacity(files.len());
        for claim in &files {
            let upload = self.db_ops.get_temp_upload(&claim.token)?.ok_or_else(|| {
                FormFoldError::NotFound(format!("Uploaded file {} not found", claim.token))
            })?;
            claimed.push((claim.clone(), upload));
        }

        // Re-key by field id going forward; the resolver's fallback read
        // path covers anything already stored under a name or label.
        let mut stored_values = HashMap::new();
        let mut consumed: HashSet<String> = HashSet::new();
        for field in &schema.fields {
            if let Some(value) = resolver::lookup_value(&values, field) {
                stored_values.insert(field.id.clone(), value.clone());
                consumed.insert(field.id.clone());
                if let Some(name) = &field.name {
                    consumed.insert(name.clone());
                }
                consumed.insert(field.label.clone());
            }
        }
        for (key, value) in values {
            if !consumed.contains(&key) {
                stored_values.entry(key).or_insert(value);
            }
        }

        let submission = Submission::new(schema_id, stored_values, ip_address, user_agent);
        self.db_ops.store_submission(&submission)?;

        for (claim, upload) in claimed {
            let field_ref = schema
                .fields
                .iter()
                .find(|f| resolver::attachment_matches(f, &claim.field_ref))
                .map(|f| f.id.clone())
                .unwrap_or(claim.field_ref);

            match self.promote_temp_upload(&submission.id, &field_ref, &upload) {
                Ok(()) => {}
                Err(e) => {
                    // The submission itself stands; a lost upload is logged
                    // and surfaced through the missing attachment row.
                    warn!(
                        "failed to claim upload {} for submission {}: {}",
                        upload.token, submission.id, e
                    );
                }
            }
        }

        info!(
            "stored submission {} for schema {}",
            submission.id, schema_id
        );
        Ok(submission)
    }

    /// Moves a staged upload into permanent storage and records the
    /// attachment row.
    fn promote_temp_upload(
        &self,
        submission_id: &str,
        field_ref: &str,
        upload: &crate::submission::types::TempUpload,
    ) -> FormFoldResult<()> {
        let bytes = self.file_store.read(Path::new(&upload.stored_path))?;
        let stored_path =
            self.file_store
                .store(&self.uploads_dir, &upload.original_filename, &bytes)?;

        let attachment = FileAttachment {
            id: Uuid::new_v4().to_string(),
            submission_id: submission_id.to_string(),
            field_ref: field_ref.to_string(),
            original_filename: upload.original_filename.clone(),
            stored_path: stored_path.to_string_lossy().to_string(),
            size_bytes: upload.size_bytes,
            mime_type: upload.mime_type.clone(),
            content_hash: upload.content_hash.clone(),
            uploaded_at: Utc::now(),
        };
        self.db_ops.store_attachment(&attachment)?;

        self.file_store.delete(Path::new(&upload.stored_path))?;
        self.db_ops.delete_temp_upload(&upload.token)?;
        Ok(())
    }

    /// Gets a submission joined with its schema's title and field config.
    pub fn get(&self, submission_id: &str) -> FormFoldResult<SubmissionDetail> {
        let submission = self.db_ops.get_submission(submission_id)?.ok_or_else(|| {
            FormFoldError::NotFound(format!("Submission {} not found", submission_id))
        })?;
        let schema = self.db_ops.get_schema(&submission.schema_id)?.ok_or_else(|| {
            FormFoldError::NotFound(format!("Schema {} not found", submission.schema_id))
        })?;
        let attachments = self.db_ops.attachments_for_submission(submission_id)?;
        Ok(SubmissionDetail {
            submission,
            schema_title: schema.title,
            fields: schema.fields,
            attachments,
        })
    }

    /// One page of a schema's submissions, newest first.
    pub fn list(
        &self,
        schema_id: &str,
        filter: &SubmissionFilter,
        page: usize,
        page_size: usize,
    ) -> FormFoldResult<SubmissionPage> {
        let all = self.filtered_sorted(schema_id, filter)?;
        let total = all.len() as u64;
        let page = page.max(1);
        let page_size = page_size.max(1);
        let items = all
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Ok(SubmissionPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// The full filtered set, in the same order and under the same
    /// predicate as [`list`](Self::list). Used by the export pipeline so
    /// counts always agree with the paginated view.
    pub fn list_all(
        &self,
        schema_id: &str,
        filter: &SubmissionFilter,
    ) -> FormFoldResult<Vec<Submission>> {
        self.filtered_sorted(schema_id, filter)
    }

    fn filtered_sorted(
        &self,
        schema_id: &str,
        filter: &SubmissionFilter,
    ) -> FormFoldResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .db_ops
            .list_submissions_for_schema(schema_id)?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect();
        submissions.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(submissions)
    }

    /// Sets a submission's lifecycle status.
    pub fn set_status(
        &self,
        submission_id: &str,
        status: SubmissionStatus,
    ) -> FormFoldResult<Submission> {
        let mut submission = self.db_ops.get_submission(submission_id)?.ok_or_else(|| {
            FormFoldError::NotFound(format!("Submission {} not found", submission_id))
        })?;
        submission.status = status;
        self.db_ops.store_submission(&submission)?;
        Ok(submission)
    }

    /// Lists a submission's file attachments.
    pub fn attachments(&self, submission_id: &str) -> FormFoldResult<Vec<FileAttachment>> {
        self.db_ops.attachments_for_submission(submission_id)
    }

    /// Deletes a submission: attachment bytes first, then the attachment
    /// rows, then the submission row.
    pub fn delete(&self, submission_id: &str) -> FormFoldResult<()> {
        let existed = self.db_ops.get_submission(submission_id)?.is_some();
        if !existed {
            return Err(FormFoldError::NotFound(format!(
                "Submission {} not found",
                submission_id
            )));
        }

        for attachment in self.db_ops.attachments_for_submission(submission_id)? {
            if self
                .file_store
                .delete(Path::new(&attachment.stored_path))
                .is_err()
            {
                warn!(
                    "failed to delete attachment file {}",
                    attachment.stored_path
                );
            }
        }
        self.db_ops.delete_attachments_for_submission(submission_id)?;
        self.db_ops.delete_submission(submission_id)?;
        Ok(())
    }

    /// Deletes a batch of submissions, continuing past individual
    /// failures and reporting per-item outcome counts.
    pub fn bulk_delete(&self, submission_ids: &[String]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for id in submission_ids {
            match self.delete(id) {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("bulk delete: submission {} failed: {}", id, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
