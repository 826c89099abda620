//! Submission, attachment and pre-upload persistence.
//!
//! Submissions are keyed by their id; attachments are keyed
//! `"{submission_id}:{attachment_id}"` so one prefix scan fetches a
//! submission's files. Pre-uploads are keyed by their opaque token.

use super::core::DbOperations;
use crate::error::FormFoldResult;
use crate::submission::types::{FileAttachment, Submission, TempUpload};
use std::collections::HashMap;

impl DbOperations {
    /// Stores a submission record
    pub fn store_submission(&self, submission: &Submission) -> FormFoldResult<()> {
        self.store_in_tree(&self.submissions_tree, &submission.id, submission)
    }

    /// Gets a submission by id
    pub fn get_submission(&self, submission_id: &str) -> FormFoldResult<Option<Submission>> {
        self.get_from_tree(&self.submissions_tree, submission_id)
    }

    /// Deletes a submission row
    pub fn delete_submission(&self, submission_id: &str) -> FormFoldResult<bool> {
        self.delete_from_tree(&self.submissions_tree, submission_id)
    }

    /// Lists every submission belonging to a schema
    pub fn list_submissions_for_schema(&self, schema_id: &str) -> FormFoldResult<Vec<Submission>> {
        let items: Vec<(String, Submission)> = self.list_items_in_tree(&self.submissions_tree)?;
        Ok(items
            .into_iter()
            .map(|(_, submission)| submission)
            .filter(|submission| submission.schema_id == schema_id)
            .collect())
    }

    /// Counts submissions per schema in one pass, for listing enrichment
    pub fn count_submissions_by_schema(&self) -> FormFoldResult<HashMap<String, u64>> {
        let items: Vec<(String, Submission)> = self.list_items_in_tree(&self.submissions_tree)?;
        let mut counts = HashMap::new();
        for (_, submission) in items {
            *counts.entry(submission.schema_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Stores a file attachment under its submission's key prefix
    pub fn store_attachment(&self, attachment: &FileAttachment) -> FormFoldResult<()> {
        let key = format!("{}:{}", attachment.submission_id, attachment.id);
        self.store_in_tree(&self.attachments_tree, &key, attachment)
    }

    /// Lists a submission's file attachments
    pub fn attachments_for_submission(
        &self,
        submission_id: &str,
    ) -> FormFoldResult<Vec<FileAttachment>> {
        self.list_items_with_prefix(&self.attachments_tree, &format!("{}:", submission_id))
    }

    /// Removes all attachment rows for a submission, returning the count
    pub fn delete_attachments_for_submission(&self, submission_id: &str) -> FormFoldResult<u64> {
        self.delete_items_with_prefix(&self.attachments_tree, &format!("{}:", submission_id))
    }

    /// Stores a staged pre-upload keyed by its token
    pub fn store_temp_upload(&self, upload: &TempUpload) -> FormFoldResult<()> {
        self.store_in_tree(&self.temp_uploads_tree, &upload.token, upload)
    }

    /// Gets a staged pre-upload by token
    pub fn get_temp_upload(&self, token: &str) -> FormFoldResult<Option<TempUpload>> {
        self.get_from_tree(&self.temp_uploads_tree, token)
    }

    /// Deletes a staged pre-upload row
    pub fn delete_temp_upload(&self, token: &str) -> FormFoldResult<bool> {
        self.delete_from_tree(&self.temp_uploads_tree, token)
    }

    /// Lists all staged pre-uploads, for the garbage sweep
    pub fn list_temp_uploads(&self) -> FormFoldResult<Vec<TempUpload>> {
        let items: Vec<(String, TempUpload)> = self.list_items_in_tree(&self.temp_uploads_tree)?;
        Ok(items.into_iter().map(|(_, upload)| upload).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_db() -> DbOperations {
        let db = sled::Config::new().temporary(true).open().unwrap();
        DbOperations::new(db).unwrap()
    }

    fn attachment(submission_id: &str, field_ref: &str) -> FileAttachment {
        FileAttachment {
            id: uuid::Uuid::new_v4().to_string(),
            submission_id: submission_id.to_string(),
            field_ref: field_ref.to_string(),
            original_filename: "photo.png".to_string(),
            stored_path: "/tmp/photo.png".to_string(),
            size_bytes: 100,
            mime_type: "image/png".to_string(),
            content_hash: "deadbeef".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn submissions_filtered_by_schema() {
        let ops = test_db();
        for schema in ["schema-a", "schema-a", "schema-b"] {
            let submission = Submission::new(schema, HashMap::new(), "ip", "ua");
            ops.store_submission(&submission).unwrap();
        }
        assert_eq!(ops.list_submissions_for_schema("schema-a").unwrap().len(), 2);
        assert_eq!(ops.list_submissions_for_schema("schema-b").unwrap().len(), 1);

        let counts = ops.count_submissions_by_schema().unwrap();
        assert_eq!(counts.get("schema-a"), Some(&2));
        assert_eq!(counts.get("schema-b"), Some(&1));
    }

    #[test]
    fn attachments_scoped_to_their_submission() {
        let ops = test_db();
        ops.store_attachment(&attachment("sub-1", "field_a")).unwrap();
        ops.store_attachment(&attachment("sub-1", "field_b")).unwrap();
        ops.store_attachment(&attachment("sub-2", "field_a")).unwrap();

        assert_eq!(ops.attachments_for_submission("sub-1").unwrap().len(), 2);
        assert_eq!(ops.delete_attachments_for_submission("sub-1").unwrap(), 2);
        assert!(ops.attachments_for_submission("sub-1").unwrap().is_empty());
        assert_eq!(ops.attachments_for_submission("sub-2").unwrap().len(), 1);
    }

    #[test]
    fn temp_uploads_round_trip_by_token() {
        let ops = test_db();
        let upload = TempUpload {
            token: "tok-abc".to_string(),
            original_filename: "cv.pdf".to_string(),
            stored_path: "/tmp/cv.pdf".to_string(),
            size_bytes: 42,
            mime_type: "application/pdf".to_string(),
            content_hash: "cafe".to_string(),
            staged_at: Utc::now(),
        };
        ops.store_temp_upload(&upload).unwrap();
        assert_eq!(ops.get_temp_upload("tok-abc").unwrap(), Some(upload));
        assert_eq!(ops.list_temp_uploads().unwrap().len(), 1);
        assert!(ops.delete_temp_upload("tok-abc").unwrap());
        assert!(ops.get_temp_upload("tok-abc").unwrap().is_none());
    }
}
