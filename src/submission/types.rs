//! Submission, attachment and pre-upload record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Processed,
    Archived,
}

/// One respondent's filled-in data against a form schema.
///
/// The value map is schema-less: keys are field references (ids for
/// anything written by this system; possibly names or labels in historical
/// data), values are whatever JSON the form emitted. Reads go through the
/// identity resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub schema_id: String,
    pub values: HashMap<String, Value>,
    pub submitted_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    #[serde(default)]
    pub status: SubmissionStatus,
}

impl Submission {
    pub fn new(
        schema_id: impl Into<String>,
        values: HashMap<String, Value>,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            schema_id: schema_id.into(),
            values,
            submitted_at: Utc::now(),
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            status: SubmissionStatus::Pending,
        }
    }

    /// The serialized value map, used for coarse free-text search.
    pub fn serialized_values(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_default()
    }
}

/// A file uploaded as part of a submission's file-like field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub id: String,
    pub submission_id: String,
    /// The field reference the upload was submitted against (id or name)
    pub field_ref: String,
    pub original_filename: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub mime_type: String,
    /// sha256 of the file contents, hex-encoded
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A file staged before its owning submission exists, keyed by an opaque
/// token. Claimed into a [`FileAttachment`] at submission time; unclaimed
/// entries past the TTL are garbage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempUpload {
    pub token: String,
    pub original_filename: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content_hash: String,
    pub staged_at: DateTime<Utc>,
}

impl TempUpload {
    pub fn metadata(&self) -> crate::fields::FileMetadata {
        crate::fields::FileMetadata {
            original_filename: self.original_filename.clone(),
            size_bytes: self.size_bytes,
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Ties a staged pre-upload to the field it was uploaded for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileClaim {
    pub field_ref: String,
    pub token: String,
}

/// Listing filters. Free-text search is a substring match over the raw
/// serialized value map, not field-aware; documented coarse behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionFilter {
    pub search: Option<String>,
    pub submitted_after: Option<DateTime<Utc>>,
    pub submitted_before: Option<DateTime<Utc>>,
}

impl SubmissionFilter {
    /// The single predicate shared by paginated and unpaginated listings,
    /// so counts always agree.
    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(after) = self.submitted_after {
            if submission.submitted_at < after {
                return false;
            }
        }
        if let Some(before) = self.submitted_before {
            if submission.submitted_at > before {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !needle.is_empty()
                && !submission
                    .serialized_values()
                    .to_lowercase()
                    .contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// One page of a filtered submission listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub items: Vec<Submission>,
    /// Total matching submissions across all pages
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}

/// A submission joined with its schema's title and field configuration,
/// for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub schema_title: String,
    pub fields: Vec<crate::fields::FieldDefinition>,
    pub attachments: Vec<FileAttachment>,
}

/// Per-item outcome counts for a bulk delete. Individual failures never
/// abort the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteReport {
    pub deleted: u64,
    pub failed: u64,
}
