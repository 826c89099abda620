//! FormSchema document types.

use crate::error::{FormFoldError, FormFoldResult};
use crate::fields::FieldDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Presentation settings for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Label on the submit button
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
    /// Message shown to the respondent after a successful submission
    #[serde(default = "default_success_message")]
    pub success_message: String,
    /// Whether one respondent may submit more than once
    #[serde(default = "default_allow_multiple")]
    pub allow_multiple: bool,
}

fn default_submit_label() -> String {
    "Submit".to_string()
}

fn default_success_message() -> String {
    "Thank you! Your response has been recorded.".to_string()
}

fn default_allow_multiple() -> bool {
    true
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            submit_label: default_submit_label(),
            success_message: default_success_message(),
            allow_multiple: default_allow_multiple(),
        }
    }
}

/// An admin-defined form: an ordered field list plus presentation settings,
/// identified publicly by a unique share token.
///
/// Owned exclusively by the [`SchemaStore`](crate::schema::SchemaStore);
/// mutation always goes through whole-config replace-and-persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Ordered field list; order drives rendering and export columns
    pub fields: Vec<FieldDefinition>,
    pub settings: FormSettings,
    pub is_active: bool,
    /// Fixed-length alphanumeric token, globally unique
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSchema {
    /// Creates an empty schema with the given share token. Token uniqueness
    /// is the store's responsibility.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        share_token: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            settings: FormSettings::default(),
            is_active: true,
            share_token,
            created_at: now,
            updated_at: now,
        }
    }

    /// Finds a field by its immutable id.
    pub fn field_by_id(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// The file-like fields in schema order.
    pub fn file_like_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.field_type.is_file_like())
    }

    /// Checks that field ids within the schema are unique. Run on every
    /// config replace.
    pub fn validate_field_ids(fields: &[FieldDefinition]) -> FormFoldResult<()> {
        let mut seen = HashSet::new();
        for field in fields {
            if field.id.is_empty() {
                return Err(FormFoldError::invalid_field(
                    &field.id,
                    "Field id cannot be empty",
                ));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(FormFoldError::invalid_field(
                    &field.id,
                    format!("Duplicate field id '{}'", field.id),
                ));
            }
        }
        Ok(())
    }
}

/// A schema listing entry, enriched with its submission count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub share_token: String,
    pub field_count: usize,
    pub submission_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchemaSummary {
    pub fn from_schema(schema: &FormSchema, submission_count: u64) -> Self {
        Self {
            id: schema.id.clone(),
            title: schema.title.clone(),
            description: schema.description.clone(),
            is_active: schema.is_active,
            share_token: schema.share_token.clone(),
            field_count: schema.fields.len(),
            submission_count,
            created_at: schema.created_at,
            updated_at: schema.updated_at,
        }
    }
}

/// Outcome of a cascading schema delete. Individual failures do not abort
/// the cascade; they are counted and reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDeleteReport {
    pub exports_deleted: u64,
    pub submissions_deleted: u64,
    pub attachments_deleted: u64,
    pub failures: u64,
}
