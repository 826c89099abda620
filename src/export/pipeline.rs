//! CSV export generation.
//!
//! Projects a schema's field configuration plus a filtered submission set
//! into a CSV artifact on disk, and records the export job that governs
//! its remaining lifecycle. Artifacts are written to a temporary path and
//! renamed into place, so a half-written file is never servable.

use crate::config::FormFoldConfig;
use crate::db_operations::DbOperations;
use crate::error::{FormFoldError, FormFoldResult};
use crate::export::types::ExportJob;
use crate::fields::FieldDefinition;
use crate::schema::resolver;
use crate::storage::{sanitize_name, FileStore};
use crate::submission::types::{FileAttachment, Submission, SubmissionFilter};
use crate::submission::SubmissionStore;
use chrono::Utc;
use log::{info, warn};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub struct ExportPipeline {
    db_ops: Arc<DbOperations>,
    submissions: Arc<SubmissionStore>,
    file_store: Arc<dyn FileStore>,
    exports_dir: std::path::PathBuf,
    download_base_url: String,
    export_ttl_secs: i64,
}

impl ExportPipeline {
    pub fn new(
        db_ops: Arc<DbOperations>,
        submissions: Arc<SubmissionStore>,
        file_store: Arc<dyn FileStore>,
        config: &FormFoldConfig,
    ) -> Self {
        Self {
            db_ops,
            submissions,
            file_store,
            exports_dir: config.exports_dir.clone(),
            download_base_url: config.download_base_url.clone(),
            export_ttl_secs: config.export_ttl_secs,
        }
    }

    /// Generates a CSV artifact for a schema's filtered submissions and
    /// records the export job.
    ///
    /// The row set and order are exactly those of the unpaginated listing
    /// under the same filter. An empty set still produces a header-only
    /// file.
    pub fn build_export(
        &self,
        schema_id: &str,
        filter: &SubmissionFilter,
    ) -> FormFoldResult<ExportJob> {
        let schema = self
            .db_ops
            .get_schema(schema_id)?
            .ok_or_else(|| FormFoldError::NotFound(format!("Schema {} not found", schema_id)))?;
        let submissions = self.submissions.list_all(schema_id, filter)?;

        let filename = export_filename(&schema.title);
        self.file_store.ensure_dir(&self.exports_dir)?;
        let path = self.exports_dir.join(&filename);
        let tmp_path = self.exports_dir.join(format!("{}.tmp", filename));

        let file_fields: Vec<&FieldDefinition> = schema.file_like_fields().collect();
        if let Err(e) = self.write_artifact(&tmp_path, &schema.fields, &file_fields, &submissions) {
            // a failed write never leaves a staging file behind
            let _ = self.file_store.delete(&tmp_path);
            return Err(e);
        }
        std::fs::rename(&tmp_path, &path)?;

        let job = ExportJob::new(
            schema_id,
            &filename,
            path.to_string_lossy().to_string(),
            self.export_ttl_secs,
        );
        self.db_ops.store_export_job(&job)?;
        info!(
            "built export {} for schema {}: {} rows",
            job.id,
            schema_id,
            submissions.len()
        );
        Ok(job)
    }

    /// Streams the header and all rows into the staging file. A failure
    /// here aborts the export; the caller owns staging-file cleanup.
    fn write_artifact(
        &self,
        tmp_path: &Path,
        fields: &[FieldDefinition],
        file_fields: &[&FieldDefinition],
        submissions: &[Submission],
    ) -> FormFoldResult<()> {
        let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(tmp_path)?));
        self.write_header(&mut writer, fields, file_fields)?;
        for submission in submissions {
            // one unreadable attachment row degrades to empty file cells,
            // never a failed export
            let attachments = match self.db_ops.attachments_for_submission(&submission.id) {
                Ok(attachments) => attachments,
                Err(e) => {
                    warn!(
                        "export: attachments for submission {} unreadable, emitting empty file cells: {}",
                        submission.id, e
                    );
                    Vec::new()
                }
            };
            self.write_row(&mut writer, submission, fields, file_fields, &attachments)?;
        }
        writer
            .flush()
            .map_err(|e| FormFoldError::Storage(format!("Failed to flush export: {}", e)))?;
        writer
            .into_inner()
            .map_err(|e| FormFoldError::Storage(format!("Failed to finish export: {}", e)))?
            .flush()?;
        Ok(())
    }

    fn write_header<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        fields: &[FieldDefinition],
        file_fields: &[&FieldDefinition],
    ) -> FormFoldResult<()> {
        let mut header = vec![
            "Submission ID".to_string(),
            "Submitted At".to_string(),
            "IP Address".to_string(),
        ];
        for field in fields {
            header.push(resolver::header_text(field).to_string());
        }
        for field in file_fields {
            header.push(format!("{} - Download URL", resolver::header_text(field)));
        }
        writer
            .write_record(&header)
            .map_err(|e| FormFoldError::Storage(format!("Failed to write export header: {}", e)))
    }

    fn write_row<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        submission: &Submission,
        fields: &[FieldDefinition],
        file_fields: &[&FieldDefinition],
        attachments: &[FileAttachment],
    ) -> FormFoldResult<()> {
        let mut row = vec![
            submission.id.clone(),
            submission
                .submitted_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            submission.ip_address.clone(),
        ];
        for field in fields {
            let cell = resolver::lookup_value(&submission.values, field)
                .map(value_to_cell)
                .unwrap_or_default();
            row.push(cell);
        }
        for field in file_fields {
            // first matching attachment wins; no attachment is an empty cell
            let url = attachments
                .iter()
                .find(|a| resolver::attachment_matches(field, &a.field_ref))
                .map(|a| self.download_url(a))
                .unwrap_or_default();
            row.push(url);
        }
        writer
            .write_record(&row)
            .map_err(|e| FormFoldError::Storage(format!("Failed to write export row: {}", e)))
    }

    /// The public download link for an attachment, as emitted into export
    /// cells.
    pub fn download_url(&self, attachment: &FileAttachment) -> String {
        format!(
            "{}/{}/download",
            self.download_base_url.trim_end_matches('/'),
            attachment.id
        )
    }
}

/// Renders a submission value into one CSV cell. Multi-select arrays are
/// joined with a comma and space; everything else is its plain text form.
fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_cell)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// `{sanitized title}_{timestamp}_{random}.csv`, never empty even for a
/// title with no usable characters.
fn export_filename(title: &str) -> String {
    let stem = {
        let sanitized = sanitize_name(title);
        if sanitized.is_empty() {
            "export".to_string()
        } else {
            sanitized
        }
    };
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!(
        "{}_{}_{}.csv",
        stem,
        Utc::now().format("%Y%m%d_%H%M%S"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;
    use crate::schema::types::FormSettings;
    use crate::schema::SchemaStore;
    use crate::storage::{FileStore, LocalFileStore};
    use crate::submission::types::FileClaim;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Fixture {
        schemas: SchemaStore,
        submissions: Arc<SubmissionStore>,
        pipeline: ExportPipeline,
        db_ops: Arc<DbOperations>,
        // keeps the storage directories alive for the test's duration
        temp_dir: TempDir,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = FormFoldConfig::rooted_at(temp_dir.path());
        let db = sled::Config::new().temporary(true).open().unwrap();
        let db_ops = Arc::new(DbOperations::new(db).unwrap());
        let file_store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
        let submissions = Arc::new(SubmissionStore::new(
            Arc::clone(&db_ops),
            Arc::clone(&file_store),
            &config,
        ));
        Fixture {
            schemas: SchemaStore::new(Arc::clone(&db_ops), Arc::clone(&file_store), &config),
            pipeline: ExportPipeline::new(
                Arc::clone(&db_ops),
                Arc::clone(&submissions),
                file_store,
                &config,
            ),
            submissions,
            db_ops,
            temp_dir,
        }
    }

    fn read_csv(path: &str) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn export_projects_fields_and_joins_checkbox_values() {
        let fx = fixture();
        let schema = fx.schemas.create("Event Signup", "").unwrap();
        let name = FieldDefinition::new(FieldType::Text, "Name");
        let days = FieldDefinition::new(FieldType::Checkbox, "Days")
            .with_options(vec!["Mon".into(), "Tue".into(), "Wed".into()]);
        let schema = fx
            .schemas
            .replace_config(
                &schema.id,
                vec![name.clone(), days.clone()],
                FormSettings::default(),
            )
            .unwrap();

        fx.submissions
            .insert(
                &schema.id,
                HashMap::from([
                    (name.id.clone(), json!("Alice")),
                    (days.id.clone(), json!(["Mon", "Wed"])),
                ]),
                Vec::new(),
                "10.0.0.1",
                "ua",
            )
            .unwrap();

        let job = fx
            .pipeline
            .build_export(&schema.id, &SubmissionFilter::default())
            .unwrap();
        let rows = read_csv(&job.path);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec!["Submission ID", "Submitted At", "IP Address", "Name", "Days"]
        );
        assert_eq!(rows[1][2], "10.0.0.1");
        assert_eq!(rows[1][3], "Alice");
        assert_eq!(rows[1][4], "Mon, Wed");
        assert!(job.filename.starts_with("Event_Signup_"));
        assert!(job.filename.ends_with(".csv"));
    }

    #[test]
    fn file_fields_add_trailing_download_url_columns() {
        let fx = fixture();
        let schema = fx.schemas.create("Applications", "").unwrap();
        let photo = FieldDefinition::new(FieldType::Photo, "Portrait");
        let schema = fx
            .schemas
            .replace_config(&schema.id, vec![photo.clone()], FormSettings::default())
            .unwrap();

        let staged = fx
            .submissions
            .stage_upload("me.png", "image/png", b"png")
            .unwrap();
        fx.submissions
            .insert(
                &schema.id,
                HashMap::new(),
                vec![FileClaim {
                    field_ref: photo.id.clone(),
                    token: staged.token,
                }],
                "ip",
                "ua",
            )
            .unwrap();

        let job = fx
            .pipeline
            .build_export(&schema.id, &SubmissionFilter::default())
            .unwrap();
        let rows = read_csv(&job.path);
        assert_eq!(rows[0][3], "Portrait");
        assert_eq!(rows[0][4], "Portrait - Download URL");
        assert!(rows[1][4].starts_with("/files/"));
        assert!(rows[1][4].ends_with("/download"));
    }

    #[test]
    fn empty_submission_set_yields_header_only_file() {
        let fx = fixture();
        let schema = fx.schemas.create("Empty", "").unwrap();
        let job = fx
            .pipeline
            .build_export(&schema.id, &SubmissionFilter::default())
            .unwrap();
        let rows = read_csv(&job.path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["Submission ID", "Submitted At", "IP Address"]);
        // no stray temporary file left behind
        assert!(!std::path::Path::new(&format!("{}.tmp", job.path)).exists());
    }

    #[test]
    fn filter_limits_exported_rows_to_the_listing_set() {
        let fx = fixture();
        let schema = fx.schemas.create("Filtered", "").unwrap();
        let name = FieldDefinition::new(FieldType::Text, "Name");
        let schema = fx
            .schemas
            .replace_config(&schema.id, vec![name.clone()], FormSettings::default())
            .unwrap();
        for value in ["alpha", "beta"] {
            fx.submissions
                .insert(
                    &schema.id,
                    HashMap::from([(name.id.clone(), json!(value))]),
                    Vec::new(),
                    "ip",
                    "ua",
                )
                .unwrap();
        }

        let filter = SubmissionFilter {
            search: Some("alpha".to_string()),
            ..Default::default()
        };
        let job = fx.pipeline.build_export(&schema.id, &filter).unwrap();
        let rows = read_csv(&job.path);
        assert_eq!(rows.len() - 1, fx.submissions.list_all(&schema.id, &filter).unwrap().len());
        assert_eq!(rows[1][3], "alpha");
    }

    #[test]
    fn unreadable_attachment_rows_degrade_to_empty_cells() {
        let fx = fixture();
        let schema = fx.schemas.create("Uploads", "").unwrap();
        let photo = FieldDefinition::new(FieldType::Photo, "Portrait");
        let name = FieldDefinition::new(FieldType::Text, "Name");
        let schema = fx
            .schemas
            .replace_config(
                &schema.id,
                vec![name.clone(), photo.clone()],
                FormSettings::default(),
            )
            .unwrap();

        let submission = fx
            .submissions
            .insert(
                &schema.id,
                HashMap::from([(name.id.clone(), json!("Ada"))]),
                Vec::new(),
                "ip",
                "ua",
            )
            .unwrap();
        // corrupt attachment row under this submission's key prefix
        fx.db_ops
            .attachments_tree
            .insert(
                format!("{}:junk", submission.id).as_bytes(),
                &b"not json"[..],
            )
            .unwrap();

        let job = fx
            .pipeline
            .build_export(&schema.id, &SubmissionFilter::default())
            .unwrap();
        let rows = read_csv(&job.path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][3], "Ada");
        // the file-URL cell for the unreadable row is empty, not an error
        assert_eq!(rows[1][5], "");
    }

    #[test]
    fn failed_directory_setup_records_no_job() {
        let fx = fixture();
        let schema = fx.schemas.create("Blocked", "").unwrap();
        // a regular file where the exports directory should be
        let exports_dir = fx.temp_dir.path().join("exports");
        std::fs::write(&exports_dir, b"in the way").unwrap();

        let result = fx
            .pipeline
            .build_export(&schema.id, &SubmissionFilter::default());
        assert!(result.is_err());
        assert!(fx.db_ops.list_export_jobs().unwrap().is_empty());
    }

    #[test]
    fn export_filename_falls_back_for_unusable_titles() {
        assert!(export_filename("***").starts_with("export_"));
        assert!(export_filename("My Form").starts_with("My_Form_"));
    }

    #[test]
    fn missing_schema_is_not_found() {
        let fx = fixture();
        let err = fx
            .pipeline
            .build_export("nope", &SubmissionFilter::default())
            .unwrap_err();
        assert!(matches!(err, FormFoldError::NotFound(_)));
    }
}
