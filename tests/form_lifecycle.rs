//! End-to-end exercise of the form platform: build a form, publish it,
//! submit against it, export the data, and tear everything down.

mod test_utils;

use formfold::{
    FieldDefinition, FieldType, FileClaim, FormFoldError, FormSettings, SubmissionFilter,
    SubmissionStatus,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use test_utils::TestFixture;

fn registration_form(fx: &TestFixture) -> (String, Vec<FieldDefinition>) {
    let fold = &fx.fold;
    let schema = fold
        .schemas()
        .create("Conference Registration", "Sign up here")
        .unwrap();

    let fields = vec![
        FieldDefinition::new(FieldType::Text, "Full Name")
            .required()
            .with_name("full_name"),
        FieldDefinition::new(FieldType::Email, "Email").required(),
        FieldDefinition::new(FieldType::Checkbox, "Days").with_options(vec![
            "Mon".to_string(),
            "Tue".to_string(),
        ]),
        FieldDefinition::new(FieldType::Photo, "Badge Photo"),
    ];
    let schema = fold
        .schemas()
        .replace_config(&schema.id, fields.clone(), FormSettings::default())
        .unwrap();
    (schema.id, fields)
}

#[test]
fn full_form_lifecycle() {
    let fx = TestFixture::new();
    let fold = &fx.fold;
    let (schema_id, fields) = registration_form(&fx);
    let schema = fold.schemas().get(&schema_id).unwrap();

    // the public view resolves through the share token
    let public = fold.public_form(&schema.share_token).unwrap();
    assert_eq!(public.id, schema_id);
    assert_eq!(public.fields.len(), 4);

    // a bad submission reports every failure at once
    let err = fold
        .submit_by_token(
            &schema.share_token,
            HashMap::from([(fields[1].id.clone(), json!("not-an-email"))]),
            Vec::new(),
            "203.0.113.9",
            "integration-test",
        )
        .unwrap_err();
    let field_errors = err.field_errors().expect("validation error");
    assert_eq!(field_errors.len(), 2); // missing name + bad email

    // stage a photo ahead of the submission, then submit for real
    let staged = fold
        .submissions()
        .stage_upload("badge.png", "image/png", b"png-bytes")
        .unwrap();
    let submission = fold
        .submit_by_token(
            &schema.share_token,
            HashMap::from([
                ("full_name".to_string(), json!("Ada Lovelace")),
                (fields[1].id.clone(), json!("ada@example.com")),
                (fields[2].id.clone(), json!(["Mon", "Tue"])),
            ]),
            vec![FileClaim {
                field_ref: fields[3].id.clone(),
                token: staged.token.clone(),
            }],
            "203.0.113.9",
            "integration-test",
        )
        .unwrap();

    // values were normalized onto field ids regardless of submitted key
    assert_eq!(
        submission.values.get(&fields[0].id),
        Some(&json!("Ada Lovelace"))
    );
    // the staged upload was claimed: temp entry gone, attachment present
    assert!(fold
        .submissions()
        .get_staged_upload(&staged.token)
        .unwrap()
        .is_none());
    let detail = fold.submissions().get(&submission.id).unwrap();
    assert_eq!(detail.schema_title, "Conference Registration");
    assert_eq!(detail.attachments.len(), 1);
    assert_eq!(detail.attachments[0].original_filename, "badge.png");
    assert!(Path::new(&detail.attachments[0].stored_path).is_file());

    // listing sees it, status transitions persist
    let page = fold
        .submissions()
        .list(&schema_id, &SubmissionFilter::default(), 1, 10)
        .unwrap();
    assert_eq!(page.total, 1);
    fold.submissions()
        .set_status(&submission.id, SubmissionStatus::Processed)
        .unwrap();

    // export: header, one data row, download URL column for the photo
    let job = fold
        .build_export(&schema_id, &SubmissionFilter::default())
        .unwrap();
    let (job, bytes) = fold.export_lifecycle().download(&job.id).unwrap();
    assert_eq!(job.download_count, 1);
    let csv_text = String::from_utf8(bytes).unwrap();
    let mut lines = csv_text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Submission ID,Submitted At,IP Address"));
    assert!(header.contains("Badge Photo - Download URL"));
    let row = lines.next().unwrap();
    assert!(row.contains("Ada Lovelace"));
    assert!(row.contains("ada@example.com"));
    assert!(row.contains("\"Mon, Tue\""));
    assert!(row.contains("/download"));
    assert!(lines.next().is_none());

    // deleting the schema cascades: submissions, attachments, exports
    let report = fold.schemas().delete(&schema_id).unwrap();
    assert_eq!(report.submissions_deleted, 1);
    assert_eq!(report.attachments_deleted, 1);
    assert_eq!(report.exports_deleted, 1);
    assert_eq!(report.failures, 0);
    assert!(!Path::new(&detail.attachments[0].stored_path).exists());
    assert!(fold.schemas().get(&schema_id).is_err());
    assert!(fold.schemas().get_by_share_token(&schema.share_token).is_err());
    assert!(fold.export_lifecycle().get(&job.id).is_err());
}

#[test]
fn inactive_forms_are_invisible_to_the_public() {
    let fx = TestFixture::new();
    let fold = &fx.fold;
    let (schema_id, fields) = registration_form(&fx);
    let schema = fold.schemas().get(&schema_id).unwrap();

    fold.schemas().set_active(&schema_id, false).unwrap();
    assert!(matches!(
        fold.public_form(&schema.share_token),
        Err(FormFoldError::NotFound(_))
    ));
    let err = fold
        .submit(
            &schema_id,
            HashMap::from([
                (fields[0].id.clone(), json!("Ada")),
                (fields[1].id.clone(), json!("ada@example.com")),
            ]),
            Vec::new(),
            "ip",
            "ua",
        )
        .unwrap_err();
    assert!(matches!(err, FormFoldError::NotFound(_)));

    // the admin side still sees the schema
    assert!(fold.schemas().get(&schema_id).is_ok());
}

#[test]
fn maintenance_sweep_reclaims_stale_artifacts() {
    let fx = TestFixture::new();
    let fold = &fx.fold;
    let (schema_id, _) = registration_form(&fx);

    // a fresh export and a fresh staged upload survive the sweep
    fold.build_export(&schema_id, &SubmissionFilter::default())
        .unwrap();
    let staged = fold
        .submissions()
        .stage_upload("keep.png", "image/png", b"x")
        .unwrap();

    let (exports_swept, uploads_swept) = fx.fold.maintenance_sweep().unwrap();
    assert_eq!(exports_swept, 0);
    assert_eq!(uploads_swept, 0);
    assert!(fold
        .submissions()
        .get_staged_upload(&staged.token)
        .unwrap()
        .is_some());
    assert_eq!(fold.export_lifecycle().stats(None).unwrap().active, 1);
}

#[test]
fn historic_values_survive_field_renames() {
    let fx = TestFixture::new();
    let fold = &fx.fold;
    let (schema_id, fields) = registration_form(&fx);

    let submission = fold
        .submit(
            &schema_id,
            HashMap::from([
                (fields[0].id.clone(), json!("Grace Hopper")),
                (fields[1].id.clone(), json!("grace@example.com")),
            ]),
            Vec::new(),
            "ip",
            "ua",
        )
        .unwrap();

    // relabel the name field; its id is immutable
    let mut renamed = fields[0].clone();
    renamed.label = "Attendee Name".to_string();
    fold.schemas().update_field(&schema_id, renamed).unwrap();

    // the stored value still resolves, and the export header follows the
    // new label
    let detail = fold.submissions().get(&submission.id).unwrap();
    assert_eq!(
        detail.submission.values.get(&fields[0].id),
        Some(&json!("Grace Hopper"))
    );
    let job = fold
        .build_export(&schema_id, &SubmissionFilter::default())
        .unwrap();
    let (_, bytes) = fold.export_lifecycle().download(&job.id).unwrap();
    let csv_text = String::from_utf8(bytes).unwrap();
    assert!(csv_text.lines().next().unwrap().contains("Attendee Name"));
    assert!(csv_text.contains("Grace Hopper"));
}
