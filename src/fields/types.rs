//! Field definition types shared by the schema store, submission store and
//! export pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default size cap for photo uploads (5 MB)
pub const DEFAULT_PHOTO_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Default size cap for signature uploads (2 MB)
pub const DEFAULT_SIGNATURE_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// The supported field variants.
///
/// Serialized with the wire tags the form builder emits (`aadhar-id` for
/// the structured national-id type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    #[serde(rename = "aadhar-id")]
    Aadhar,
    Select,
    Radio,
    Checkbox,
    File,
    Photo,
    Signature,
}

impl FieldType {
    /// Whether submissions for this field carry a file upload rather than
    /// an inline value. File-like fields get a trailing download-URL column
    /// in CSV exports.
    pub fn is_file_like(&self) -> bool {
        matches!(self, FieldType::File | FieldType::Photo | FieldType::Signature)
    }

    /// Built-in upload size cap for types that have one. Generic file
    /// fields are capped per field configuration instead.
    pub fn default_max_size_bytes(&self) -> Option<u64> {
        match self {
            FieldType::Photo => Some(DEFAULT_PHOTO_MAX_BYTES),
            FieldType::Signature => Some(DEFAULT_SIGNATURE_MAX_BYTES),
            _ => None,
        }
    }

    /// Whether uploads for this type must carry an image MIME type.
    pub fn requires_image_mime(&self) -> bool {
        matches!(self, FieldType::Photo | FieldType::Signature)
    }

    /// The wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Aadhar => "aadhar-id",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::File => "file",
            FieldType::Photo => "photo",
            FieldType::Signature => "signature",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured input within a form schema.
///
/// Modeled as a flat struct with optional members rather than an enum per
/// type so the JSON the builder UI emits round-trips unchanged. The id is
/// generated once and never changes; the label is a human string that may
/// be edited freely, and `name` preserves the machine name emitted by
/// older builder versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Generated identifier, stable for the lifetime of the field
    pub id: String,
    /// Field variant
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display label shown to respondents
    pub label: String,
    /// Machine name, when the builder emitted one distinct from the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether a value must be present on submission
    #[serde(default)]
    pub required: bool,

    // Type-specific configuration. Only the members relevant to the
    // field's type are populated; the rest stay at their defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub allow_crop: bool,
}

impl FieldDefinition {
    /// Creates a field of the given type with a freshly generated id.
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: generate_field_id(),
            field_type,
            label: label.into(),
            name: None,
            required: false,
            placeholder: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            options: Vec::new(),
            allowed_extensions: Vec::new(),
            max_size_bytes: None,
            aspect_ratio: None,
            allow_crop: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// The effective upload size cap for this field, falling back to the
    /// type's built-in default.
    pub fn effective_max_size_bytes(&self) -> Option<u64> {
        self.max_size_bytes
            .or_else(|| self.field_type.default_max_size_bytes())
    }
}

/// Generates a field id: a `field_` prefix plus a short random segment.
pub fn generate_field_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("field_{}", &uuid[..8])
}

/// Metadata describing an uploaded file, used for validation before any
/// attachment record exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub original_filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl FileMetadata {
    /// The lowercased filename extension, if there is one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.original_filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_wire_tags_round_trip() {
        for field_type in [
            FieldType::Text,
            FieldType::Email,
            FieldType::Number,
            FieldType::Aadhar,
            FieldType::Select,
            FieldType::Radio,
            FieldType::Checkbox,
            FieldType::File,
            FieldType::Photo,
            FieldType::Signature,
        ] {
            let encoded = serde_json::to_string(&field_type).unwrap();
            let decoded: FieldType = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, field_type);
        }
        assert_eq!(
            serde_json::to_string(&FieldType::Aadhar).unwrap(),
            "\"aadhar-id\""
        );
    }

    #[test]
    fn field_definition_round_trips_ids_types_and_options() {
        let field = FieldDefinition::new(FieldType::Select, "Department")
            .required()
            .with_options(vec!["HR".to_string(), "Finance".to_string()]);
        let encoded = serde_json::to_string(&field).unwrap();
        let decoded: FieldDefinition = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, field.id);
        assert_eq!(decoded.field_type, field.field_type);
        assert_eq!(decoded.options, field.options);
        assert_eq!(decoded, field);
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = generate_field_id();
        let b = generate_field_id();
        assert!(a.starts_with("field_"));
        assert_eq!(a.len(), "field_".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn file_like_predicate() {
        assert!(FieldType::File.is_file_like());
        assert!(FieldType::Photo.is_file_like());
        assert!(FieldType::Signature.is_file_like());
        assert!(!FieldType::Text.is_file_like());
        assert!(!FieldType::Checkbox.is_file_like());
    }

    #[test]
    fn size_caps_fall_back_to_type_defaults() {
        let photo = FieldDefinition::new(FieldType::Photo, "Portrait");
        assert_eq!(
            photo.effective_max_size_bytes(),
            Some(DEFAULT_PHOTO_MAX_BYTES)
        );

        let mut file = FieldDefinition::new(FieldType::File, "Resume");
        assert_eq!(file.effective_max_size_bytes(), None);
        file.max_size_bytes = Some(1024);
        assert_eq!(file.effective_max_size_bytes(), Some(1024));
    }

    #[test]
    fn extension_is_lowercased() {
        let file = FileMetadata {
            original_filename: "Resume.PDF".to_string(),
            size_bytes: 100,
            mime_type: "application/pdf".to_string(),
        };
        assert_eq!(file.extension().as_deref(), Some("pdf"));
    }
}
