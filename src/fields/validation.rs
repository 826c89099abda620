//! Pure validation functions for field values and file uploads.
//!
//! Validation has no side effects. Each field is validated independently
//! and [`validate_submission`] collects every failure before reporting, so
//! a submitter sees all problems at once rather than one per round trip.

use crate::error::FieldError;
use crate::fields::types::{FieldDefinition, FieldType, FileMetadata};
use crate::schema::resolver;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// RFC-lite email pattern: something, an @, something, a dot, something.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Whether a raw value counts as "no value": absent, null, blank string,
/// or an empty selection set.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validates a raw submitted value against a field definition and returns
/// the normalized value (trimmed string, finite number, array of selected
/// options). File-like fields are validated through [`validate_file`]
/// instead; their inline value normalizes to null.
pub fn validate_value(field: &FieldDefinition, raw: Option<&Value>) -> Result<Value, FieldError> {
    if field.field_type.is_file_like() {
        return Ok(Value::Null);
    }

    let empty = raw.map_or(true, is_empty_value);
    if empty {
        if field.required {
            return Err(required_error(field));
        }
        return Ok(Value::Null);
    }
    let raw = raw.expect("non-empty value is present");

    match field.field_type {
        FieldType::Text => {
            let text = string_value(field, raw)?;
            if let Some(min) = field.min_length {
                if text.chars().count() < min {
                    return Err(FieldError::new(
                        &field.id,
                        format!("Must be at least {} characters", min),
                    ));
                }
            }
            if let Some(max) = field.max_length {
                if text.chars().count() > max {
                    return Err(FieldError::new(
                        &field.id,
                        format!("Must be at most {} characters", max),
                    ));
                }
            }
            Ok(Value::String(text))
        }
        FieldType::Email => {
            let text = string_value(field, raw)?;
            if !EMAIL_RE.is_match(&text) {
                return Err(FieldError::new(&field.id, "Enter a valid email address"));
            }
            Ok(Value::String(text))
        }
        FieldType::Number => {
            let number = number_value(field, raw)?;
            if let Some(min) = field.min {
                if number < min {
                    return Err(FieldError::new(
                        &field.id,
                        format!("Must be at least {}", min),
                    ));
                }
            }
            if let Some(max) = field.max {
                if number > max {
                    return Err(FieldError::new(
                        &field.id,
                        format!("Must be at most {}", max),
                    ));
                }
            }
            let number = serde_json::Number::from_f64(number)
                .ok_or_else(|| FieldError::new(&field.id, "Must be a number"))?;
            Ok(Value::Number(number))
        }
        FieldType::Aadhar => {
            let text = string_value(field, raw)?;
            validate_aadhar(field, &text)
        }
        FieldType::Select | FieldType::Radio => {
            let text = string_value(field, raw)?;
            if !field.options.iter().any(|option| option == &text) {
                return Err(FieldError::new(&field.id, "Select a valid option"));
            }
            Ok(Value::String(text))
        }
        FieldType::Checkbox => {
            let selected = checkbox_values(field, raw)?;
            // required means "at least one of the named checkboxes is set";
            // the empty case was already handled above
            Ok(Value::Array(
                selected.into_iter().map(Value::String).collect(),
            ))
        }
        FieldType::File | FieldType::Photo | FieldType::Signature => unreachable!(),
    }
}

/// Aadhar-id rules: strip whitespace, exactly 12 digits, not a single
/// repeated digit, and the leading digit may not be 0 or 1.
fn validate_aadhar(field: &FieldDefinition, raw: &str) -> Result<Value, FieldError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            &field.id,
            "Aadhar number must be exactly 12 digits",
        ));
    }

    let first = digits.chars().next().expect("12 digits present");
    if digits.chars().all(|c| c == first) {
        return Err(FieldError::new(
            &field.id,
            "Aadhar number cannot be a single repeated digit",
        ));
    }
    if first == '0' || first == '1' {
        return Err(FieldError::new(
            &field.id,
            "Aadhar number cannot start with 0 or 1",
        ));
    }

    Ok(Value::String(digits))
}

/// Validates an uploaded file's metadata against a file-like field:
/// presence when required, size cap, allowed extensions, and the image
/// MIME requirement for photo and signature fields.
pub fn validate_file(
    field: &FieldDefinition,
    file: Option<&FileMetadata>,
) -> Result<(), FieldError> {
    let file = match file {
        Some(file) => file,
        None => {
            if field.required {
                return Err(required_error(field));
            }
            return Ok(());
        }
    };

    if let Some(cap) = field.effective_max_size_bytes() {
        if file.size_bytes > cap {
            return Err(FieldError::new(
                &field.id,
                format!(
                    "File exceeds the maximum size of {:.1} MB",
                    cap as f64 / (1024.0 * 1024.0)
                ),
            ));
        }
    }

    if field.field_type.requires_image_mime() && !file.mime_type.starts_with("image/") {
        return Err(FieldError::new(&field.id, "An image file is required"));
    }

    if !field.allowed_extensions.is_empty() {
        let extension = file.extension().unwrap_or_default();
        let allowed = field
            .allowed_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&extension));
        if !allowed {
            return Err(FieldError::new(&field.id, "File type is not allowed"));
        }
    }

    Ok(())
}

/// Validates an entire submission against a schema's field list.
///
/// Inline values are looked up with the same dual-key fallback the rest of
/// the system uses; uploads are matched to file-like fields by id or name.
/// All failures across all fields are collected. On success, returns the
/// normalized value map keyed by immutable field id, which is what gets
/// persisted.
pub fn validate_submission(
    fields: &[FieldDefinition],
    values: &HashMap<String, Value>,
    files: &HashMap<String, FileMetadata>,
) -> Result<HashMap<String, Value>, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut normalized = HashMap::new();

    for field in fields {
        if field.field_type.is_file_like() {
            let file = find_file(files, field);
            if let Err(error) = validate_file(field, file) {
                errors.push(error);
            }
            continue;
        }

        let raw = resolver::lookup_value(values, field);
        match validate_value(field, raw) {
            Ok(Value::Null) => {}
            Ok(value) => {
                normalized.insert(field.id.clone(), value);
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

/// Finds the uploaded file for a field, matching the submitted field
/// reference against the field's id, machine name, or label.
fn find_file<'a>(
    files: &'a HashMap<String, FileMetadata>,
    field: &FieldDefinition,
) -> Option<&'a FileMetadata> {
    files
        .get(&field.id)
        .or_else(|| field.name.as_ref().and_then(|name| files.get(name)))
        .or_else(|| files.get(&field.label))
}

fn required_error(field: &FieldDefinition) -> FieldError {
    FieldError::new(&field.id, "This field is required")
}

fn string_value(field: &FieldDefinition, raw: &Value) -> Result<String, FieldError> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(FieldError::new(&field.id, "Expected a text value")),
    }
}

fn number_value(field: &FieldDefinition, raw: &Value) -> Result<f64, FieldError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(FieldError::new(&field.id, "Must be a number")),
    }
}

fn checkbox_values(field: &FieldDefinition, raw: &Value) -> Result<Vec<String>, FieldError> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(FieldError::new(&field.id, "Expected a list of options")),
            })
            .collect(),
        // A single checked box arrives as a bare string
        Value::String(s) => Ok(vec![s.clone()]),
        _ => Err(FieldError::new(&field.id, "Expected a list of options")),
    }
}
