//! Identity resolution between generated field ids and human names.
//!
//! Submission value maps are keyed by whatever reference the submitting
//! form happened to emit: the generated field id, the machine name, or the
//! display label. Every read of a submission value (rendering, filtering,
//! CSV export, validation) must apply the same precedence — id first, then
//! name, then label, skipping keys that are present but empty — or data
//! written under an older key silently disappears.
//!
//! New values are always written keyed by the immutable field id; this
//! fallback read path exists for historical data.

use crate::fields::validation::is_empty_value;
use crate::fields::FieldDefinition;
use serde_json::Value;
use std::collections::HashMap;

/// The canonical storage key for a field: its immutable generated id.
pub fn canonical_key(field: &FieldDefinition) -> &str {
    &field.id
}

/// Looks up a field's value in a submission value map.
///
/// Tries the field id, then the machine name, then the display label, and
/// returns the first present, non-empty value. Deterministic and total:
/// any map and any field yield exactly one outcome.
pub fn lookup_value<'a>(
    values: &'a HashMap<String, Value>,
    field: &FieldDefinition,
) -> Option<&'a Value> {
    let mut candidates = Vec::with_capacity(3);
    candidates.push(field.id.as_str());
    if let Some(name) = &field.name {
        candidates.push(name.as_str());
    }
    candidates.push(field.label.as_str());

    candidates
        .into_iter()
        .filter_map(|key| values.get(key))
        .find(|value| !is_empty_value(value))
}

/// The column header text for a field: the display label, falling back to
/// the machine name when the label is blank.
pub fn header_text(field: &FieldDefinition) -> &str {
    if field.label.trim().is_empty() {
        field.name.as_deref().unwrap_or(&field.id)
    } else {
        &field.label
    }
}

/// Whether a stored attachment's field reference belongs to this field.
/// Attachments were recorded against whichever reference the submission
/// form used, so both the id and the name match.
pub fn attachment_matches(field: &FieldDefinition, field_ref: &str) -> bool {
    field_ref == field.id || field.name.as_deref() == Some(field_ref)
}
