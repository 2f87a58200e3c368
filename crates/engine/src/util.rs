//! Internal helpers for input normalization and model conversion.
//!
//! These utilities are **not** part of the public API.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::Validation(format!("invalid {label} id: {value}")))
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Join an operation-generated note with the caller's free text.
pub(crate) fn join_notes(generated: String, user: Option<&str>) -> String {
    match normalize_optional_text(user) {
        Some(user) => format!("{generated}; {user}"),
        None => generated,
    }
}

pub(crate) fn format_proof(proof: f64) -> String {
    format!("{proof:.2}")
}
