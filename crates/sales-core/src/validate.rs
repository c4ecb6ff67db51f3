//! Request input validation.
//!
//! Wraps [`validator`] so that every failing field is reported at once as
//! [`FieldErrors`], rather than a single joined message.

use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::{FieldError, FieldErrors};

/// Returned when a path or body identifier is not a UUID.
#[derive(Debug, Error)]
#[error("ID is not in its proper form")]
pub struct InvalidId;

/// Validates `value`, collecting one entry per failing field.
pub fn check<T: Validate>(value: &T) -> Result<(), FieldErrors> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(to_field_errors(&errors)),
    }
}

/// Parses an identifier, rejecting anything that is not a UUID.
pub fn check_id(id: &str) -> Result<Uuid, InvalidId> {
    Uuid::parse_str(id).map_err(|_| InvalidId)
}

pub fn to_field_errors(errors: &ValidationErrors) -> FieldErrors {
    let list = errors
        .field_errors()
        .iter()
        .filter_map(|(field, errs)| {
            errs.first()
                .map(|err| FieldError::new(field.to_string(), describe(field, err)))
        })
        .collect::<Vec<_>>();

    // A struct-level failure carries no field entries.
    FieldErrors::new(list)
        .unwrap_or_else(|| FieldErrors::single("body", "request body is invalid"))
}

fn describe(field: &str, err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }

    match err.code.as_ref() {
        "email" => format!("{field} must be a valid email address"),
        "required" => format!("{field} is a required field"),
        "length" => format!("{field} has an invalid length"),
        "must_match" => match err.params.get("other") {
            Some(other) => format!("{field} must match {}", other.as_str().unwrap_or("other")),
            None => format!("{field} must match"),
        },
        _ => format!("{field} is invalid"),
    }
}
