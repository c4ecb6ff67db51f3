//! Classified request errors.
//!
//! Every failure raised while handling a request ends up as exactly one
//! [`AppError`] variant. The error-translation middleware is the only code
//! that turns an [`AppError`] into a response body.

use std::fmt;

use anyhow::Error;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Message sent to clients for any error that was not deliberately classified.
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Message sent to the request that triggered a shutdown.
pub const UNAVAILABLE_MESSAGE: &str = "Service Unavailable";

/// A single failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// A non-empty list of failing input fields.
///
/// The only way to build one is [`FieldErrors::new`] (or [`crate::validate::check`]),
/// both of which refuse an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new(mut errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Some(Self(errors))
    }

    pub fn single(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, error)])
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.error))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{joined}")
    }
}

/// Wire shape of every error response: `{"error": "...", "fields": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<Vec<FieldError>>,
}

/// Tagged request error.
///
/// Any `E: Into<anyhow::Error>` converts into [`AppError::Unclassified`] through
/// `?`. Business code that wants a specific status must build a
/// [`AppError::Trusted`] explicitly.
#[derive(Debug)]
pub enum AppError {
    /// Expected failure with a status and message chosen by the raising code.
    Trusted { status: StatusCode, message: String },
    /// Input validation failures, one entry per failing field.
    Fields(FieldErrors),
    /// Request asking the process to begin graceful shutdown.
    Shutdown(String),
    /// Anything else. Logged in full, never shown to the client.
    Unclassified(Error),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Trusted {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn fields(errors: FieldErrors) -> Self {
        Self::Fields(errors)
    }

    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::Shutdown(reason.into())
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::Unclassified(err.into())
    }

    /// Status code the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Trusted { status, .. } => *status,
            Self::Fields(_) => StatusCode::BAD_REQUEST,
            Self::Shutdown(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown(_))
    }

    /// Stable label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Trusted { .. } => "trusted",
            Self::Fields(_) => "fields",
            Self::Shutdown(_) => "shutdown",
            Self::Unclassified(_) => "unclassified",
        }
    }

    /// Body sent to the client. Unclassified details never leave the process.
    pub fn response_body(&self) -> ErrorResponse {
        match self {
            Self::Trusted { message, .. } => ErrorResponse {
                error: message.clone(),
                fields: None,
            },
            Self::Fields(errors) => ErrorResponse {
                error: "data validation error".to_string(),
                fields: Some(errors.as_slice().to_vec()),
            },
            Self::Shutdown(_) => ErrorResponse {
                error: UNAVAILABLE_MESSAGE.to_string(),
                fields: None,
            },
            Self::Unclassified(_) => ErrorResponse {
                error: INTERNAL_MESSAGE.to_string(),
                fields: None,
            },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted { status, message } => write!(f, "{}: {message}", status.as_u16()),
            Self::Fields(errors) => write!(f, "field errors: {errors}"),
            Self::Shutdown(reason) => write!(f, "shutdown requested: {reason}"),
            Self::Unclassified(err) => write!(f, "{err:#}"),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_trusted_keeps_status_and_message() {
        let err = AppError::forbidden("attempted action is not allowed");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.response_body().error, "attempted action is not allowed");
        assert!(err.response_body().fields.is_none());
    }

    #[test]
    fn test_unclassified_hides_details() {
        let err: AppError = anyhow!("connection refused to 10.0.0.3:5432").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_body().error, INTERNAL_MESSAGE);
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_question_mark_converts_foreign_errors() {
        fn parse() -> Result<i32, AppError> {
            Ok("nope".parse::<i32>()?)
        }
        let err = parse().unwrap_err();
        assert_eq!(err.kind(), "unclassified");
    }

    #[test]
    fn test_shutdown_maps_to_503() {
        let err = AppError::shutdown("integrity failure");
        assert!(err.is_shutdown());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.response_body().error, UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_field_errors_refuse_empty() {
        assert!(FieldErrors::new(Vec::new()).is_none());
    }

    #[test]
    fn test_field_errors_sorted_and_serialized() {
        let errors = FieldErrors::new(vec![
            FieldError::new("name", "name is required"),
            FieldError::new("email", "email must be a valid email address"),
        ])
        .unwrap();
        let err = AppError::fields(errors);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = serde_json::to_value(err.response_body()).unwrap();
        assert_eq!(body["fields"][0]["field"], "email");
        assert_eq!(body["fields"][1]["field"], "name");
        assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_body_omits_fields_when_absent() {
        let body = serde_json::to_value(AppError::not_found("not found").response_body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "not found"}));
    }
}
