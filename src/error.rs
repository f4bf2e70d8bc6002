/*
 * Responsibility
 * - The one AppError vocabulary every stage and handler raises into
 * - Classification (status / message / details) used by the error normalizer
 * - IntoResponse only tags the response; the body is shaped in
 *   middleware::error_normalizer so there is a single formatting point
 */
use std::{fmt, sync::Arc};

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const VALIDATION_MESSAGE: &str = "Validation error";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// One `{field, message}` entry of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered per-field errors produced by the input validation layer.
///
/// Fields are dotted paths (`playback.rate`) and keep the order in which
/// the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },
    #[error("{0}")]
    Internal(String),

    /// Field-level failures from `Validate` implementations.
    #[error("schema validation failed: {0}")]
    Schema(FieldErrors),
    /// Body-shape rejection from axum's `Json` extractor.
    #[error(transparent)]
    Rejection(#[from] JsonRejection),
    /// URL parameter rejection from axum's `Path` extractor.
    #[error(transparent)]
    PathParams(#[from] PathRejection),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Outcome of classifying an `AppError` for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Vec<FieldError>>,
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::status(StatusCode::NOT_FOUND, format!("{resource} not found"))
    }

    /// Priority-ordered classification; the first matching arm wins.
    pub fn classify(&self) -> Classified {
        let (status, message, details) = match self {
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone(), None),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone(), None),
            AppError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, message.clone(), Some(details.clone()))
            }
            AppError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone(), None)
            }
            AppError::Schema(errors) => (
                StatusCode::BAD_REQUEST,
                VALIDATION_MESSAGE.to_string(),
                Some(errors.as_slice().to_vec()),
            ),
            AppError::Rejection(rejection) => (
                StatusCode::BAD_REQUEST,
                VALIDATION_MESSAGE.to_string(),
                Some(vec![FieldError::new("body", rejection.body_text())]),
            ),
            // missing params means the route and extractor disagree
            AppError::PathParams(rejection) if rejection.status().is_server_error() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
                None,
            ),
            AppError::PathParams(rejection) => (
                StatusCode::BAD_REQUEST,
                VALIDATION_MESSAGE.to_string(),
                Some(vec![FieldError::new("path", rejection.body_text())]),
            ),
            AppError::Status { status, message } => (*status, message.clone(), None),
            AppError::Unexpected(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
                None,
            ),
        };

        Classified {
            status,
            message,
            details,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Validation { .. } => "ValidationFailure",
            AppError::Internal(_) => "InternalFailure",
            AppError::Schema(_) => "SchemaValidation",
            AppError::Rejection(_) => "JsonRejection",
            AppError::PathParams(_) => "PathRejection",
            AppError::Status { .. } => "HttpStatus",
            AppError::Unexpected(_) => "Unexpected",
        }
    }

    /// Error report used as the stack trace: message plus the `source()` chain.
    /// `anyhow` errors render their own chain and captured backtrace.
    pub fn report(&self) -> String {
        if let AppError::Unexpected(inner) = self {
            return format!("{}: {:?}", self.kind(), inner);
        }

        let mut out = format!("{}: {}", self.kind(), self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n    caused by: {cause}"));
            source = cause.source();
        }
        out
    }
}

/// Marker the error normalizer looks for on outgoing responses.
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.classify().status;
        let mut res = status.into_response();
        res.extensions_mut().insert(RaisedError(Arc::new(self)));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_variants_have_fixed_status_codes() {
        assert_eq!(
            AppError::unauthorized().classify().status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("no").classify().status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::validation("bad", vec![]).classify().status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::internal("boom").classify().status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn schema_errors_keep_their_order() {
        let mut errors = FieldErrors::new();
        errors.push("positionSeconds", "must be >= 0");
        errors.push("playback.rate", "must be between 0.25 and 4");

        let classified = AppError::Schema(errors).classify();
        assert_eq!(classified.status, StatusCode::BAD_REQUEST);
        assert_eq!(classified.message, VALIDATION_MESSAGE);

        let details = classified.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "positionSeconds");
        assert_eq!(details[1].field, "playback.rate");
    }

    #[test]
    fn explicit_status_is_used_verbatim() {
        let classified = AppError::not_found("video").classify();
        assert_eq!(classified.status, StatusCode::NOT_FOUND);
        assert_eq!(classified.message, "video not found");
        assert!(classified.details.is_none());
    }

    #[test]
    fn unexpected_errors_fall_back_to_500() {
        let err = AppError::from(anyhow::anyhow!("pool exhausted"));
        let classified = err.classify();
        assert_eq!(classified.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(classified.message, INTERNAL_MESSAGE);
        assert!(classified.details.is_none());
        assert!(err.report().contains("pool exhausted"));
    }

    #[test]
    fn into_response_tags_the_response() {
        let res = AppError::forbidden("nope").into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let raised = res.extensions().get::<RaisedError>().unwrap();
        assert!(matches!(raised.0.as_ref(), AppError::Forbidden(m) if m == "nope"));
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        let mut errors = FieldErrors::new();
        errors.push("a", "b");
        assert_eq!(errors.clone().into_result(), Err(errors));
    }
}
