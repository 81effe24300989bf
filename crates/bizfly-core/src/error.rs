//! Error types for Bizfly Cloud operations.
//!
//! Every failure surfaced by the request pipeline is one of the variants of
//! [`Error`]. Each variant belongs to an [`ErrorKind`] that callers can match on,
//! and carries a human-readable description (including the server's message,
//! verbatim, when the failure came from an HTTP response).

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Main error type for Bizfly Cloud operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller lacks permission for the resource (HTTP 403)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Authentication failed and could not be recovered (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource state conflict (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request rejected by the server (any other HTTP 4xx)
    #[error("Bad request ({status}): {message}")]
    BadRequest {
        /// HTTP status code returned by the server
        status: u16,
        /// Message returned by the server
        message: String,
    },

    /// Transport failure or gateway error that outlived the retry budget
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Non-retryable server failure (HTTP 5xx other than 502/503/504)
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code returned by the server
        status: u16,
        /// Message returned by the server
        message: String,
    },

    /// The caller's context was cancelled or its deadline passed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Request body could not be encoded or response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A call-site precondition was violated
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint or URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Bizfly Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`] for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::PermissionDenied`]
    PermissionDenied,
    /// See [`Error::Unauthorized`]
    Unauthorized,
    /// See [`Error::Conflict`]
    Conflict,
    /// See [`Error::BadRequest`]
    BadRequest,
    /// See [`Error::Transient`]
    Transient,
    /// See [`Error::ServerError`]
    Server,
    /// See [`Error::Cancelled`]
    Cancelled,
    /// See [`Error::Serialization`]
    Serialization,
    /// See [`Error::ValidationError`], [`Error::ConfigError`] and [`Error::InvalidEndpoint`]
    Validation,
}

impl Error {
    /// Returns the kind this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Transient(_) => ErrorKind::Transient,
            Self::ServerError { .. } => ErrorKind::Server,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::ValidationError(_) | Self::ConfigError(_) | Self::InvalidEndpoint(_) => {
                ErrorKind::Validation
            }
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Conflict(_) => "CONFLICT",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Transient(_) => "TRANSIENT",
            Self::ServerError { .. } => "SERVER_ERROR",
            Self::Cancelled(_) => "CANCELLED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true if the executor may retry the attempt that produced this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Classify an unsuccessful HTTP response.
    ///
    /// `body` is the raw response body; when it is a JSON object carrying a
    /// `message` (or `error`) string, that string becomes the description.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = server_message(body);
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::FORBIDDEN => Self::PermissionDenied(message),
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Self::Transient(format!("{status}: {message}")),
            status if status.is_client_error() => Self::BadRequest {
                status: status.as_u16(),
                message,
            },
            status => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[derive(Deserialize)]
struct ServerMessage {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn server_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match serde_json::from_str::<ServerMessage>(trimmed) {
        Ok(ServerMessage {
            message: Some(message),
            ..
        }) => message,
        Ok(ServerMessage {
            error: Some(error), ..
        }) => error,
        _ => trimmed.to_string(),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_builder() {
            Self::InvalidEndpoint(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
