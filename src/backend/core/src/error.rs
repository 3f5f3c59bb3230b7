//! Error handling for the netsim engine.
//!
//! One central error type with:
//! - Machine-readable error codes for API responses
//! - HTTP status code mapping via `IntoResponse`
//! - User-facing messages kept separate from internal detail
//! - Severity-aware logging through `tracing`
//! - Error counters through `metrics`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, NetsimError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Store errors
    ProjectNotFound,

    // Validation errors
    ValidationError,
    InvalidInput,
    MissingRequiredField,

    // Streaming channel errors
    MalformedMessage,

    // Serialization errors
    SerializationError,
    DeserializationError,
    InvalidJson,

    // Configuration errors
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal errors
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::ProjectNotFound => StatusCode::NOT_FOUND,

            Self::ValidationError
            | Self::InvalidInput
            | Self::MissingRequiredField
            | Self::MalformedMessage => StatusCode::UNPROCESSABLE_ENTITY,

            Self::SerializationError
            | Self::DeserializationError
            | Self::InvalidJson
            | Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error category for grouping in logs and metrics.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ProjectNotFound => "store",
            Self::ValidationError | Self::InvalidInput | Self::MissingRequiredField => {
                "validation"
            }
            Self::MalformedMessage => "streaming",
            Self::SerializationError | Self::DeserializationError | Self::InvalidJson => {
                "serialization"
            }
            Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration => "configuration",
            Self::InternalError => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller errors (bad input, unknown ids)
    Low,
    /// System errors (serialization, configuration)
    High,
    /// Unexpected failures requiring attention
    Critical,
}

impl ErrorSeverity {
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::ProjectNotFound
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::MalformedMessage => Self::Low,

            ErrorCode::SerializationError
            | ErrorCode::DeserializationError
            | ErrorCode::InvalidJson
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration => Self::High,

            ErrorCode::InternalError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The engine's error type.
///
/// Carries a stable code, a user-safe message, optional internal detail for
/// logs, and free-form structured context.
#[derive(Error, Debug)]
pub struct NetsimError {
    code: ErrorCode,

    /// Safe to expose to clients.
    user_message: Cow<'static, str>,

    /// Logged, never returned to clients.
    internal_message: Option<String>,

    /// Structured context key-value pairs.
    context: HashMap<String, serde_json::Value>,

    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for NetsimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl NetsimError {
    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let err = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            context: HashMap::new(),
            source: None,
        };
        err.record_metrics();
        err
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut err = Self::new(code, user_message);
        err.internal_message = Some(internal_message.into());
        err
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An internal error occurred",
            message,
        )
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create a project-not-found error.
    pub fn project_not_found(id: uuid::Uuid) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", id),
        )
        .with_context("project_id", id.to_string())
    }

    /// Create a malformed-streaming-message error.
    pub fn malformed_message(detail: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::MalformedMessage,
            "Message could not be parsed",
            detail,
        )
    }

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add structured context.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    /// Log this error with severity-appropriate level.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "Critical error"
                );
            }
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "High severity error"
                );
            }
            ErrorSeverity::Low => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    "Request error"
                );
            }
        }
    }

    fn record_metrics(&self) {
        counter!(
            "netsim_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response body for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
}

/// Detailed error information for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&NetsimError> for ErrorResponse {
    fn from(err: &NetsimError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: err.code,
                message: err.user_message.to_string(),
                context: err.context.clone(),
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

impl IntoResponse for NetsimError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.http_status();
        let body = ErrorResponse::from(&self);
        (status, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Context Extension Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for converting foreign errors with context.
pub trait ErrorContext<T> {
    /// Wrap the error as an internal error with a message.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| NetsimError::internal(message.into()).with_source(e))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| NetsimError::new(ErrorCode::ProjectNotFound, message.into()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════════════════

impl From<serde_json::Error> for NetsimError {
    fn from(error: serde_json::Error) -> Self {
        let code = if error.is_syntax() || error.is_data() {
            ErrorCode::DeserializationError
        } else if error.is_eof() {
            ErrorCode::InvalidJson
        } else {
            ErrorCode::SerializationError
        };

        Self::with_internal(code, "Failed to process JSON data", error.to_string())
            .with_source(error)
    }
}

impl From<std::io::Error> for NetsimError {
    fn from(error: std::io::Error) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An I/O error occurred",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<config::ConfigError> for NetsimError {
    fn from(error: config::ConfigError) -> Self {
        let (code, user_msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (
                ErrorCode::ConfigurationError,
                "Configuration error occurred",
            ),
        };

        Self::with_internal(code, user_msg, error.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
