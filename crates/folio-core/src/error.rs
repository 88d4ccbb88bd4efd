//! Unified error types for the pagination and cache layers.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Folio.
///
/// Variants fall into three families: input validation errors that are
/// surfaced to the caller as client errors, cache infrastructure errors
/// that the cache layer swallows, and store execution errors that are
/// propagated unchanged.
#[derive(Error, Debug)]
pub enum FolioError {
    // ============ Input Validation Errors ============
    /// Generic validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Keyset pagination was requested without a sort specification
    #[error("Keyset pagination requires a sort specification")]
    MissingSort,

    /// The sort specification is malformed or contradictory
    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    /// The pagination cursor could not be decoded
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// The cursor was produced by a different cursor format version
    #[error("Cursor version mismatch: expected {expected}, found {found}")]
    CursorVersionMismatch { expected: u32, found: u32 },

    /// The cursor was produced for a different sort order
    #[error("Cursor was issued for a different sort order")]
    CursorSortMismatch,

    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    // ============ Infrastructure Errors ============
    /// Document store execution error
    #[error("Store error: {0}")]
    Store(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FolioError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::MissingSort
            | Self::InvalidSort(_)
            | Self::InvalidCursor(_)
            | Self::CursorVersionMismatch { .. }
            | Self::CursorSortMismatch => 400,
            Self::NotFound { .. } => 404,
            Self::Store(_)
            | Self::Cache(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingSort => "MISSING_SORT",
            Self::InvalidSort(_) => "INVALID_SORT",
            Self::InvalidCursor(_) => "INVALID_CURSOR",
            Self::CursorVersionMismatch { .. } => "CURSOR_VERSION_MISMATCH",
            Self::CursorSortMismatch => "CURSOR_SORT_MISMATCH",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an invalid sort error.
    #[must_use]
    pub fn invalid_sort<T: Into<String>>(message: T) -> Self {
        Self::InvalidSort(message.into())
    }

    /// Creates an invalid cursor error.
    #[must_use]
    pub fn invalid_cursor<T: Into<String>>(message: T) -> Self {
        Self::InvalidCursor(message.into())
    }

    /// Creates a store error.
    #[must_use]
    pub fn store<T: Into<String>>(message: T) -> Self {
        Self::Store(message.into())
    }

    /// Creates a cache error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error was caused by caller input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Cache(_))
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from a `FolioError`.
    #[must_use]
    pub fn from_error(error: &FolioError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<&FolioError> for ErrorResponse {
    fn from(error: &FolioError) -> Self {
        Self::from_error(error)
    }
}
