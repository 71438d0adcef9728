//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain crates convert their own errors into this enum at the boundary to
/// the API layer, so every caller sees the same status and code mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller does not own the referenced resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Spending would push a budget past its limit.
    #[error("Insufficient budget: {0}")]
    InsufficientBudget(String),

    /// Conflict (e.g., duplicate entry, resource still referenced).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transient contention; the caller may resubmit the same request.
    #[error("Service busy: {0}")]
    Busy(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InsufficientBudget(_) => 422,
            Self::Conflict(_) => 409,
            Self::Busy(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientBudget(_) => "INSUFFICIENT_BUDGET",
            Self::Conflict(_) => "CONFLICT",
            Self::Busy(_) => "BUSY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
