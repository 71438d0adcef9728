//! Coordinator error types.
//!
//! Every variant is surfaced to the caller as-is. Only lock contention and
//! concurrent modification are worth resubmitting; capacity, ownership and
//! validation failures need different input.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{BudgetId, ExpenseId};
use thiserror::Error;

use crate::ownership::Unauthorized;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors that can occur during coordinated budget/expense operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    // ========== Lookup Errors ==========
    /// Budget not found.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    // ========== Authorization Errors ==========
    /// Caller does not own the resource.
    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    // ========== Capacity Errors ==========
    /// The requested amount does not fit in the budget's remaining capacity.
    #[error("Insufficient budget {budget_id}: requested {requested}, remaining {remaining}")]
    InsufficientBudget {
        /// The budget ID.
        budget_id: BudgetId,
        /// Amount the operation needed to add.
        requested: Decimal,
        /// Capacity left at the time of the check.
        remaining: Decimal,
    },

    // ========== Validation Errors ==========
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ========== Lifecycle Errors ==========
    /// Budget cannot be deleted while expenses reference it.
    #[error("Budget {budget_id} still has {expense_count} expense(s)")]
    BudgetInUse {
        /// The budget ID.
        budget_id: BudgetId,
        /// Number of live expenses charged against it.
        expense_count: usize,
    },

    /// Record collides with an existing one.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ========== Concurrency Errors ==========
    /// The expense moved to another budget while this operation waited.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// A budget lock could not be acquired within the configured bound.
    #[error("Timed out waiting for budget {0}")]
    LockTimeout(BudgetId),

    // ========== Storage Errors ==========
    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Store(String),
}

impl CoordinatorError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BudgetNotFound(_) => "BUDGET_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InsufficientBudget { .. } => "INSUFFICIENT_BUDGET",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BudgetInUse { .. } => "BUDGET_IN_USE",
            Self::Conflict(_) => "CONFLICT",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::Store(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 403,
            Self::BudgetNotFound(_) | Self::ExpenseNotFound(_) => 404,
            Self::BudgetInUse { .. } | Self::Conflict(_) | Self::ConcurrentModification => 409,
            Self::InsufficientBudget { .. } => 422,
            Self::LockTimeout(_) => 503,
            Self::Store(_) => 500,
        }
    }

    /// Returns true if resubmitting the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification | Self::LockTimeout(_))
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BudgetNotFound(id) => Self::BudgetNotFound(id),
            StoreError::ExpenseNotFound(id) => Self::ExpenseNotFound(id),
            StoreError::LimitExceeded {
                budget_id,
                requested,
                remaining,
            } => Self::InsufficientBudget {
                budget_id,
                requested,
                remaining,
            },
            StoreError::DuplicateBudget(_) | StoreError::DuplicateExpense(_) => {
                Self::Conflict(err.to_string())
            }
            StoreError::NegativeSpent { .. } | StoreError::Backend(_) => {
                Self::Store(err.to_string())
            }
        }
    }
}

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        let message = err.to_string();
        match err {
            CoordinatorError::BudgetNotFound(_) | CoordinatorError::ExpenseNotFound(_) => {
                Self::NotFound(message)
            }
            CoordinatorError::Unauthorized(_) => Self::Unauthorized(message),
            CoordinatorError::InsufficientBudget { .. } => Self::InsufficientBudget(message),
            CoordinatorError::Validation(_) => Self::Validation(message),
            CoordinatorError::BudgetInUse { .. }
            | CoordinatorError::Conflict(_)
            | CoordinatorError::ConcurrentModification => Self::Conflict(message),
            CoordinatorError::LockTimeout(_) => Self::Busy(message),
            CoordinatorError::Store(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::OwnerId;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CoordinatorError::BudgetNotFound(BudgetId::new()).error_code(),
            "BUDGET_NOT_FOUND"
        );
        assert_eq!(
            CoordinatorError::ConcurrentModification.error_code(),
            "CONCURRENT_MODIFICATION"
        );
        assert_eq!(
            CoordinatorError::Validation(ValidationError::BlankName).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            CoordinatorError::Unauthorized(Unauthorized {
                caller: OwnerId::new()
            })
            .http_status_code(),
            403
        );
        assert_eq!(
            CoordinatorError::ExpenseNotFound(ExpenseId::new()).http_status_code(),
            404
        );
        assert_eq!(
            CoordinatorError::BudgetInUse {
                budget_id: BudgetId::new(),
                expense_count: 2
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            CoordinatorError::LockTimeout(BudgetId::new()).http_status_code(),
            503
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(CoordinatorError::ConcurrentModification.is_retryable());
        assert!(CoordinatorError::LockTimeout(BudgetId::new()).is_retryable());
        assert!(
            !CoordinatorError::InsufficientBudget {
                budget_id: BudgetId::new(),
                requested: dec!(1),
                remaining: dec!(0),
            }
            .is_retryable()
        );
        assert!(!CoordinatorError::Store("down".into()).is_retryable());
    }

    #[test]
    fn test_store_error_mapping() {
        let budget_id = BudgetId::new();
        let err = CoordinatorError::from(StoreError::LimitExceeded {
            budget_id,
            requested: dec!(70),
            remaining: dec!(60),
        });
        assert!(matches!(
            err,
            CoordinatorError::InsufficientBudget { requested, remaining, .. }
                if requested == dec!(70) && remaining == dec!(60)
        ));

        let err = CoordinatorError::from(StoreError::DuplicateBudget(budget_id));
        assert!(matches!(err, CoordinatorError::Conflict(_)));

        let err = CoordinatorError::from(StoreError::Backend("io".into()));
        assert_eq!(err.to_string(), "Storage error: Storage backend error: io");
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = CoordinatorError::InsufficientBudget {
            budget_id: BudgetId::new(),
            requested: dec!(70),
            remaining: dec!(60),
        }
        .into();
        assert_eq!(app.status_code(), 422);

        let app: AppError = CoordinatorError::LockTimeout(BudgetId::new()).into();
        assert_eq!(app.error_code(), "BUSY");

        let app: AppError = CoordinatorError::BudgetNotFound(BudgetId::new()).into();
        assert_eq!(app.status_code(), 404);
    }
}
