//! Store error types.

use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, ExpenseId};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the budget aggregate store and the expense ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// A budget with this ID already exists.
    #[error("Budget already exists: {0}")]
    DuplicateBudget(BudgetId),

    /// An expense with this ID already exists.
    #[error("Expense already exists: {0}")]
    DuplicateExpense(ExpenseId),

    /// Conditional increment refused: it would push `spent` past `limit`.
    #[error("Limit exceeded for budget {budget_id}: requested {requested}, remaining {remaining}")]
    LimitExceeded {
        /// The budget ID.
        budget_id: BudgetId,
        /// Increment that was requested.
        requested: Decimal,
        /// Capacity left at the time of the check.
        remaining: Decimal,
    },

    /// Adjustment would make `spent` negative.
    #[error("Adjustment of {delta} would make spent negative for budget {budget_id}")]
    NegativeSpent {
        /// The budget ID.
        budget_id: BudgetId,
        /// Rejected delta.
        delta: Decimal,
    },

    /// Backend failure (I/O, connection, serialization).
    #[error("Storage backend error: {0}")]
    Backend(String),
}
