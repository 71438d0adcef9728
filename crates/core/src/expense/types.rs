//! Expense data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BudgetId, ExpenseId, OwnerId};

use crate::budget::Budget;

/// An amount charged against exactly one budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Owner; always equal to the owning budget's owner.
    pub owner_id: OwnerId,
    /// Budget this expense is charged against.
    pub budget_id: BudgetId,
    /// Charged amount. Always positive.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Effective date of the expense.
    pub date: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a new expense with a fresh ID.
    ///
    /// A missing `date` defaults to now.
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        budget_id: BudgetId,
        amount: Decimal,
        description: String,
        date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            owner_id,
            budget_id,
            amount,
            description,
            date: date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy carrying the fields of an update request.
    ///
    /// A missing `date` keeps the current one.
    #[must_use]
    pub fn revised(&self, input: &UpdateExpenseInput) -> Self {
        Self {
            budget_id: input.budget_id,
            amount: input.amount,
            description: input.description.clone(),
            date: input.date.unwrap_or(self.date),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Input for recording a new expense.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseInput {
    /// Budget to charge.
    pub budget_id: BudgetId,
    /// Amount to charge.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Effective date; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Input for revising an existing expense.
///
/// `budget_id` may equal the current budget or name a new one to move the
/// expense to.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpenseInput {
    /// Budget the expense should be charged against.
    pub budget_id: BudgetId,
    /// New amount.
    pub amount: Decimal,
    /// New description.
    #[serde(default)]
    pub description: String,
    /// New effective date; keeps the current date when omitted.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Expense projection returned to callers, with its budget's totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseView {
    /// Expense ID.
    pub id: ExpenseId,
    /// Budget ID.
    pub budget_id: BudgetId,
    /// Budget name.
    pub budget_name: String,
    /// Charged amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Effective date.
    pub date: DateTime<Utc>,
    /// Budget limit.
    pub budget_total: Decimal,
    /// Budget spent total.
    pub budget_spent: Decimal,
    /// Budget remaining capacity.
    pub budget_remaining: Decimal,
}

impl ExpenseView {
    /// Builds the projection from an expense and the budget it is charged against.
    #[must_use]
    pub fn new(expense: &Expense, budget: &Budget) -> Self {
        Self {
            id: expense.id,
            budget_id: expense.budget_id,
            budget_name: budget.name.clone(),
            amount: expense.amount,
            description: expense.description.clone(),
            date: expense.date,
            budget_total: budget.limit,
            budget_spent: budget.spent,
            budget_remaining: budget.remaining(),
        }
    }
}
