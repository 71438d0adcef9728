//! Persistence seams for budgets and expenses.
//!
//! The coordinator talks to storage only through these two traits. Any
//! backend must honour the atomicity notes on each method; the in-memory
//! implementations in [`memory`] are the reference.

pub mod error;
pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, ExpenseId, OwnerId};

use crate::budget::{Budget, BudgetPatch};
use crate::expense::Expense;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryBudgetStore, MemoryExpenseLedger};

/// Budget aggregate store. Owns the authoritative `spent` total per budget.
///
/// The store applies deltas but never decides capacity policy; that is the
/// coordinator's job.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Gets a budget.
    async fn get(&self, id: BudgetId) -> StoreResult<Budget>;

    /// Inserts a budget with `spent` reset to zero.
    ///
    /// Fails with `DuplicateBudget` if the ID is taken.
    async fn create(&self, budget: Budget) -> StoreResult<Budget>;

    /// Updates name, limit and description. Never touches `spent`.
    async fn update_details(&self, id: BudgetId, patch: &BudgetPatch) -> StoreResult<Budget>;

    /// Removes a budget.
    async fn delete(&self, id: BudgetId) -> StoreResult<Budget>;

    /// Applies `spent += delta` atomically with respect to every other
    /// adjustment on the same budget.
    async fn adjust_spent(&self, id: BudgetId, delta: Decimal) -> StoreResult<Budget>;

    /// Applies `spent += delta` only if the result stays within `limit`,
    /// as one indivisible step. Non-positive deltas always apply.
    ///
    /// Fails with `LimitExceeded` and leaves the budget untouched otherwise.
    async fn adjust_spent_within_limit(&self, id: BudgetId, delta: Decimal)
    -> StoreResult<Budget>;

    /// Lists an owner's budgets in no particular order.
    async fn list(&self, owner_id: OwnerId) -> StoreResult<Vec<Budget>>;
}

/// Expense ledger. Pure CRUD over expense records.
#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    /// Inserts an expense. Fails with `DuplicateExpense` if the ID is taken.
    async fn create(&self, expense: Expense) -> StoreResult<Expense>;

    /// Replaces an existing expense. Fails with `ExpenseNotFound` if absent.
    async fn update(&self, expense: Expense) -> StoreResult<Expense>;

    /// Removes an expense, returning the removed record.
    async fn delete(&self, id: ExpenseId) -> StoreResult<Expense>;

    /// Gets an expense.
    async fn get(&self, id: ExpenseId) -> StoreResult<Expense>;

    /// Lists every expense of an owner.
    async fn list_by_owner(&self, owner_id: OwnerId) -> StoreResult<Vec<Expense>>;

    /// Lists every expense charged against a budget.
    async fn list_by_budget(&self, budget_id: BudgetId) -> StoreResult<Vec<Expense>>;
}
