//! In-memory store implementations.
//!
//! Backed by `DashMap`, so every per-key mutation happens under that key's
//! shard write lock. Used by tests, the seeder, and any embedding that does
//! not need durability.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, ExpenseId, OwnerId};

use super::error::{StoreError, StoreResult};
use super::{BudgetStore, ExpenseLedger};
use crate::budget::{Budget, BudgetPatch};
use crate::expense::Expense;

/// In-memory budget aggregate store.
#[derive(Debug, Default)]
pub struct MemoryBudgetStore {
    budgets: DashMap<BudgetId, Budget>,
}

impl MemoryBudgetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of budgets held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    /// Returns true if no budget is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }

    fn apply_delta(
        &self,
        id: BudgetId,
        delta: Decimal,
        enforce_limit: bool,
    ) -> StoreResult<Budget> {
        let mut budget = self
            .budgets
            .get_mut(&id)
            .ok_or(StoreError::BudgetNotFound(id))?;

        if enforce_limit && !budget.can_absorb(delta) {
            return Err(StoreError::LimitExceeded {
                budget_id: id,
                requested: delta,
                remaining: budget.remaining(),
            });
        }

        let spent = budget.spent + delta;
        if spent < Decimal::ZERO {
            return Err(StoreError::NegativeSpent {
                budget_id: id,
                delta,
            });
        }

        budget.spent = spent;
        budget.updated_at = Utc::now();
        Ok(budget.value().clone())
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn get(&self, id: BudgetId) -> StoreResult<Budget> {
        self.budgets
            .get(&id)
            .map(|budget| budget.value().clone())
            .ok_or(StoreError::BudgetNotFound(id))
    }

    async fn create(&self, mut budget: Budget) -> StoreResult<Budget> {
        budget.spent = Decimal::ZERO;
        match self.budgets.entry(budget.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateBudget(budget.id)),
            Entry::Vacant(slot) => {
                slot.insert(budget.clone());
                Ok(budget)
            }
        }
    }

    async fn update_details(&self, id: BudgetId, patch: &BudgetPatch) -> StoreResult<Budget> {
        let mut budget = self
            .budgets
            .get_mut(&id)
            .ok_or(StoreError::BudgetNotFound(id))?;
        patch.apply_to(&mut budget);
        Ok(budget.value().clone())
    }

    async fn delete(&self, id: BudgetId) -> StoreResult<Budget> {
        self.budgets
            .remove(&id)
            .map(|(_, budget)| budget)
            .ok_or(StoreError::BudgetNotFound(id))
    }

    async fn adjust_spent(&self, id: BudgetId, delta: Decimal) -> StoreResult<Budget> {
        self.apply_delta(id, delta, false)
    }

    async fn adjust_spent_within_limit(
        &self,
        id: BudgetId,
        delta: Decimal,
    ) -> StoreResult<Budget> {
        self.apply_delta(id, delta, true)
    }

    async fn list(&self, owner_id: OwnerId) -> StoreResult<Vec<Budget>> {
        Ok(self
            .budgets
            .iter()
            .filter(|budget| budget.owner_id == owner_id)
            .map(|budget| budget.value().clone())
            .collect())
    }
}

/// In-memory expense ledger.
#[derive(Debug, Default)]
pub struct MemoryExpenseLedger {
    expenses: DashMap<ExpenseId, Expense>,
}

impl MemoryExpenseLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expenses held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    /// Returns true if no expense is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

#[async_trait]
impl ExpenseLedger for MemoryExpenseLedger {
    async fn create(&self, expense: Expense) -> StoreResult<Expense> {
        match self.expenses.entry(expense.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateExpense(expense.id)),
            Entry::Vacant(slot) => {
                slot.insert(expense.clone());
                Ok(expense)
            }
        }
    }

    async fn update(&self, expense: Expense) -> StoreResult<Expense> {
        let mut current = self
            .expenses
            .get_mut(&expense.id)
            .ok_or(StoreError::ExpenseNotFound(expense.id))?;
        *current = expense.clone();
        Ok(expense)
    }

    async fn delete(&self, id: ExpenseId) -> StoreResult<Expense> {
        self.expenses
            .remove(&id)
            .map(|(_, expense)| expense)
            .ok_or(StoreError::ExpenseNotFound(id))
    }

    async fn get(&self, id: ExpenseId) -> StoreResult<Expense> {
        self.expenses
            .get(&id)
            .map(|expense| expense.value().clone())
            .ok_or(StoreError::ExpenseNotFound(id))
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> StoreResult<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|expense| expense.owner_id == owner_id)
            .map(|expense| expense.value().clone())
            .collect())
    }

    async fn list_by_budget(&self, budget_id: BudgetId) -> StoreResult<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|expense| expense.budget_id == budget_id)
            .map(|expense| expense.value().clone())
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
