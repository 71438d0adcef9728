//! Consistency coordinator.
//!
//! Orchestrates every mutation that spans the expense ledger and the budget
//! aggregate store so observers never see the two disagree.
//!
//! Write protocol for every expense mutation:
//! 1. Take the per-budget lock(s) for every budget whose `spent` moves.
//! 2. Apply the aggregate adjustment first. For increases this is the
//!    conditional increment, so the capacity check and the write are one
//!    step and the adjustment decides whether the operation succeeds.
//! 3. Write the ledger.
//! 4. If the ledger write fails, apply the inverse adjustment.
//!
//! A crash between 2 and 3 can leave `spent` overcounted but never leaves an
//! expense untracked; [`Coordinator::reconcile_budget`] repairs the former.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tally_shared::CoordinatorConfig;
use tally_shared::types::{BudgetId, ExpenseId, OwnerId};
use tracing::{error, info, instrument, warn};

use super::error::CoordinatorError;
use super::locks::BudgetLocks;
use super::types::Reconciliation;
use crate::budget::{Budget, BudgetPatch, BudgetView, CreateBudgetInput};
use crate::expense::{CreateExpenseInput, Expense, ExpenseView, UpdateExpenseInput};
use crate::ownership::authorize_resource;
use crate::store::{
    BudgetStore, ExpenseLedger, MemoryBudgetStore, MemoryExpenseLedger, StoreError,
};
use crate::validation::{require_positive, validate_new_budget, validate_patch};

/// Result alias for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Consistency coordinator over a budget store and an expense ledger.
///
/// Share it between tasks behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Coordinator<B, L> {
    budgets: B,
    ledger: L,
    locks: BudgetLocks,
}

/// Coordinator over the in-memory stores.
pub type MemoryCoordinator = Coordinator<MemoryBudgetStore, MemoryExpenseLedger>;

impl MemoryCoordinator {
    /// Creates a coordinator over fresh in-memory stores.
    #[must_use]
    pub fn in_memory(config: &CoordinatorConfig) -> Self {
        Self::new(MemoryBudgetStore::new(), MemoryExpenseLedger::new(), config)
    }
}

impl<B, L> Coordinator<B, L>
where
    B: BudgetStore,
    L: ExpenseLedger,
{
    /// Creates a coordinator over the given stores.
    #[must_use]
    pub fn new(budgets: B, ledger: L, config: &CoordinatorConfig) -> Self {
        Self {
            budgets,
            ledger,
            locks: BudgetLocks::new(config.lock_timeout()),
        }
    }

    /// The underlying budget store.
    pub fn budget_store(&self) -> &B {
        &self.budgets
    }

    /// The underlying expense ledger.
    pub fn expense_ledger(&self) -> &L {
        &self.ledger
    }

    // ========================================================================
    // Budget operations
    // ========================================================================

    /// Creates an empty budget for `owner`.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn create_budget(
        &self,
        owner: OwnerId,
        input: CreateBudgetInput,
    ) -> CoordinatorResult<BudgetView> {
        validate_new_budget(&input)?;

        let budget = self
            .budgets
            .create(Budget::new(owner, input.name, input.limit, input.description))
            .await?;

        info!(budget_id = %budget.id, limit = %budget.limit, "Budget created");
        Ok(BudgetView::from(&budget))
    }

    /// Edits a budget's name, limit or description.
    ///
    /// A new limit is not checked against what is already spent; existing
    /// expenses are never invalidated retroactively.
    #[instrument(skip_all, fields(owner = %owner, budget_id = %budget_id))]
    pub async fn update_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
        patch: BudgetPatch,
    ) -> CoordinatorResult<BudgetView> {
        validate_patch(&patch)?;
        self.owned_budget(owner, budget_id).await?;

        let _guard = self.locks.acquire(&[budget_id]).await?;
        let budget = self.budgets.update_details(budget_id, &patch).await?;

        if budget.spent > budget.limit {
            warn!(
                spent = %budget.spent,
                limit = %budget.limit,
                "Budget limit lowered below current spend"
            );
        }
        info!(limit = %budget.limit, "Budget updated");
        Ok(BudgetView::from(&budget))
    }

    /// Deletes a budget that no expense references.
    #[instrument(skip_all, fields(owner = %owner, budget_id = %budget_id))]
    pub async fn delete_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
    ) -> CoordinatorResult<()> {
        self.owned_budget(owner, budget_id).await?;

        let guard = self.locks.acquire(&[budget_id]).await?;
        let expense_count = self.ledger.list_by_budget(budget_id).await?.len();
        if expense_count > 0 {
            return Err(CoordinatorError::BudgetInUse {
                budget_id,
                expense_count,
            });
        }
        self.budgets.delete(budget_id).await?;
        drop(guard);
        self.locks.forget(budget_id);

        info!("Budget deleted");
        Ok(())
    }

    /// Gets one of the caller's budgets.
    pub async fn get_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
    ) -> CoordinatorResult<BudgetView> {
        let budget = self.owned_budget(owner, budget_id).await?;
        Ok(BudgetView::from(&budget))
    }

    /// Lists the caller's budgets, sorted by name.
    pub async fn list_budgets(&self, owner: OwnerId) -> CoordinatorResult<Vec<BudgetView>> {
        let mut budgets = self.budgets.list(owner).await?;
        budgets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(budgets.iter().map(BudgetView::from).collect())
    }

    // ========================================================================
    // Expense operations
    // ========================================================================

    /// Records an expense against one of the caller's budgets.
    #[instrument(
        skip_all,
        fields(owner = %owner, budget_id = %input.budget_id, amount = %input.amount)
    )]
    pub async fn create_expense(
        &self,
        owner: OwnerId,
        input: CreateExpenseInput,
    ) -> CoordinatorResult<ExpenseView> {
        require_positive("amount", input.amount)?;
        let budget_id = input.budget_id;
        self.owned_budget(owner, budget_id).await?;

        let _guard = self.locks.acquire(&[budget_id]).await?;
        let budget = self.reserve(budget_id, input.amount).await?;

        let draft = Expense::new(owner, budget_id, input.amount, input.description, input.date);
        let expense = match self.ledger.create(draft).await {
            Ok(expense) => expense,
            Err(err) => {
                self.compensate(budget_id, -input.amount).await;
                return Err(err.into());
            }
        };

        info!(
            expense_id = %expense.id,
            spent = %budget.spent,
            remaining = %budget.remaining(),
            "Expense created"
        );
        Ok(ExpenseView::new(&expense, &budget))
    }

    /// Revises an expense, possibly moving it to another of the caller's budgets.
    #[instrument(
        skip_all,
        fields(owner = %owner, expense_id = %expense_id, budget_id = %input.budget_id)
    )]
    pub async fn update_expense(
        &self,
        owner: OwnerId,
        expense_id: ExpenseId,
        input: UpdateExpenseInput,
    ) -> CoordinatorResult<ExpenseView> {
        require_positive("amount", input.amount)?;

        let seen = self.owned_expense(owner, expense_id).await?;
        self.owned_budget(owner, input.budget_id).await?;

        let _guard = self
            .locks
            .acquire(&[seen.budget_id, input.budget_id])
            .await?;
        let current = self.locked_expense(&seen).await?;
        let revised = current.revised(&input);

        let budget = if current.budget_id == revised.budget_id {
            self.revise_in_place(&current, revised.clone()).await?
        } else {
            self.reassign(&current, revised.clone()).await?
        };

        info!(
            old_amount = %current.amount,
            new_amount = %revised.amount,
            spent = %budget.spent,
            "Expense updated"
        );
        Ok(ExpenseView::new(&revised, &budget))
    }

    /// Deletes an expense and releases its amount from its budget.
    #[instrument(skip_all, fields(owner = %owner, expense_id = %expense_id))]
    pub async fn delete_expense(
        &self,
        owner: OwnerId,
        expense_id: ExpenseId,
    ) -> CoordinatorResult<()> {
        let seen = self.owned_expense(owner, expense_id).await?;

        let _guard = self.locks.acquire(&[seen.budget_id]).await?;
        let current = self.locked_expense(&seen).await?;

        // Aggregate first: an interruption here leaves `spent` low relative
        // to the surviving ledger, never high.
        let budget = self
            .budgets
            .adjust_spent(current.budget_id, -current.amount)
            .await?;
        if let Err(err) = self.ledger.delete(expense_id).await {
            self.compensate(current.budget_id, current.amount).await;
            return Err(err.into());
        }

        info!(
            budget_id = %current.budget_id,
            amount = %current.amount,
            spent = %budget.spent,
            "Expense deleted"
        );
        Ok(())
    }

    /// Gets one of the caller's expenses.
    pub async fn get_expense(
        &self,
        owner: OwnerId,
        expense_id: ExpenseId,
    ) -> CoordinatorResult<ExpenseView> {
        let expense = self.owned_expense(owner, expense_id).await?;
        let budget = self.budgets.get(expense.budget_id).await?;
        Ok(ExpenseView::new(&expense, &budget))
    }

    /// Lists every expense of the caller, newest first.
    pub async fn list_expenses(&self, owner: OwnerId) -> CoordinatorResult<Vec<ExpenseView>> {
        let budgets: HashMap<BudgetId, Budget> = self
            .budgets
            .list(owner)
            .await?
            .into_iter()
            .map(|budget| (budget.id, budget))
            .collect();

        let mut expenses = self.ledger.list_by_owner(owner).await?;
        sort_newest_first(&mut expenses);

        expenses
            .iter()
            .map(|expense| {
                budgets
                    .get(&expense.budget_id)
                    .map(|budget| ExpenseView::new(expense, budget))
                    .ok_or(CoordinatorError::BudgetNotFound(expense.budget_id))
            })
            .collect()
    }

    /// Lists the expenses charged against one of the caller's budgets, newest first.
    pub async fn list_expenses_by_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
    ) -> CoordinatorResult<Vec<ExpenseView>> {
        let budget = self.owned_budget(owner, budget_id).await?;

        let mut expenses = self.ledger.list_by_budget(budget_id).await?;
        sort_newest_first(&mut expenses);

        Ok(expenses
            .iter()
            .map(|expense| ExpenseView::new(expense, &budget))
            .collect())
    }

    // ========================================================================
    // Repair
    // ========================================================================

    /// Recomputes a budget's `spent` from the ledger and applies any drift.
    #[instrument(skip_all, fields(owner = %owner, budget_id = %budget_id))]
    pub async fn reconcile_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
    ) -> CoordinatorResult<Reconciliation> {
        self.owned_budget(owner, budget_id).await?;

        let _guard = self.locks.acquire(&[budget_id]).await?;
        let budget = self.budgets.get(budget_id).await?;
        let ledger_total: Decimal = self
            .ledger
            .list_by_budget(budget_id)
            .await?
            .iter()
            .map(|expense| expense.amount)
            .sum();

        let report = Reconciliation {
            budget_id,
            recorded: budget.spent,
            ledger_total,
        };
        if report.is_consistent() {
            return Ok(report);
        }

        self.budgets.adjust_spent(budget_id, report.drift()).await?;
        warn!(
            recorded = %report.recorded,
            ledger_total = %report.ledger_total,
            "Budget spent total repaired from ledger"
        );
        Ok(report)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn owned_budget(
        &self,
        owner: OwnerId,
        budget_id: BudgetId,
    ) -> CoordinatorResult<Budget> {
        let budget = self.budgets.get(budget_id).await?;
        authorize_resource(owner, &budget)?;
        Ok(budget)
    }

    async fn owned_expense(
        &self,
        owner: OwnerId,
        expense_id: ExpenseId,
    ) -> CoordinatorResult<Expense> {
        let expense = self.ledger.get(expense_id).await?;
        authorize_resource(owner, &expense)?;
        Ok(expense)
    }

    /// Re-reads an expense once its budget lock is held.
    ///
    /// The lock taken was chosen from `seen.budget_id`; if the expense moved
    /// since, that lock does not cover it.
    async fn locked_expense(&self, seen: &Expense) -> CoordinatorResult<Expense> {
        let current = self.ledger.get(seen.id).await?;
        if current.budget_id != seen.budget_id {
            warn!(
                expense_id = %seen.id,
                "Expense moved to another budget while waiting for its lock"
            );
            return Err(CoordinatorError::ConcurrentModification);
        }
        Ok(current)
    }

    /// Conditionally adds `amount` to a budget's spent total.
    async fn reserve(&self, budget_id: BudgetId, amount: Decimal) -> CoordinatorResult<Budget> {
        match self
            .budgets
            .adjust_spent_within_limit(budget_id, amount)
            .await
        {
            Ok(budget) => Ok(budget),
            Err(err @ StoreError::LimitExceeded { .. }) => {
                warn!(budget_id = %budget_id, error = %err, "Capacity check failed");
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn revise_in_place(
        &self,
        current: &Expense,
        revised: Expense,
    ) -> CoordinatorResult<Budget> {
        let budget_id = current.budget_id;
        let delta = revised.amount - current.amount;
        let budget = self.reserve(budget_id, delta).await?;

        if let Err(err) = self.ledger.update(revised).await {
            self.compensate(budget_id, -delta).await;
            return Err(err.into());
        }
        Ok(budget)
    }

    /// Moves an expense between budgets: debit the target, credit the source,
    /// then rewrite the record. Any failure unwinds the steps already taken.
    async fn reassign(&self, current: &Expense, revised: Expense) -> CoordinatorResult<Budget> {
        let from = current.budget_id;
        let to = revised.budget_id;
        let new_amount = revised.amount;

        let target = self.reserve(to, new_amount).await?;

        if let Err(err) = self.budgets.adjust_spent(from, -current.amount).await {
            self.compensate(to, -new_amount).await;
            return Err(err.into());
        }

        if let Err(err) = self.ledger.update(revised).await {
            self.compensate(to, -new_amount).await;
            self.compensate(from, current.amount).await;
            return Err(err.into());
        }

        info!(from = %from, to = %to, "Expense reassigned");
        Ok(target)
    }

    /// Applies an inverse adjustment after a failed later step.
    async fn compensate(&self, budget_id: BudgetId, delta: Decimal) {
        match self.budgets.adjust_spent(budget_id, delta).await {
            Ok(budget) => warn!(
                budget_id = %budget_id,
                delta = %delta,
                spent = %budget.spent,
                "Compensating adjustment applied"
            ),
            Err(err) => error!(
                budget_id = %budget_id,
                delta = %delta,
                error = %err,
                "Compensating adjustment failed; budget needs reconciliation"
            ),
        }
    }
}

fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}
