//! Coordinator report types.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::BudgetId;

/// Outcome of recomputing a budget's `spent` from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// The budget ID.
    pub budget_id: BudgetId,
    /// `spent` as held by the aggregate store before repair.
    pub recorded: Decimal,
    /// Sum of live expenses in the ledger; `spent` after repair.
    pub ledger_total: Decimal,
}

impl Reconciliation {
    /// Correction applied to `spent` (`ledger_total - recorded`).
    #[must_use]
    pub fn drift(&self) -> Decimal {
        self.ledger_total - self.recorded
    }

    /// Returns true if no correction was needed.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift().is_zero()
    }
}
