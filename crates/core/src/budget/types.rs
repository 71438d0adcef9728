//! Budget data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BudgetId, OwnerId};

/// A budget record as held by the aggregate store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owner of the budget.
    pub owner_id: OwnerId,
    /// Budget name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Spending limit. Always positive.
    pub limit: Decimal,
    /// Sum of every live expense charged against this budget.
    pub spent: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Creates an empty budget (`spent = 0`) with a fresh ID.
    #[must_use]
    pub fn new(owner_id: OwnerId, name: String, limit: Decimal, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            owner_id,
            name,
            description,
            limit,
            spent: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Remaining capacity (`limit - spent`).
    ///
    /// Negative when the limit was lowered below what is already spent.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.limit - self.spent
    }

    /// Returns true if `spent + delta` stays within the limit.
    ///
    /// Non-positive deltas are always absorbable: releasing spend never
    /// makes a budget worse off, even one whose limit was lowered below
    /// its current spend.
    #[must_use]
    pub fn can_absorb(&self, delta: Decimal) -> bool {
        delta <= Decimal::ZERO || delta <= self.remaining()
    }

    /// Share of the limit already spent, as a percentage rounded to 2 places.
    ///
    /// Saturates at `Decimal::MAX` when a limit lowered far below the
    /// current spend makes the ratio unrepresentable.
    #[must_use]
    pub fn utilization_percent(&self) -> Decimal {
        if self.limit.is_zero() {
            return Decimal::ZERO;
        }
        self.spent
            .checked_div(self.limit)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::MAX, |percent| percent.round_dp(2))
    }
}

/// Input for creating a new budget.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetInput {
    /// Budget name.
    pub name: String,
    /// Spending limit.
    pub limit: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Changes to a budget's descriptive fields and limit.
///
/// `None` leaves the field untouched. `spent` is never part of a patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetPatch {
    /// New name.
    pub name: Option<String>,
    /// New limit. Not re-validated against existing expenses.
    pub limit: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
}

impl BudgetPatch {
    /// Applies the patch to a budget in place.
    pub fn apply_to(&self, budget: &mut Budget) {
        if let Some(name) = &self.name {
            budget.name.clone_from(name);
        }
        if let Some(limit) = self.limit {
            budget.limit = limit;
        }
        if let Some(description) = &self.description {
            budget.description.clone_from(description);
        }
        budget.updated_at = Utc::now();
    }
}

/// Budget projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetView {
    /// Budget ID.
    pub id: BudgetId,
    /// Budget name.
    pub name: String,
    /// Spending limit.
    pub limit: Decimal,
    /// Amount spent so far.
    pub spent: Decimal,
    /// `limit - spent`.
    pub remaining: Decimal,
    /// Utilization percentage (spent / limit * 100).
    pub utilization_percent: Decimal,
    /// Free-text description.
    pub description: String,
}

impl From<&Budget> for BudgetView {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id,
            name: budget.name.clone(),
            limit: budget.limit,
            spent: budget.spent,
            remaining: budget.remaining(),
            utilization_percent: budget.utilization_percent(),
            description: budget.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn budget(limit: Decimal, spent: Decimal) -> Budget {
        let mut budget = Budget::new(OwnerId::new(), "Groceries".into(), limit, String::new());
        budget.spent = spent;
        budget
    }

    #[test]
    fn test_new_budget_is_empty() {
        let budget = budget(dec!(100), Decimal::ZERO);
        assert_eq!(budget.spent, Decimal::ZERO);
        assert_eq!(budget.remaining(), dec!(100));
    }

    #[rstest]
    #[case(dec!(100), dec!(40), dec!(60), true)]
    #[case(dec!(100), dec!(40), dec!(61), false)]
    #[case(dec!(100), dec!(100), dec!(0), true)]
    #[case(dec!(50), dec!(80), dec!(-10), true)]
    #[case(dec!(50), dec!(80), dec!(1), false)]
    fn test_can_absorb(
        #[case] limit: Decimal,
        #[case] spent: Decimal,
        #[case] delta: Decimal,
        #[case] expected: bool,
    ) {
        assert_eq!(budget(limit, spent).can_absorb(delta), expected);
    }

    #[test]
    fn test_utilization_percent() {
        assert_eq!(budget(dec!(300), dec!(100)).utilization_percent(), dec!(33.33));
        assert_eq!(budget(dec!(0), dec!(0)).utilization_percent(), dec!(0));
    }

    #[test]
    fn test_utilization_percent_saturates_on_tiny_limit() {
        let budget = budget(dec!(0.0000000000000000000000001), dec!(1000));
        assert_eq!(budget.utilization_percent(), Decimal::MAX);
        assert_eq!(BudgetView::from(&budget).utilization_percent, Decimal::MAX);
    }

    #[test]
    fn test_patch_leaves_spent_alone() {
        let mut budget = budget(dec!(100), dec!(70));
        let patch = BudgetPatch {
            name: Some("Food".into()),
            limit: Some(dec!(50)),
            description: None,
        };

        patch.apply_to(&mut budget);

        assert_eq!(budget.name, "Food");
        assert_eq!(budget.limit, dec!(50));
        assert_eq!(budget.spent, dec!(70));
        assert_eq!(budget.remaining(), dec!(-20));
    }

    #[test]
    fn test_view_projection() {
        let budget = budget(dec!(100), dec!(40));
        let view = BudgetView::from(&budget);
        assert_eq!(view.remaining, dec!(60));
        assert_eq!(view.utilization_percent, dec!(40.00));
        assert_eq!(view.id, budget.id);
    }
}
