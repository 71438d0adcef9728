//! Input validation for budget and expense requests.
//!
//! Schema-level validation happens before requests reach the core; these
//! checks only guard the invariants the core itself depends on.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::budget::{BudgetPatch, CreateBudgetInput};

/// Malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Monetary field must be strictly positive.
    #[error("{field} must be positive, got {value}")]
    NonPositiveAmount {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: Decimal,
    },

    /// Budget name is empty or whitespace.
    #[error("Budget name cannot be blank")]
    BlankName,
}

/// Requires `value > 0`.
pub fn require_positive(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveAmount { field, value })
    }
}

fn require_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::BlankName)
    } else {
        Ok(())
    }
}

/// Validates a budget creation request.
pub fn validate_new_budget(input: &CreateBudgetInput) -> Result<(), ValidationError> {
    require_name(&input.name)?;
    require_positive("limit", input.limit)
}

/// Validates the fields a budget patch sets.
pub fn validate_patch(patch: &BudgetPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        require_name(name)?;
    }
    if let Some(limit) = patch.limit {
        require_positive("limit", limit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0.01), true)]
    #[case(dec!(100), true)]
    #[case(dec!(0), false)]
    #[case(dec!(-5), false)]
    fn test_require_positive(#[case] value: Decimal, #[case] ok: bool) {
        assert_eq!(require_positive("amount", value).is_ok(), ok);
    }

    #[test]
    fn test_new_budget_rules() {
        let valid = CreateBudgetInput {
            name: "Food".into(),
            limit: dec!(100),
            description: String::new(),
        };
        assert!(validate_new_budget(&valid).is_ok());

        let blank = CreateBudgetInput {
            name: "   ".into(),
            ..valid.clone()
        };
        assert_eq!(validate_new_budget(&blank), Err(ValidationError::BlankName));

        let zero = CreateBudgetInput {
            limit: Decimal::ZERO,
            ..valid
        };
        assert_eq!(
            validate_new_budget(&zero),
            Err(ValidationError::NonPositiveAmount {
                field: "limit",
                value: Decimal::ZERO
            })
        );
    }

    #[test]
    fn test_patch_rules() {
        assert!(validate_patch(&BudgetPatch::default()).is_ok());
        assert!(
            validate_patch(&BudgetPatch {
                limit: Some(dec!(-1)),
                ..BudgetPatch::default()
            })
            .is_err()
        );
        assert_eq!(
            validate_patch(&BudgetPatch {
                name: Some(String::new()),
                ..BudgetPatch::default()
            }),
            Err(ValidationError::BlankName)
        );
    }
}
