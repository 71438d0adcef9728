//! Property-based tests for the coordinator.
//!
//! - Spent equals the sum of live expenses after any operation sequence
//! - Spent never exceeds the limit when limits are never lowered
//! - Every expense shares its budget's owner
//! - Capacity decisions match a sequential model

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::CoordinatorConfig;
use tally_shared::types::{ExpenseId, OwnerId};

use super::error::CoordinatorError;
use super::service::{Coordinator, MemoryCoordinator};
use crate::budget::CreateBudgetInput;
use crate::expense::{CreateExpenseInput, UpdateExpenseInput};
use crate::store::{BudgetStore, ExpenseLedger};

const BUDGETS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Create { budget: usize, amount: Decimal },
    Update { expense: usize, budget: usize, amount: Decimal },
    Delete { expense: usize },
}

/// Amounts from 0.01 to 50.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..5_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Limits from 50 to 200.
fn limit() -> impl Strategy<Value = Decimal> {
    (50i64..=200i64).prop_map(Decimal::from)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..BUDGETS, amount()).prop_map(|(budget, amount)| Op::Create { budget, amount }),
        2 => (any::<usize>(), 0..BUDGETS, amount())
            .prop_map(|(expense, budget, amount)| Op::Update { expense, budget, amount }),
        1 => any::<usize>().prop_map(|expense| Op::Delete { expense }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Checks the ledger/aggregate invariants for every budget.
async fn assert_consistent(c: &MemoryCoordinator, owner: OwnerId) {
    let budgets = c.budget_store().list(owner).await.unwrap();
    assert_eq!(budgets.len(), BUDGETS);

    for budget in budgets {
        let expenses = c.expense_ledger().list_by_budget(budget.id).await.unwrap();
        let total: Decimal = expenses.iter().map(|e| e.amount).sum();
        assert_eq!(budget.spent, total, "spent drifted from ledger");
        assert!(budget.spent <= budget.limit, "spent exceeds limit");
        assert!(budget.spent >= Decimal::ZERO);
        for expense in &expenses {
            assert_eq!(expense.owner_id, budget.owner_id);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_spent_tracks_live_expenses(
        limits in prop::collection::vec(limit(), BUDGETS),
        ops in prop::collection::vec(op(), 1..40),
    ) {
        runtime().block_on(async {
            let c = Coordinator::in_memory(&CoordinatorConfig::default());
            let owner = OwnerId::new();

            let mut budget_ids = Vec::with_capacity(BUDGETS);
            for (i, limit) in limits.iter().enumerate() {
                let view = c
                    .create_budget(owner, CreateBudgetInput {
                        name: format!("budget-{i}"),
                        limit: *limit,
                        description: String::new(),
                    })
                    .await
                    .unwrap();
                budget_ids.push(view.id);
            }

            // Sequential model: (expense, budget index, amount).
            let mut live: Vec<(ExpenseId, usize, Decimal)> = Vec::new();
            let model_spent = |live: &[(ExpenseId, usize, Decimal)], budget: usize| -> Decimal {
                live.iter().filter(|(_, b, _)| *b == budget).map(|(_, _, a)| *a).sum()
            };

            for op in ops {
                match op {
                    Op::Create { budget, amount } => {
                        let fits = model_spent(&live, budget) + amount <= limits[budget];
                        let result = c
                            .create_expense(owner, CreateExpenseInput {
                                budget_id: budget_ids[budget],
                                amount,
                                description: String::new(),
                                date: None,
                            })
                            .await;
                        match result {
                            Ok(view) => {
                                assert!(fits);
                                live.push((view.id, budget, amount));
                            }
                            Err(err) => {
                                assert!(!fits);
                                assert!(matches!(err, CoordinatorError::InsufficientBudget { .. }));
                            }
                        }
                    }
                    Op::Update { expense, budget, amount } => {
                        if live.is_empty() {
                            continue;
                        }
                        let slot = expense % live.len();
                        let (id, from, old) = live[slot];
                        let fits = if from == budget {
                            model_spent(&live, budget) - old + amount <= limits[budget]
                        } else {
                            model_spent(&live, budget) + amount <= limits[budget]
                        };
                        let result = c
                            .update_expense(owner, id, UpdateExpenseInput {
                                budget_id: budget_ids[budget],
                                amount,
                                description: String::new(),
                                date: None,
                            })
                            .await;
                        match result {
                            Ok(_) => {
                                assert!(fits);
                                live[slot] = (id, budget, amount);
                            }
                            Err(err) => {
                                assert!(!fits);
                                assert!(matches!(err, CoordinatorError::InsufficientBudget { .. }));
                            }
                        }
                    }
                    Op::Delete { expense } => {
                        if live.is_empty() {
                            continue;
                        }
                        let (id, _, _) = live.swap_remove(expense % live.len());
                        c.delete_expense(owner, id).await.unwrap();
                    }
                }

                assert_consistent(&c, owner).await;
            }

            for (i, budget_id) in budget_ids.iter().enumerate() {
                let report = c.reconcile_budget(owner, *budget_id).await.unwrap();
                assert!(report.is_consistent());
                assert_eq!(report.ledger_total, model_spent(&live, i));
            }
        });
    }

    #[test]
    fn prop_foreign_owner_never_mutates(
        amounts in prop::collection::vec(amount(), 1..10),
    ) {
        runtime().block_on(async {
            let c = Coordinator::in_memory(&CoordinatorConfig::default());
            let owner = OwnerId::new();
            let stranger = OwnerId::new();
            let budget_id = c
                .create_budget(owner, CreateBudgetInput {
                    name: "mine".into(),
                    limit: Decimal::from(10_000),
                    description: String::new(),
                })
                .await
                .unwrap()
                .id;

            for amount in amounts {
                let expense_id = c
                    .create_expense(owner, CreateExpenseInput {
                        budget_id,
                        amount,
                        description: String::new(),
                        date: None,
                    })
                    .await
                    .unwrap()
                    .id;
                let before = c.budget_store().get(budget_id).await.unwrap().spent;

                let update = c
                    .update_expense(stranger, expense_id, UpdateExpenseInput {
                        budget_id,
                        amount: amount + Decimal::ONE,
                        description: String::new(),
                        date: None,
                    })
                    .await;
                assert!(matches!(update, Err(CoordinatorError::Unauthorized(_))));
                let delete = c.delete_expense(stranger, expense_id).await;
                assert!(matches!(delete, Err(CoordinatorError::Unauthorized(_))));

                assert_eq!(c.budget_store().get(budget_id).await.unwrap().spent, before);
            }
        });
    }
}
