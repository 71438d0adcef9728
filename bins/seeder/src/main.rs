//! Demo data seeder for Tally.
//!
//! Seeds a demo owner's budgets and expenses into the in-memory stores, fires
//! a concurrent burst of spending at one budget, then reconciles every budget
//! against the ledger and logs the result.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::budget::CreateBudgetInput;
use tally_core::expense::{CreateExpenseInput, UpdateExpenseInput};
use tally_core::{CoordinatorError, MemoryCoordinator};
use tally_shared::types::{BudgetId, OwnerId};
use tally_shared::{AppConfig, LoggingConfig};

/// Concurrent requests fired at the burst budget.
const BURST_SIZE: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let coordinator = Arc::new(MemoryCoordinator::in_memory(&config.coordinator));
    let owner = OwnerId::new();
    info!(owner = %owner, "Seeding demo owner");

    let budgets = seed_budgets(&coordinator, owner).await?;
    seed_expenses(&coordinator, owner, &budgets).await?;
    run_burst(&coordinator, owner, budgets.entertainment).await?;
    reconcile_all(&coordinator, owner).await?;

    info!(
        budgets = coordinator.budget_store().len(),
        expenses = coordinator.expense_ledger().len(),
        "Seeding complete"
    );
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

struct DemoBudgets {
    groceries: BudgetId,
    rent: BudgetId,
    transport: BudgetId,
    entertainment: BudgetId,
}

async fn seed_budgets(c: &MemoryCoordinator, owner: OwnerId) -> anyhow::Result<DemoBudgets> {
    Ok(DemoBudgets {
        groceries: create_budget(c, owner, "Groceries", dec!(400), "Weekly shopping").await?,
        rent: create_budget(c, owner, "Rent", dec!(1200), "Monthly rent").await?,
        transport: create_budget(c, owner, "Transport", dec!(150), "Transit pass and fuel")
            .await?,
        entertainment: create_budget(c, owner, "Entertainment", dec!(100), "").await?,
    })
}

async fn create_budget(
    c: &MemoryCoordinator,
    owner: OwnerId,
    name: &str,
    limit: Decimal,
    description: &str,
) -> anyhow::Result<BudgetId> {
    let budget = c
        .create_budget(
            owner,
            CreateBudgetInput {
                name: name.to_string(),
                limit,
                description: description.to_string(),
            },
        )
        .await?;
    Ok(budget.id)
}

async fn seed_expenses(
    c: &MemoryCoordinator,
    owner: OwnerId,
    budgets: &DemoBudgets,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let seed = [
        (budgets.groceries, dec!(82.40), "Supermarket", 12),
        (budgets.groceries, dec!(35.15), "Farmers market", 5),
        (budgets.rent, dec!(1200), "March rent", 18),
        (budgets.transport, dec!(60), "Monthly pass", 17),
        (budgets.transport, dec!(42.75), "Fuel", 3),
        (budgets.entertainment, dec!(18), "Cinema", 9),
    ];

    let mut fuel = None;
    for (budget_id, amount, description, days_ago) in seed {
        let view = c
            .create_expense(
                owner,
                CreateExpenseInput {
                    budget_id,
                    amount,
                    description: description.to_string(),
                    date: Some(now - Duration::days(days_ago)),
                },
            )
            .await?;
        if description == "Fuel" {
            fuel = Some(view);
        }
    }

    // A full budget refuses further spending.
    match c
        .create_expense(
            owner,
            CreateExpenseInput {
                budget_id: budgets.rent,
                amount: dec!(1),
                description: "Late fee".to_string(),
                date: None,
            },
        )
        .await
    {
        Err(CoordinatorError::InsufficientBudget { .. }) => {}
        Ok(_) => bail!("rent budget accepted spending past its limit"),
        Err(err) => return Err(err.into()),
    }

    // Fuel was really a grocery run.
    let fuel = fuel.context("fuel expense was not seeded")?;
    let moved = c
        .update_expense(
            owner,
            fuel.id,
            UpdateExpenseInput {
                budget_id: budgets.groceries,
                amount: fuel.amount,
                description: "Corner shop".to_string(),
                date: None,
            },
        )
        .await?;
    info!(
        expense_id = %moved.id,
        budget = %moved.budget_name,
        remaining = %moved.budget_remaining,
        "Seed expense reassigned"
    );

    Ok(())
}

async fn run_burst(
    c: &Arc<MemoryCoordinator>,
    owner: OwnerId,
    budget_id: BudgetId,
) -> anyhow::Result<()> {
    let handles: Vec<_> = (0..BURST_SIZE)
        .map(|i| {
            let c = Arc::clone(c);
            tokio::spawn(async move {
                c.create_expense(
                    owner,
                    CreateExpenseInput {
                        budget_id,
                        amount: dec!(7.50),
                        description: format!("Arcade token #{i}"),
                        date: None,
                    },
                )
                .await
            })
        })
        .collect();

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for result in join_all(handles).await {
        match result.context("burst task panicked")? {
            Ok(_) => accepted += 1,
            Err(CoordinatorError::InsufficientBudget { .. }) => rejected += 1,
            Err(err) => return Err(err.into()),
        }
    }

    let budget = c.get_budget(owner, budget_id).await?;
    info!(
        accepted,
        rejected,
        spent = %budget.spent,
        limit = %budget.limit,
        "Concurrent burst finished"
    );
    Ok(())
}

async fn reconcile_all(c: &MemoryCoordinator, owner: OwnerId) -> anyhow::Result<()> {
    for budget in c.list_budgets(owner).await? {
        let report = c.reconcile_budget(owner, budget.id).await?;
        if !report.is_consistent() {
            warn!(budget = %budget.name, drift = %report.drift(), "Budget needed repair");
        }
        let expenses = c.list_expenses_by_budget(owner, budget.id).await?;
        info!(
            budget = %budget.name,
            expenses = expenses.len(),
            spent = %report.ledger_total,
            limit = %budget.limit,
            utilization = %budget.utilization_percent,
            "Budget summary"
        );
    }
    Ok(())
}
