//! Budgets: spending envelopes with a limit and a derived running total.

pub mod types;

pub use types::{Budget, BudgetPatch, BudgetView, CreateBudgetInput};
