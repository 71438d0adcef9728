//! Expenses charged against budgets.

pub mod types;

pub use types::{CreateExpenseInput, Expense, ExpenseView, UpdateExpenseInput};
