//! Consistency coordination between the expense ledger and budget aggregates.
//!
//! # Modules
//!
//! - `service` - The coordinator and its write protocol
//! - `locks` - Per-budget lock registry with bounded waits
//! - `error` - Coordinator error taxonomy
//! - `types` - Report types

pub mod error;
pub mod locks;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use error::CoordinatorError;
pub use locks::{BudgetGuard, BudgetLocks};
pub use service::{Coordinator, CoordinatorResult, MemoryCoordinator};
pub use types::Reconciliation;
