//! Budget and expense consistency core for Tally.
//!
//! This crate keeps every budget's running `spent` total equal to the sum of
//! its live expenses under concurrent mutation, refuses spending past a
//! budget's limit, and scopes every record to exactly one owner. It has ZERO
//! web or database dependencies; persistence plugs in through the traits in
//! [`store`].
//!
//! # Modules
//!
//! - `budget` - Budget records, patches and projections
//! - `expense` - Expense records, inputs and projections
//! - `ownership` - Caller/owner authorization predicate
//! - `store` - Budget aggregate store and expense ledger seams, in-memory backends
//! - `coordinator` - Atomic expense mutations across both stores
//! - `validation` - Input checks the core relies on

pub mod budget;
pub mod coordinator;
pub mod expense;
pub mod ownership;
pub mod store;
pub mod validation;

pub use coordinator::{Coordinator, CoordinatorError, CoordinatorResult, MemoryCoordinator};
