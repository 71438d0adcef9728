//! Per-budget lock registry.
//!
//! Serializes check-then-act sequences per budget ID while leaving unrelated
//! budgets uncontended. Multi-budget acquisitions always go in ascending ID
//! order, so two reassignments crossing the same pair cannot deadlock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tally_shared::types::BudgetId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::CoordinatorError;

/// Holds the locks of one or more budgets until dropped.
#[derive(Debug)]
pub struct BudgetGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Registry of lazily created per-budget mutexes.
#[derive(Debug)]
pub struct BudgetLocks {
    locks: DashMap<BudgetId, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl BudgetLocks {
    /// Creates a registry whose waits give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Locks every budget in `ids`, deduplicated, in ascending order.
    ///
    /// Fails with `LockTimeout` naming the first budget that could not be
    /// locked in time; locks already taken are released.
    pub async fn acquire(&self, ids: &[BudgetId]) -> Result<BudgetGuard, CoordinatorError> {
        let mut ordered = ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for id in &ordered {
            // Clone the Arc out so the shard lock is released before awaiting.
            let mutex = Arc::clone(self.locks.entry(*id).or_default().value());
            let guard = tokio::time::timeout(self.timeout, mutex.lock_owned())
                .await
                .map_err(|_| CoordinatorError::LockTimeout(*id))?;
            guards.push(guard);
        }

        Ok(BudgetGuard { _guards: guards })
    }

    /// Drops the registry entry of a deleted budget.
    pub fn forget(&self, id: BudgetId) {
        self.locks.remove(&id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> BudgetId {
        BudgetId::from_uuid(Uuid::from_u128(n))
    }

    #[tokio::test]
    async fn test_acquire_orders_and_dedups() {
        let locks = BudgetLocks::new(Duration::from_millis(100));
        // A repeated id would wait on itself and time out.
        let _guard = locks.acquire(&[id(3), id(1), id(3)]).await.unwrap();
        assert_eq!(locks.len(), 2);
        assert!(matches!(
            locks.acquire(&[id(1)]).await,
            Err(CoordinatorError::LockTimeout(b)) if b == id(1)
        ));
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = BudgetLocks::new(Duration::from_millis(20));
        let _held = locks.acquire(&[id(1)]).await.unwrap();

        let err = locks.acquire(&[id(2), id(1)]).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::LockTimeout(b) if b == id(1)));

        // id(2) was released when the failed acquisition unwound.
        assert!(locks.acquire(&[id(2)]).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_on_drop() {
        let locks = BudgetLocks::new(Duration::from_millis(20));
        drop(locks.acquire(&[id(1)]).await.unwrap());
        assert!(locks.acquire(&[id(1)]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unrelated_budgets_do_not_contend() {
        let locks = BudgetLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(&[id(1)]).await.unwrap();
        assert!(locks.acquire(&[id(2)]).await.is_ok());
    }

    #[tokio::test]
    async fn test_forget_removes_entry() {
        let locks = BudgetLocks::new(Duration::from_millis(20));
        drop(locks.acquire(&[id(7)]).await.unwrap());
        locks.forget(id(7));
        assert!(locks.is_empty());
    }
}
