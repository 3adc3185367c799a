//! Per-customer transition locks.

use std::collections::HashMap;
use std::sync::Arc;

use common::CustomerId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async locks, one per customer.
///
/// Holding a customer's guard excludes every other transition or purge for
/// that customer. Idle entries are pruned on the next acquire.
#[derive(Debug, Clone, Default)]
pub struct CustomerLocks {
    registry: Arc<Mutex<HashMap<CustomerId, Arc<Mutex<()>>>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of `customer_id`.
    pub async fn acquire(&self, customer_id: &CustomerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.registry.lock().await;
            registry.retain(|_, lock| Arc::strong_count(lock) > 1);
            registry
                .entry(customer_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Returns the number of customers with a lock currently registered.
    pub async fn tracked(&self) -> usize {
        self.registry.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_customer_is_serialized() {
        let locks = CustomerLocks::new();
        let c1 = CustomerId::new("C1");

        let guard = locks.acquire(&c1).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(&c1)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(20), locks.acquire(&c1)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_customers_do_not_block() {
        let locks = CustomerLocks::new();
        let _c1 = locks.acquire(&CustomerId::new("C1")).await;
        let c2 =
            tokio::time::timeout(Duration::from_millis(20), locks.acquire(&CustomerId::new("C2")))
                .await;
        assert!(c2.is_ok());
    }

    #[tokio::test]
    async fn idle_locks_are_pruned() {
        let locks = CustomerLocks::new();
        drop(locks.acquire(&CustomerId::new("C1")).await);
        drop(locks.acquire(&CustomerId::new("C2")).await);

        // C1 was idle when C2 registered; C2 is pruned by the next acquire.
        let _c3 = locks.acquire(&CustomerId::new("C3")).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
