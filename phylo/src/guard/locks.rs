//! Per-tree mutation locks

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::TreeId;
use crate::{PhyloError, Result};

/// One async mutex per tree, created on first use.
///
/// Mutations of the same tree are serialized; different trees never wait on
/// each other. Entries nobody holds or waits on are dropped on the next
/// acquire, so the map only tracks trees with mutations in flight.
#[derive(Debug, Default)]
pub struct TreeLocks {
    locks: Mutex<HashMap<TreeId, Arc<Mutex<()>>>>,
}

impl TreeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for exclusive access to the tree
    pub async fn acquire(&self, tree_id: &TreeId, timeout: Duration) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(tree_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                PhyloError::ConcurrentModification(format!(
                    "timed out after {}ms waiting for tree {}",
                    timeout.as_millis(),
                    tree_id
                ))
            })
    }

    /// Number of trees whose lock was held or awaited at the last acquire
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_tree_times_out_while_held() {
        let locks = TreeLocks::new();
        let tree = TreeId::from("t1");

        let _held = locks.acquire(&tree, Duration::from_millis(50)).await.unwrap();
        let second = locks.acquire(&tree, Duration::from_millis(20)).await;
        assert!(matches!(second, Err(PhyloError::ConcurrentModification(_))));
    }

    #[tokio::test]
    async fn test_other_trees_are_independent() {
        let locks = TreeLocks::new();

        let _first = locks
            .acquire(&TreeId::from("t1"), Duration::from_millis(50))
            .await
            .unwrap();
        let other = locks.acquire(&TreeId::from("t2"), Duration::from_millis(20)).await;
        assert!(other.is_ok());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let locks = TreeLocks::new();

        for i in 0..10 {
            let tree = TreeId::new(format!("t{}", i));
            drop(locks.acquire(&tree, Duration::from_millis(20)).await.unwrap());
        }
        assert_eq!(locks.len().await, 1);

        let held = locks
            .acquire(&TreeId::from("busy"), Duration::from_millis(20))
            .await
            .unwrap();
        let _other = locks
            .acquire(&TreeId::from("other"), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(locks.len().await, 2);

        drop(held);
        let _again = locks
            .acquire(&TreeId::from("other-2"), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_lock_is_released_on_drop() {
        let locks = TreeLocks::new();
        let tree = TreeId::from("t1");

        drop(locks.acquire(&tree, Duration::from_millis(50)).await.unwrap());
        assert!(locks.acquire(&tree, Duration::from_millis(20)).await.is_ok());
    }
}
