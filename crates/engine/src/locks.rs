//! Per-container exclusive locks.
//!
//! Every operation holds the locks of the containers it touches for the whole
//! read-check-write cycle. Locks are always taken in ascending id order, so
//! two operations sharing containers cannot deadlock.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct ContainerLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Held locks; dropping it releases them.
#[derive(Debug)]
pub(crate) struct LockSet {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ContainerLocks {
    fn slot(&self, id: Uuid) -> Arc<AsyncMutex<()>> {
        // The map only hands out clones, so a poisoned map is still consistent.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id).or_default().clone()
    }

    /// Lock every id in `ids` (duplicates ignored), lowest id first.
    pub(crate) async fn acquire(&self, ids: &[Uuid]) -> LockSet {
        let ordered: BTreeSet<Uuid> = ids.iter().copied().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for id in ordered {
            guards.push(self.slot(id).lock_owned().await);
        }
        LockSet { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn duplicate_ids_do_not_self_deadlock() {
        let locks = ContainerLocks::default();
        let id = Uuid::new_v4();
        let held = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&[id, id])).await;
        assert!(held.is_ok());
    }

    #[tokio::test]
    async fn second_holder_waits_for_release() {
        let locks = Arc::new(ContainerLocks::default());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = locks.acquire(&[a, b]).await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[b, a])).await;
        assert!(blocked.is_err());

        drop(first);
        let acquired =
            tokio::time::timeout(Duration::from_secs(1), locks.acquire(&[b, a])).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn disjoint_sets_do_not_block() {
        let locks = ContainerLocks::default();
        let _first = locks.acquire(&[Uuid::new_v4()]).await;
        let other =
            tokio::time::timeout(Duration::from_secs(1), locks.acquire(&[Uuid::new_v4()])).await;
        assert!(other.is_ok());
    }
}
