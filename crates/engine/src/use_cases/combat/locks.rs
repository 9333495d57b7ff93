//! Per-combat mutation locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use turnwright_domain::CombatId;

/// Serializes mutations per combat. Different combats never block each other.
#[derive(Debug, Default)]
pub struct CombatLocks {
    locks: DashMap<CombatId, Arc<Mutex<()>>>,
}

impl CombatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `combat_id`.
    pub async fn acquire(&self, combat_id: CombatId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(combat_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the lock of a deleted combat.
    pub fn forget(&self, combat_id: CombatId) {
        self.locks.remove(&combat_id);
    }
}
