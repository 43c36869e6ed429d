//! # Per-Customer Write Locks
//!
//! Serializes payments for one customer inside this process.
//!
//! ## Why Both a Lock and a Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two tills pay the same customer at once                               │
//! │                                                                         │
//! │  Till A                          Till B                                 │
//! │  lock("asha") ✓                  lock("asha") … waits                  │
//! │  BEGIN                                                                  │
//! │  read remaining = 200                                                   │
//! │  insert payment 200                                                     │
//! │  COMMIT                                                                 │
//! │  unlock ─────────────────────►   lock("asha") ✓                        │
//! │                                  BEGIN                                  │
//! │                                  read remaining = 0                     │
//! │                                  reject (nothing left)                  │
//! │                                                                         │
//! │  The lock orders the read-validate-insert sequences; the transaction   │
//! │  makes each sequence (payments + sale completion) all-or-nothing.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map only holds keys somebody is using: idle entries are dropped the
//! next time a lock is requested.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of async mutexes addressed by string key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        KeyedLocks::default()
    }

    /// Waits until `key` is free and holds it until the guard is dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the map itself references an idle entry.
            entries.retain(|_, entry| Arc::strong_count(entry) > 1);
            entries.entry(key.to_string()).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Number of keys currently locked or awaited.
    pub fn active_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| Arc::strong_count(entry) > 1)
            .count()
    }
}
