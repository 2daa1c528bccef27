use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::PartyKey;

/// One async mutex per party, so that the read-prior-balance / insert pair of
/// `record_entry` never interleaves for the same party.
///
/// Entries live only while a party is locked or awaited, so the map stays
/// as small as the number of parties currently being written.
#[derive(Default)]
pub struct PartyLocks {
    locks: DashMap<PartyKey, Arc<Mutex<()>>>,
}

/// Exclusive access to one party. Dropping it releases the lock and forgets
/// the party once no other task is waiting on it.
pub struct PartyGuard<'a> {
    locks: &'a DashMap<PartyKey, Arc<Mutex<()>>>,
    party: PartyKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PartyGuard<'_> {
    fn drop(&mut self) {
        // Unlock before checking, the guard holds its own reference to the mutex
        drop(self.guard.take());
        // Under the shard lock nobody can clone the Arc, so a count of 1 means no waiters
        self.locks
            .remove_if(&self.party, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl PartyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `party`. Released when the guard drops.
    pub async fn acquire(&self, party: &PartyKey) -> PartyGuard<'_> {
        // Clone the Arc out before awaiting so no map shard stays locked.
        let lock = self
            .locks
            .entry(party.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;

        PartyGuard {
            locks: &self.locks,
            party: party.clone(),
            guard: Some(guard),
        }
    }

    /// Number of parties currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
