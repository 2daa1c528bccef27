use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Cents, EntryQuery, LedgerEntry, PartyId, PartyKey, PartyType, Totals};

/// Persistence the ledger service relies on.
///
/// Every ordered operation uses the same recency order:
/// `date` descending, then `created_at` descending, then `sequence` descending.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a new entry and assign its `sequence`.
    async fn insert(&self, entry: &mut LedgerEntry) -> Result<()>;

    /// Most recent entry of one party, if any.
    async fn find_latest(&self, party: &PartyKey) -> Result<Option<LedgerEntry>>;

    /// One page of matching entries, most recent first.
    async fn find(&self, query: &EntryQuery, skip: i64, limit: i64) -> Result<Vec<LedgerEntry>>;

    /// Number of matching entries, ignoring pagination.
    async fn count(&self, query: &EntryQuery) -> Result<i64>;

    /// Debit and credit sums over every matching entry.
    async fn totals(&self, query: &EntryQuery) -> Result<Totals>;

    /// Balance of the most recent entry of every party of the given type.
    async fn latest_balances(&self, party_type: PartyType) -> Result<HashMap<PartyId, Cents>>;

    /// Atomically increment the named counter and return the new value (first value is 1).
    async fn next_sequence(&self, name: &str) -> Result<i64>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<()>;
}
