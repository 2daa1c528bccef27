use std::collections::HashMap;

use super::{Cents, CentsTotal, PartyId};

/// Derive the balance of a new entry from the party's previous balance.
/// Credit increases the balance, debit decreases it.
/// Returns `None` on overflow.
pub fn next_balance(prior: Option<Cents>, credit: Cents, debit: Cents) -> Option<Cents> {
    prior.unwrap_or(0).checked_add(credit)?.checked_sub(debit)
}

/// Count parties whose latest balance is not settled.
pub fn count_open_balances(latest: &HashMap<PartyId, Cents>) -> usize {
    latest.values().filter(|balance| **balance != 0).count()
}

/// Totals of a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub debit: CentsTotal,
    pub credit: CentsTotal,
}

impl Totals {
    /// Debit minus credit, as shown for supplier ledgers.
    pub fn net(&self) -> CentsTotal {
        self.debit - self.credit
    }
}
