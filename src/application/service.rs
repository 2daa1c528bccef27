use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::domain::{
    count_open_balances, next_balance, Cents, CentsTotal, DocumentKind, EntryQuery, LedgerEntry,
    LedgerFilter, NewEntry, Page, PartyKey, PartyType, Totals, DEFAULT_PAGE_LIMIT,
};
use crate::storage::{EntryStore, Repository};

use super::{AppError, PartyLocks};

/// Application service providing the party ledger operations.
/// This is the primary interface for any client (CLI, HTTP API, etc.).
pub struct LedgerService {
    store: Arc<dyn EntryStore>,
    locks: PartyLocks,
    default_limit: i64,
}

/// Party-type specific figures attached to a ledger view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSummary {
    /// Total debit minus total credit of the matching entries
    Supplier { net_balance: CentsTotal },
    /// Customers whose latest balance is nonzero, regardless of filters
    Customer { customers_with_balance: usize },
}

/// One page of a supplier or customer ledger.
#[derive(Debug, Clone)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    /// Matching entries across all pages
    pub total_count: i64,
    pub page: Page,
    /// Sums over every matching entry, not only this page
    pub totals: Totals,
    pub summary: LedgerSummary,
}

impl LedgerService {
    /// Create a new ledger service on top of the given store.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            locks: PartyLocks::new(),
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Page size used when a query does not specify a valid limit.
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        if limit >= 1 {
            self.default_limit = limit;
        }
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(Arc::new(repo)))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(Arc::new(repo)))
    }

    // ========================
    // Entry operations
    // ========================

    /// Record a new entry and derive its running balance.
    ///
    /// The prior balance is read and the new entry written while holding the
    /// party's lock, so concurrent entries for one party form a proper chain.
    pub async fn record_entry(&self, input: NewEntry) -> Result<LedgerEntry, AppError> {
        let valid = input.validate()?;
        let party = valid.party.clone();

        let _guard = self.locks.acquire(&party).await;

        let prior = self
            .store
            .find_latest(&party)
            .await?
            .map(|entry| entry.balance);

        let balance = next_balance(prior, valid.credit, valid.debit).ok_or_else(|| {
            AppError::validation(format!("Balance of {} would overflow", party))
        })?;

        // Stored timestamps carry microseconds
        let mut entry = valid.into_entry(balance, Utc::now().trunc_subsecs(6));
        self.store.insert(&mut entry).await?;

        tracing::info!(
            party = %party,
            reference_no = %entry.reference_no,
            debit = entry.debit,
            credit = entry.credit,
            balance = entry.balance,
            "ledger entry recorded"
        );
        tracing::debug!(locked_parties = self.locks.len(), "party locks");

        Ok(entry)
    }

    /// Current balance of a party: the balance of its most recent entry, or 0.
    pub async fn party_balance(&self, party: &PartyKey) -> Result<Cents, AppError> {
        Ok(self
            .store
            .find_latest(party)
            .await?
            .map(|entry| entry.balance)
            .unwrap_or(0))
    }

    // ========================
    // Ledger views
    // ========================

    /// Filtered, paginated view of one side of the ledger.
    pub async fn query_ledger(
        &self,
        party_type: PartyType,
        filter: &LedgerFilter,
    ) -> Result<LedgerPage, AppError> {
        let query = filter.to_query(party_type)?;
        let page = filter.page(self.default_limit);

        let (entries, total_count, totals) = tokio::try_join!(
            self.store.find(&query, page.skip(), page.limit),
            self.store.count(&query),
            self.store.totals(&query),
        )?;

        let summary = match party_type {
            PartyType::Supplier => LedgerSummary::Supplier {
                net_balance: totals.net(),
            },
            PartyType::Customer => {
                let latest = self.store.latest_balances(PartyType::Customer).await?;
                LedgerSummary::Customer {
                    customers_with_balance: count_open_balances(&latest),
                }
            }
        };

        tracing::debug!(
            party_type = %party_type,
            total_count,
            page = page.page,
            limit = page.limit,
            returned = entries.len(),
            "ledger queried"
        );

        Ok(LedgerPage {
            entries,
            total_count,
            page,
            totals,
            summary,
        })
    }

    pub async fn supplier_ledger(&self, filter: &LedgerFilter) -> Result<LedgerPage, AppError> {
        self.query_ledger(PartyType::Supplier, filter).await
    }

    pub async fn customer_ledger(&self, filter: &LedgerFilter) -> Result<LedgerPage, AppError> {
        self.query_ledger(PartyType::Customer, filter).await
    }

    /// Every entry matching the filter, most recent first. Pagination fields are ignored.
    pub async fn matching_entries(
        &self,
        party_type: PartyType,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let query = filter.to_query(party_type)?;
        self.collect_all(&query).await
    }

    async fn collect_all(&self, query: &EntryQuery) -> Result<Vec<LedgerEntry>, AppError> {
        let mut entries = Vec::new();
        loop {
            let batch = self
                .store
                .find(query, entries.len() as i64, self.default_limit)
                .await?;
            let done = (batch.len() as i64) < self.default_limit;
            entries.extend(batch);
            if done {
                return Ok(entries);
            }
        }
    }

    // ========================
    // Document numbers
    // ========================

    /// Allocate the next display number for a document kind (e.g. `PUR0001`).
    pub async fn next_document_number(&self, kind: DocumentKind) -> Result<String, AppError> {
        let value = self.store.next_sequence(&kind.counter_name()).await?;
        let number = kind.format_number(value);
        tracing::info!(kind = %kind, number = %number, "document number allocated");
        Ok(number)
    }

    // ========================
    // Health
    // ========================

    pub async fn check_store(&self) -> Result<(), AppError> {
        Ok(self.store.ping().await?)
    }
}
