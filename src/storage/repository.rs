use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    fold_case, Cents, CentsTotal, EntryKind, EntryQuery, LedgerEntry, PartyId, PartyKey,
    PartyType, PaymentMethod, Totals,
};

use super::{EntryStore, MIGRATION_001_INITIAL};

const ENTRY_COLUMNS: &str = "id, sequence, date, due_date, party_type, party_id, party_name, mobile_number, kind, reference_no, payment_method, debit_cents, credit_cents, balance_cents, created_at";

/// Search columns, filled from `fold_case` at insert time.
const FOLDED_COLUMNS: &str = "party_name_folded, party_id_folded, reference_no_folded";

/// Recency order shared by every ordered query.
const RECENCY_ORDER: &str = "ORDER BY date DESC, created_at DESC, sequence DESC";

const ENTRY_SEQUENCE: &str = "ledger_entry";

/// Fixed-width UTC timestamps so that text comparison matches time order.
fn encode_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(s: &str, field: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid {} timestamp: {}", field, s))?
        .with_timezone(&Utc))
}

/// Amounts are summed as `amount / SUM_SPLIT` and `amount % SUM_SPLIT`.
/// Both parts stay far below `i64::MAX` for any realistic row count.
const SUM_SPLIT: i64 = 1_000_000_000;

fn join_split_sum(high: i64, low: i64) -> CentsTotal {
    CentsTotal::from(high) * CentsTotal::from(SUM_SPLIT) + CentsTotal::from(low)
}

/// Escape LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// WHERE clause plus its positional string bindings.
struct Predicate {
    sql: String,
    binds: Vec<String>,
}

impl Predicate {
    fn from_query(query: &EntryQuery) -> Self {
        let mut sql = String::from("WHERE party_type = ?");
        let mut binds = vec![query.party_type.as_str().to_string()];

        if let Some(search) = &query.search {
            sql.push_str(
                " AND (party_name_folded LIKE ? ESCAPE '\\' OR party_id_folded LIKE ? ESCAPE '\\' OR reference_no_folded LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(search);
            binds.extend([pattern.clone(), pattern.clone(), pattern]);
        }
        if let Some(kind) = &query.kind {
            sql.push_str(" AND kind = ?");
            binds.push(kind.clone());
        }
        if let Some(from) = query.from {
            sql.push_str(" AND date >= ?");
            binds.push(encode_ts(from));
        }
        if let Some(to) = query.to {
            sql.push_str(" AND date <= ?");
            binds.push(encode_ts(to));
        }

        Self { sql, binds }
    }
}

/// SQLite-backed ledger store.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL (e.g. `sqlite:khata.db?mode=rwc`).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let party_type_str: String = row.get("party_type");
        let date_str: String = row.get("date");
        let due_date_str: Option<String> = row.get("due_date");
        let kind_str: String = row.get("kind");
        let payment_method_str: Option<String> = row.get("payment_method");
        let created_at_str: String = row.get("created_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            sequence: row.get("sequence"),
            date: decode_ts(&date_str, "date")?,
            due_date: due_date_str
                .map(|s| decode_ts(&s, "due_date"))
                .transpose()?,
            party_type: PartyType::from_str(&party_type_str)?,
            party_id: row.get("party_id"),
            party_name: row.get("party_name"),
            mobile_number: row.get("mobile_number"),
            kind: EntryKind::from(kind_str),
            reference_no: row.get("reference_no"),
            payment_method: payment_method_str.map(PaymentMethod::from),
            debit: row.get("debit_cents"),
            credit: row.get("credit_cents"),
            balance: row.get("balance_cents"),
            created_at: decode_ts(&created_at_str, "created_at")?,
        })
    }
}

#[async_trait]
impl EntryStore for Repository {
    async fn insert(&self, entry: &mut LedgerEntry) -> Result<()> {
        entry.sequence = self.next_sequence(ENTRY_SEQUENCE).await?;

        sqlx::query(&format!(
            "INSERT INTO ledger_entries ({}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ENTRY_COLUMNS, FOLDED_COLUMNS
        ))
        .bind(entry.id.to_string())
        .bind(entry.sequence)
        .bind(encode_ts(entry.date))
        .bind(entry.due_date.map(encode_ts))
        .bind(entry.party_type.as_str())
        .bind(&entry.party_id)
        .bind(&entry.party_name)
        .bind(&entry.mobile_number)
        .bind(entry.kind.as_str())
        .bind(&entry.reference_no)
        .bind(entry.payment_method.as_ref().map(|m| m.as_str().to_string()))
        .bind(entry.debit)
        .bind(entry.credit)
        .bind(entry.balance)
        .bind(encode_ts(entry.created_at))
        .bind(fold_case(&entry.party_name))
        .bind(fold_case(&entry.party_id))
        .bind(fold_case(&entry.reference_no))
        .execute(&self.pool)
        .await
        .context("Failed to save ledger entry")?;

        tracing::debug!(id = %entry.id, sequence = entry.sequence, "ledger entry stored");
        Ok(())
    }

    async fn find_latest(&self, party: &PartyKey) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ledger_entries WHERE party_type = ? AND party_id = ? {} LIMIT 1",
            ENTRY_COLUMNS, RECENCY_ORDER
        ))
        .bind(party.party_type.as_str())
        .bind(&party.party_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest ledger entry")?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn find(&self, query: &EntryQuery, skip: i64, limit: i64) -> Result<Vec<LedgerEntry>> {
        let predicate = Predicate::from_query(query);
        let sql = format!(
            "SELECT {} FROM ledger_entries {} {} LIMIT ? OFFSET ?",
            ENTRY_COLUMNS, predicate.sql, RECENCY_ORDER
        );

        let mut sql_query = sqlx::query(&sql);
        for bind in &predicate.binds {
            sql_query = sql_query.bind(bind.as_str());
        }

        let rows = sql_query
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list ledger entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self, query: &EntryQuery) -> Result<i64> {
        let predicate = Predicate::from_query(query);
        let sql = format!(
            "SELECT COUNT(*) as count FROM ledger_entries {}",
            predicate.sql
        );

        let mut sql_query = sqlx::query(&sql);
        for bind in &predicate.binds {
            sql_query = sql_query.bind(bind.as_str());
        }

        let row = sql_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count ledger entries")?;
        Ok(row.get("count"))
    }

    async fn totals(&self, query: &EntryQuery) -> Result<Totals> {
        let predicate = Predicate::from_query(query);
        // SUM() fails on i64 overflow, so each amount is summed in two parts
        let sql = format!(
            "SELECT \
                COALESCE(SUM(debit_cents / {split}), 0) as debit_high, \
                COALESCE(SUM(debit_cents % {split}), 0) as debit_low, \
                COALESCE(SUM(credit_cents / {split}), 0) as credit_high, \
                COALESCE(SUM(credit_cents % {split}), 0) as credit_low \
            FROM ledger_entries {}",
            predicate.sql,
            split = SUM_SPLIT
        );

        let mut sql_query = sqlx::query(&sql);
        for bind in &predicate.binds {
            sql_query = sql_query.bind(bind.as_str());
        }

        let row = sql_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum ledger entries")?;

        Ok(Totals {
            debit: join_split_sum(row.get("debit_high"), row.get("debit_low")),
            credit: join_split_sum(row.get("credit_high"), row.get("credit_low")),
        })
    }

    async fn latest_balances(&self, party_type: PartyType) -> Result<HashMap<PartyId, Cents>> {
        let rows = sqlx::query(
            r#"
            SELECT party_id, balance_cents
            FROM (
                SELECT
                    party_id,
                    balance_cents,
                    ROW_NUMBER() OVER (
                        PARTITION BY party_id
                        ORDER BY date DESC, created_at DESC, sequence DESC
                    ) as recency
                FROM ledger_entries
                WHERE party_type = ?
            )
            WHERE recency = 1
            "#,
        )
        .bind(party_type.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute latest balances")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("party_id"), row.get("balance_cents")))
            .collect())
    }

    async fn next_sequence(&self, name: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO sequence_counter (name, value) VALUES (?, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to advance sequence '{}'", name))?;

        Ok(row.get("value"))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database is not reachable")?;
        Ok(())
    }
}
