// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use khata::application::LedgerService;
use khata::domain::{Cents, LedgerEntry, NewEntry, PartyType};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Helper to parse an RFC 3339 timestamp into DateTime<Utc>
pub fn parse_ts(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
}

/// Entry for a supplier with the given credit/debit
pub fn supplier_entry(party_id: &str, name: &str, credit: Cents, debit: Cents) -> NewEntry {
    NewEntry::new(PartyType::Supplier, party_id, name, "Purchase", "PUR0001")
        .with_credit(credit)
        .with_debit(debit)
}

/// Entry for a customer with the given credit/debit
pub fn customer_entry(party_id: &str, name: &str, credit: Cents, debit: Cents) -> NewEntry {
    NewEntry::new(PartyType::Customer, party_id, name, "Sale", "INV-1")
        .with_credit(credit)
        .with_debit(debit)
}

/// Record a sequence of (credit, debit) pairs for one party and return the entries
pub async fn record_chain(
    service: &LedgerService,
    party_type: PartyType,
    party_id: &str,
    amounts: &[(Cents, Cents)],
) -> Result<Vec<LedgerEntry>> {
    let mut entries = Vec::new();
    for (i, (credit, debit)) in amounts.iter().enumerate() {
        let entry = NewEntry::new(
            party_type,
            party_id,
            format!("Party {}", party_id),
            "Payment",
            format!("REF-{}", i + 1),
        )
        .with_credit(*credit)
        .with_debit(*debit);
        entries.push(service.record_entry(entry).await?);
    }
    Ok(entries)
}
