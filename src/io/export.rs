use anyhow::Result;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, LedgerFilter, PartyType};

/// Exporter for writing ledger views as CSV
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every entry matching the filter, most recent first.
    /// Returns the number of rows written (header excluded).
    pub async fn export_ledger_csv<W: Write>(
        &self,
        party_type: PartyType,
        filter: &LedgerFilter,
        writer: W,
    ) -> Result<usize> {
        let entries = self.service.matching_entries(party_type, filter).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "date",
            "party_id",
            "party_name",
            "mobile_number",
            "type",
            "reference_no",
            "payment_method",
            "debit",
            "credit",
            "balance",
            "due_date",
        ])?;

        for entry in &entries {
            csv_writer.write_record([
                entry.date.format("%Y-%m-%d").to_string(),
                entry.party_id.clone(),
                entry.party_name.clone(),
                entry.mobile_number.clone().unwrap_or_default(),
                entry.kind.to_string(),
                entry.reference_no.clone(),
                entry
                    .payment_method
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
                format_cents(entry.debit),
                format_cents(entry.credit),
                format_cents(entry.balance),
                entry
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }
}
