use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, PartyId, PartyKey, PartyType};

pub type EntryId = Uuid;

/// Classification of a ledger entry.
/// The known kinds are what the dashboard filters on; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryKind {
    Sale,
    Purchase,
    Payment,
    Receipt,
    Other(String),
}

impl EntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntryKind::Sale => "Sale",
            EntryKind::Purchase => "Purchase",
            EntryKind::Payment => "Payment",
            EntryKind::Receipt => "Receipt",
            EntryKind::Other(s) => s,
        }
    }
}

impl From<String> for EntryKind {
    fn from(s: String) -> Self {
        match s.trim() {
            "Sale" => EntryKind::Sale,
            "Purchase" => EntryKind::Purchase,
            "Payment" => EntryKind::Payment,
            "Receipt" => EntryKind::Receipt,
            other => EntryKind::Other(other.to_string()),
        }
    }
}

impl From<&str> for EntryKind {
    fn from(s: &str) -> Self {
        EntryKind::from(s.to_string())
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an entry was settled. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Cheque,
    BankTransfer,
    Credit,
    Other(String),
}

impl PaymentMethod {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Credit => "Credit",
            PaymentMethod::Other(s) => s,
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "upi" => PaymentMethod::Upi,
            "card" => PaymentMethod::Card,
            "cheque" | "check" => PaymentMethod::Cheque,
            "bank transfer" | "bank_transfer" | "neft" | "rtgs" => PaymentMethod::BankTransfer,
            "credit" => PaymentMethod::Credit,
            _ => PaymentMethod::Other(s.trim().to_string()),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(s: &str) -> Self {
        PaymentMethod::from(s.to_string())
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line of the party ledger.
/// Entries are immutable: the balance is a snapshot taken when the entry was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Insertion order, assigned by the store. Last tie-breaker when ordering.
    pub sequence: i64,
    /// When the transaction is effective
    pub date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub party_type: PartyType,
    pub party_id: PartyId,
    pub party_name: String,
    pub mobile_number: Option<String>,
    pub kind: EntryKind,
    /// Invoice or voucher number
    pub reference_no: String,
    pub payment_method: Option<PaymentMethod>,
    pub debit: Cents,
    pub credit: Cents,
    /// Running balance of the party after this entry
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn party_key(&self) -> PartyKey {
        PartyKey::new(self.party_type, self.party_id.clone())
    }
}

/// Input for recording an entry. Required fields are optional here so that
/// missing ones can be reported together.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub party_type: Option<PartyType>,
    pub party_id: Option<String>,
    pub party_name: Option<String>,
    pub mobile_number: Option<String>,
    pub kind: Option<String>,
    pub reference_no: Option<String>,
    pub payment_method: Option<String>,
    pub debit: Option<Cents>,
    pub credit: Option<Cents>,
    pub date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A `NewEntry` whose required fields are present and amounts are valid.
#[derive(Debug, Clone)]
pub struct ValidEntry {
    pub party: PartyKey,
    pub party_name: String,
    pub mobile_number: Option<String>,
    pub kind: EntryKind,
    pub reference_no: String,
    pub payment_method: Option<PaymentMethod>,
    pub debit: Cents,
    pub credit: Cents,
    pub date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    MissingFields(Vec<&'static str>),
    NegativeAmount { field: &'static str, amount: Cents },
}

impl std::fmt::Display for EntryValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryValidationError::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            EntryValidationError::NegativeAmount { field, amount } => {
                write!(
                    f,
                    "{} must not be negative (got {})",
                    field,
                    super::format_cents(*amount)
                )
            }
        }
    }
}

impl std::error::Error for EntryValidationError {}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewEntry {
    pub fn new(
        party_type: PartyType,
        party_id: impl Into<String>,
        party_name: impl Into<String>,
        kind: impl Into<String>,
        reference_no: impl Into<String>,
    ) -> Self {
        Self {
            party_type: Some(party_type),
            party_id: Some(party_id.into()),
            party_name: Some(party_name.into()),
            kind: Some(kind.into()),
            reference_no: Some(reference_no.into()),
            ..Default::default()
        }
    }

    pub fn with_debit(mut self, debit: Cents) -> Self {
        self.debit = Some(debit);
        self
    }

    pub fn with_credit(mut self, credit: Cents) -> Self {
        self.credit = Some(credit);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_mobile_number(mut self, mobile_number: impl Into<String>) -> Self {
        self.mobile_number = Some(mobile_number.into());
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    /// Check required fields and amounts. Blank strings count as missing.
    pub fn validate(self) -> Result<ValidEntry, EntryValidationError> {
        let party_id = present(self.party_id);
        let party_name = present(self.party_name);
        let kind = present(self.kind);
        let reference_no = present(self.reference_no);

        let mut missing = Vec::new();
        if self.party_type.is_none() {
            missing.push("partyType");
        }
        if party_id.is_none() {
            missing.push("partyId");
        }
        if party_name.is_none() {
            missing.push("partyName");
        }
        if kind.is_none() {
            missing.push("type");
        }
        if reference_no.is_none() {
            missing.push("referenceNo");
        }

        let (Some(party_type), Some(party_id), Some(party_name), Some(kind), Some(reference_no)) =
            (self.party_type, party_id, party_name, kind, reference_no)
        else {
            return Err(EntryValidationError::MissingFields(missing));
        };

        let debit = self.debit.unwrap_or(0);
        let credit = self.credit.unwrap_or(0);
        if debit < 0 {
            return Err(EntryValidationError::NegativeAmount {
                field: "debit",
                amount: debit,
            });
        }
        if credit < 0 {
            return Err(EntryValidationError::NegativeAmount {
                field: "credit",
                amount: credit,
            });
        }

        Ok(ValidEntry {
            party: PartyKey::new(party_type, party_id),
            party_name,
            mobile_number: present(self.mobile_number),
            kind: EntryKind::from(kind),
            reference_no,
            payment_method: present(self.payment_method).map(PaymentMethod::from),
            debit,
            credit,
            date: self.date,
            due_date: self.due_date,
        })
    }
}

impl ValidEntry {
    /// Materialize the entry with its computed balance.
    /// `sequence` is left at 0 for the store to assign.
    pub fn into_entry(self, balance: Cents, now: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            sequence: 0,
            date: self.date.unwrap_or(now),
            due_date: self.due_date,
            party_type: self.party.party_type,
            party_id: self.party.party_id,
            party_name: self.party_name,
            mobile_number: self.mobile_number,
            kind: self.kind,
            reference_no: self.reference_no,
            payment_method: self.payment_method,
            debit: self.debit,
            credit: self.credit,
            balance,
            created_at: now,
        }
    }
}
