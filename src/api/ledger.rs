//! Ledger API handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::application::{AppError, LedgerPage, LedgerSummary};
use crate::domain::{
    cents_from_units, cents_to_units, parse_cents, parse_date_bound, Cents, DayBound,
    LedgerEntry, LedgerFilter, NewEntry, PartyKey, PartyType,
};

use super::{ApiResult, AppState};

/// Amount as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn to_cents(&self, field: &str) -> ApiResult<Cents> {
        let parsed = match self {
            Amount::Number(n) => cents_from_units(*n),
            Amount::Text(s) if s.trim().is_empty() => Ok(0),
            Amount::Text(s) => parse_cents(s),
        };
        parsed.map_err(|e| AppError::validation(format!("{field}: {e}")))
    }
}

/// A JSON string or number, kept as text. Identifiers such as phone numbers
/// and invoice numbers are often sent as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Number(n) => n.to_string(),
        }),
    )
}

/// POST /api/ledger body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub party_type: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub party_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub party_name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub mobile_number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub reference_no: Option<String>,
    pub payment_method: Option<String>,
    pub debit: Option<Amount>,
    pub credit: Option<Amount>,
    pub due_date: Option<String>,
    pub date: Option<String>,
}

fn optional_date(value: Option<&str>, field: &str) -> ApiResult<Option<DateTime<Utc>>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse_date_bound(v, DayBound::Start)
                .map_err(|e| AppError::validation(format!("{field}: {e}")))
        })
        .transpose()
}

impl CreateEntryRequest {
    fn into_new_entry(self) -> ApiResult<NewEntry> {
        let party_type = match self.party_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(
                s.parse::<PartyType>()
                    .map_err(|e| AppError::validation(e.to_string()))?,
            ),
        };

        Ok(NewEntry {
            party_type,
            party_id: self.party_id,
            party_name: self.party_name,
            mobile_number: self.mobile_number,
            kind: self.kind,
            reference_no: self.reference_no,
            payment_method: self.payment_method,
            debit: self.debit.map(|a| a.to_cents("debit")).transpose()?,
            credit: self.credit.map(|a| a.to_cents("credit")).transpose()?,
            date: optional_date(self.date.as_deref(), "date")?,
            due_date: optional_date(self.due_date.as_deref(), "dueDate")?,
        })
    }
}

/// Ledger entry as returned to clients. Amounts are in currency units.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: String,
    pub sequence: i64,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub party_type: PartyType,
    pub party_id: String,
    pub party_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub reference_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub debit: f64,
    pub credit: f64,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for EntryView {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            sequence: entry.sequence,
            date: entry.date,
            due_date: entry.due_date,
            party_type: entry.party_type,
            party_id: entry.party_id,
            party_name: entry.party_name,
            mobile_number: entry.mobile_number,
            kind: entry.kind.to_string(),
            reference_no: entry.reference_no,
            payment_method: entry.payment_method.map(|m| m.to_string()),
            debit: cents_to_units(entry.debit),
            credit: cents_to_units(entry.credit),
            balance: cents_to_units(entry.balance),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub success: bool,
    pub message: &'static str,
    pub entry: EntryView,
}

/// POST /api/ledger - record an entry
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateEntryResponse>)> {
    let Json(payload) = payload?;
    let input = payload.into_new_entry()?;
    let entry = state.service.record_entry(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            success: true,
            message: "Entry added",
            entry: entry.into(),
        }),
    ))
}

/// Query string of the ledger views. Numbers are parsed leniently:
/// anything unparsable falls back to the default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerParams {
    pub search: Option<String>,
    #[serde(alias = "type")]
    pub filter_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn lenient_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<f64>().ok()).and_then(|n| {
        if n.is_finite() {
            Some(n.trunc() as i64)
        } else {
            None
        }
    })
}

impl From<LedgerParams> for LedgerFilter {
    fn from(params: LedgerParams) -> Self {
        LedgerFilter {
            page: lenient_int(params.page.as_deref()),
            limit: lenient_int(params.limit.as_deref()),
            search: params.search,
            kind: params.filter_type,
            from_date: params.from_date,
            to_date: params.to_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub success: bool,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub total_debit: f64,
    pub total_credit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers_with_balance: Option<usize>,
    pub ledger: Vec<EntryView>,
}

impl From<LedgerPage> for LedgerResponse {
    fn from(page: LedgerPage) -> Self {
        let (net_balance, customers_with_balance) = match page.summary {
            LedgerSummary::Supplier { net_balance } => (Some(cents_to_units(net_balance)), None),
            LedgerSummary::Customer {
                customers_with_balance,
            } => (None, Some(customers_with_balance)),
        };

        Self {
            success: true,
            total_count: page.total_count,
            page: page.page.page,
            limit: page.page.limit,
            total_debit: cents_to_units(page.totals.debit),
            total_credit: cents_to_units(page.totals.credit),
            net_balance,
            customers_with_balance,
            ledger: page.entries.into_iter().map(EntryView::from).collect(),
        }
    }
}

/// GET /api/ledger/supplier
pub async fn supplier(
    State(state): State<AppState>,
    Query(params): Query<LedgerParams>,
) -> ApiResult<Json<LedgerResponse>> {
    let page = state.service.supplier_ledger(&params.into()).await?;
    Ok(Json(page.into()))
}

/// GET /api/ledger/customer
pub async fn customer(
    State(state): State<AppState>,
    Query(params): Query<LedgerParams>,
) -> ApiResult<Json<LedgerResponse>> {
    let page = state.service.customer_ledger(&params.into()).await?;
    Ok(Json(page.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub success: bool,
    pub party_type: PartyType,
    pub party_id: String,
    pub balance: f64,
}

/// GET /api/ledger/{party_type}/{party_id}/balance
pub async fn balance(
    State(state): State<AppState>,
    Path((party_type, party_id)): Path<(String, String)>,
) -> ApiResult<Json<BalanceResponse>> {
    let party_type: PartyType = party_type
        .parse()
        .map_err(|e: crate::domain::UnknownPartyType| AppError::NotFound(e.to_string()))?;
    let party = PartyKey::new(party_type, party_id);
    let balance = state.service.party_balance(&party).await?;

    Ok(Json(BalanceResponse {
        success: true,
        party_type: party.party_type,
        party_id: party.party_id,
        balance: cents_to_units(balance),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        assert_eq!(Amount::Number(12.5).to_cents("debit").unwrap(), 1250);
        assert_eq!(Amount::Text("99.99".into()).to_cents("debit").unwrap(), 9999);
        assert_eq!(Amount::Text("".into()).to_cents("debit").unwrap(), 0);
        assert!(Amount::Text("ten".into()).to_cents("debit").is_err());
    }

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int(Some("2")), Some(2));
        assert_eq!(lenient_int(Some(" 10 ")), Some(10));
        assert_eq!(lenient_int(Some("2.7")), Some(2));
        assert_eq!(lenient_int(Some("abc")), None);
        assert_eq!(lenient_int(Some("")), None);
        assert_eq!(lenient_int(None), None);
    }

    #[test]
    fn test_identifiers_accept_numbers() {
        let request: CreateEntryRequest = serde_json::from_value(serde_json::json!({
            "partyId": 42,
            "partyName": "Acme",
            "mobileNumber": 9876543210u64,
            "referenceNo": "INV-7",
        }))
        .unwrap();

        assert_eq!(request.party_id.as_deref(), Some("42"));
        assert_eq!(request.mobile_number.as_deref(), Some("9876543210"));
        assert_eq!(request.reference_no.as_deref(), Some("INV-7"));
    }

    #[test]
    fn test_null_and_absent_identifiers_are_missing() {
        let request: CreateEntryRequest =
            serde_json::from_value(serde_json::json!({ "partyId": null })).unwrap();
        assert!(request.party_id.is_none());
        assert!(request.mobile_number.is_none());
    }

    #[test]
    fn test_unknown_party_type_is_rejected() {
        let request = CreateEntryRequest {
            party_type: Some("vendor".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.into_new_entry(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_party_type_counts_as_missing() {
        let request = CreateEntryRequest {
            party_type: Some(" ".into()),
            ..Default::default()
        };
        let entry = request.into_new_entry().unwrap();
        assert!(entry.party_type.is_none());
    }
}
