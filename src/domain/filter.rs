use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::PartyType;

pub const DEFAULT_PAGE_LIMIT: i64 = 1000;

/// Filters accepted by the ledger views, as they arrive from a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFilter {
    /// Case-insensitive substring over party name, party id and reference number
    pub search: Option<String>,
    /// Exact entry kind, e.g. "Purchase"
    pub kind: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    pub from_date: Option<String>,
    /// `YYYY-MM-DD` (whole day included) or RFC 3339
    pub to_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Store-level predicate over ledger entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub party_type: PartyType,
    /// Already passed through `fold_case`
    pub search: Option<String>,
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EntryQuery {
    pub fn all(party_type: PartyType) -> Self {
        Self {
            party_type,
            search: None,
            kind: None,
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 1-based
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Out-of-range values fall back: page below 1 becomes 1, limit below 1 becomes the default.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.filter(|l| *l >= 1).unwrap_or(default_limit),
        }
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDate(pub String);

impl std::fmt::Display for InvalidDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid date '{}'. Use YYYY-MM-DD or an RFC 3339 timestamp",
            self.0
        )
    }
}

impl std::error::Error for InvalidDate {}

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Which end of a calendar day a bare date resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Parse a date given as a calendar day, an RFC 3339 timestamp, or a date-time
/// without offset (read as UTC).
/// A calendar day resolves to 00:00:00.000 or 23:59:59.999 UTC depending on `bound`.
pub fn parse_date_bound(input: &str, bound: DayBound) -> Result<DateTime<Utc>, InvalidDate> {
    let input = input.trim();

    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let time = match bound {
            DayBound::Start => NaiveTime::MIN,
            DayBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                .ok_or_else(|| InvalidDate(input.to_string()))?,
        };
        return Ok(day.and_time(time).and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // `datetime-local` style input
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|dt| dt.and_utc())
        .ok_or_else(|| InvalidDate(input.to_string()))
}

/// Case folding used for search, applied to the stored columns and to the term.
/// Unicode-aware, unlike SQLite's ASCII-only `LOWER()`.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LedgerFilter {
    /// Turn client filters into a store predicate. Blank strings are ignored.
    pub fn to_query(&self, party_type: PartyType) -> Result<EntryQuery, InvalidDate> {
        Ok(EntryQuery {
            party_type,
            search: non_blank(&self.search).map(fold_case),
            kind: non_blank(&self.kind).map(str::to_string),
            from: non_blank(&self.from_date)
                .map(|d| parse_date_bound(d, DayBound::Start))
                .transpose()?,
            to: non_blank(&self.to_date)
                .map(|d| parse_date_bound(d, DayBound::End))
                .transpose()?,
        })
    }

    pub fn page(&self, default_limit: i64) -> Page {
        Page::new(self.page, self.limit, default_limit)
    }
}
