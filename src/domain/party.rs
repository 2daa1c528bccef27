use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type PartyId = String;

/// Which side of the business a party sits on.
/// Suppliers and customers keep independent running balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    Supplier,
    Customer,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Supplier => "supplier",
            PartyType::Customer => "customer",
        }
    }
}

impl FromStr for PartyType {
    type Err = UnknownPartyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "supplier" => Ok(PartyType::Supplier),
            "customer" => Ok(PartyType::Customer),
            _ => Err(UnknownPartyType(s.to_string())),
        }
    }
}

impl std::fmt::Display for PartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPartyType(pub String);

impl std::fmt::Display for UnknownPartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown party type '{}' (expected supplier or customer)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPartyType {}

/// Identifies one running-balance sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyKey {
    pub party_type: PartyType,
    pub party_id: PartyId,
}

impl PartyKey {
    pub fn new(party_type: PartyType, party_id: impl Into<PartyId>) -> Self {
        Self {
            party_type,
            party_id: party_id.into(),
        }
    }
}

impl std::fmt::Display for PartyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.party_type, self.party_id)
    }
}
