use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of business documents that get a human-readable running number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Purchase voucher, e.g. PUR0001
    Purchase,
    /// Purchase return, e.g. RET-001
    Return,
    /// Supplier code, e.g. CGS001
    Supplier,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Purchase => "purchase",
            DocumentKind::Return => "return",
            DocumentKind::Supplier => "supplier",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Purchase => "PUR",
            DocumentKind::Return => "RET-",
            DocumentKind::Supplier => "CGS",
        }
    }

    /// Minimum number of digits; larger numbers simply grow.
    pub fn width(&self) -> usize {
        match self {
            DocumentKind::Purchase => 4,
            DocumentKind::Return | DocumentKind::Supplier => 3,
        }
    }

    /// Name of the counter row backing this kind.
    pub fn counter_name(&self) -> String {
        format!("document:{}", self.as_str())
    }

    pub fn format_number(&self, value: i64) -> String {
        format!("{}{:0width$}", self.prefix(), value, width = self.width())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Ok(DocumentKind::Purchase),
            "return" => Ok(DocumentKind::Return),
            "supplier" => Ok(DocumentKind::Supplier),
            other => Err(format!(
                "unknown document kind '{}' (expected purchase, return or supplier)",
                other
            )),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
