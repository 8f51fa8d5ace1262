use std::fmt;

use rust_decimal::Decimal;

/// Closed set of account kinds. The only behavioral difference is how far
/// below zero a withdrawal may take the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Standard,
    Overdraft,
}

impl AccountKind {
    /// Tag used in persisted records and batch files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Standard => "standard",
            AccountKind::Overdraft => "overdraft",
        }
    }

    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(AccountKind::Standard),
            "overdraft" => Some(AccountKind::Overdraft),
            _ => None,
        }
    }

    /// Lowest balance a debit may leave behind.
    pub fn withdrawal_floor(&self, overdraft_ceiling: Decimal) -> Decimal {
        match self {
            AccountKind::Standard => Decimal::ZERO,
            AccountKind::Overdraft => -overdraft_ceiling,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
