//! Symbol and security identifier.
//!
//! A trimmed stand-in for the host engine's symbol model: enough identity to
//! key a custom-data subscription and compare symbols by value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market identifiers.
pub mod market {
    pub const USA: &str = "usa";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    /// Custom data with no tradable underlying.
    Base,
    Equity,
    Index,
    Option,
    Future,
}

/// Unique identity of a security, independent of its display ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityIdentifier {
    pub ticker: String,
    pub market: String,
    pub security_type: SecurityType,
    /// Name of the custom data type, set for `SecurityType::Base` identifiers.
    pub data_type: Option<String>,
}

impl SecurityIdentifier {
    /// Identifier for a custom data series, e.g. `("CBOE", "VIX", "usa")`.
    pub fn generate_base(data_type: &str, ticker: &str, market: &str) -> Self {
        Self {
            ticker: ticker.trim().to_ascii_uppercase(),
            market: market.trim().to_ascii_lowercase(),
            security_type: SecurityType::Base,
            data_type: Some(data_type.to_string()),
        }
    }

    pub fn empty() -> Self {
        Self {
            ticker: String::new(),
            market: String::new(),
            security_type: SecurityType::Base,
            data_type: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ticker.is_empty() && self.market.is_empty() && self.data_type.is_none()
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data_type {
            Some(dt) => write!(f, "{}.{} {:?} {}", self.ticker, dt, self.security_type, self.market),
            None => write!(f, "{} {:?} {}", self.ticker, self.security_type, self.market),
        }
    }
}

/// A security identifier paired with its current ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SecurityIdentifier,
    pub value: String,
}

impl Symbol {
    pub fn new(id: SecurityIdentifier, value: impl Into<String>) -> Self {
        Self { id, value: value.into() }
    }

    /// Symbol for a custom data series; the ticker doubles as the display value.
    pub fn custom(data_type: &str, ticker: &str, market: &str) -> Self {
        let id = SecurityIdentifier::generate_base(data_type, ticker, market);
        let value = id.ticker.clone();
        Self { id, value }
    }

    /// Placeholder symbol carried by records decoded without identity.
    pub fn empty() -> Self {
        Self { id: SecurityIdentifier::empty(), value: String::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.id.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
