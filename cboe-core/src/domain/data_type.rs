use serde::{Deserialize, Serialize};

/// Discriminant the host pipeline uses to dispatch records.
///
/// Custom sources such as CBOE are always `Base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketDataType {
    Base,
    TradeBar,
    QuoteBar,
    Tick,
    Auxiliary,
}

impl MarketDataType {
    /// Stable one-byte code used by the binary codec.
    pub fn code(self) -> u8 {
        match self {
            MarketDataType::Base => 0,
            MarketDataType::TradeBar => 1,
            MarketDataType::QuoteBar => 2,
            MarketDataType::Tick => 3,
            MarketDataType::Auxiliary => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MarketDataType::Base),
            1 => Some(MarketDataType::TradeBar),
            2 => Some(MarketDataType::QuoteBar),
            3 => Some(MarketDataType::Tick),
            4 => Some(MarketDataType::Auxiliary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_reversible() {
        for dt in [
            MarketDataType::Base,
            MarketDataType::TradeBar,
            MarketDataType::QuoteBar,
            MarketDataType::Tick,
            MarketDataType::Auxiliary,
        ] {
            assert_eq!(MarketDataType::from_code(dt.code()), Some(dt));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(MarketDataType::from_code(200), None);
    }
}
