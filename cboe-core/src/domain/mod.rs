//! Domain types for CBOE daily data

pub mod bar;
pub mod data_type;
pub mod resolution;
pub mod symbol;

pub use bar::CboeBar;
pub use data_type::MarketDataType;
pub use resolution::{ParseResolutionError, Resolution};
pub use symbol::{market, SecurityIdentifier, SecurityType, Symbol};
