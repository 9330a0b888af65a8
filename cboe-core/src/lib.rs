//! CBOE Core: custom data reader for CBOE index history (VIX and friends).
//!
//! This crate contains:
//! - Domain types (symbols, resolutions, the daily `CboeBar`)
//! - The subscription context a host engine passes to readers
//! - The `CustomDataReader` extension point and the CBOE daily line reader
//! - Series assembly with a skip-and-log policy for unusable lines
//! - JSON and tagged binary codecs with an explicit decoder registry

pub mod codec;
pub mod data;
pub mod domain;
pub mod subscription;

pub use codec::{CodecError, DataRecord};
pub use data::{CboeReader, CustomDataReader, ParseError};
pub use domain::{CboeBar, MarketDataType, Resolution, Symbol};
pub use subscription::SubscriptionConfig;
