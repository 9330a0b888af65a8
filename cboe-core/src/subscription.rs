//! Subscription context: what the host engine hands a reader with every line.
//!
//! A subscription names the data type, the symbol, the resolution and the
//! time zones of a requested series. It can be built in code or loaded from a
//! TOML file:
//!
//! ```toml
//! type_name = "CBOE"
//! ticker = "VIX"
//! market = "usa"
//! resolution = "daily"
//! data_time_zone = "UTC"
//! exchange_time_zone = "America/Chicago"
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{market, Resolution, Symbol};

/// Parsing context for one subscribed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Name of the data type the subscription targets (e.g. `"CBOE"`).
    pub type_name: String,
    pub symbol: Symbol,
    pub resolution: Resolution,
    /// Time zone the raw data is stamped in.
    pub data_time_zone: Tz,
    /// Time zone of the exchange the series belongs to.
    pub exchange_time_zone: Tz,
    pub fill_forward: bool,
    pub extended_market_hours: bool,
    pub is_internal_feed: bool,
    pub is_custom_data: bool,
}

impl SubscriptionConfig {
    /// Custom-data subscription in UTC with fill-forward and extended hours off.
    pub fn new(type_name: impl Into<String>, symbol: Symbol, resolution: Resolution) -> Self {
        Self {
            type_name: type_name.into(),
            symbol,
            resolution,
            data_time_zone: Tz::UTC,
            exchange_time_zone: Tz::UTC,
            fill_forward: false,
            extended_market_hours: false,
            is_internal_feed: false,
            is_custom_data: true,
        }
    }

    pub fn with_time_zones(mut self, data_time_zone: Tz, exchange_time_zone: Tz) -> Self {
        self.data_time_zone = data_time_zone;
        self.exchange_time_zone = exchange_time_zone;
        self
    }

    pub fn with_fill_forward(mut self, fill_forward: bool) -> Self {
        self.fill_forward = fill_forward;
        self
    }

    pub fn with_extended_market_hours(mut self, extended_market_hours: bool) -> Self {
        self.extended_market_hours = extended_market_hours;
        self
    }

    pub fn with_internal_feed(mut self, is_internal_feed: bool) -> Self {
        self.is_internal_feed = is_internal_feed;
        self
    }

    /// Load a subscription from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a subscription from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: SubscriptionFile = toml::from_str(content)?;
        Ok(file.into_config())
    }
}

/// On-disk shape of a subscription: the symbol is spelled as ticker + market.
#[derive(Debug, Deserialize)]
struct SubscriptionFile {
    type_name: String,
    ticker: String,
    #[serde(default = "default_market")]
    market: String,
    #[serde(default = "default_resolution")]
    resolution: Resolution,
    #[serde(default = "default_tz")]
    data_time_zone: Tz,
    #[serde(default = "default_tz")]
    exchange_time_zone: Tz,
    #[serde(default)]
    fill_forward: bool,
    #[serde(default)]
    extended_market_hours: bool,
    #[serde(default)]
    is_internal_feed: bool,
    #[serde(default = "default_true")]
    is_custom_data: bool,
}

fn default_market() -> String {
    market::USA.to_string()
}

fn default_resolution() -> Resolution {
    Resolution::Daily
}

fn default_tz() -> Tz {
    Tz::UTC
}

fn default_true() -> bool {
    true
}

impl SubscriptionFile {
    fn into_config(self) -> SubscriptionConfig {
        let symbol = Symbol::custom(&self.type_name, &self.ticker, &self.market);
        SubscriptionConfig {
            type_name: self.type_name,
            symbol,
            resolution: self.resolution,
            data_time_zone: self.data_time_zone,
            exchange_time_zone: self.exchange_time_zone,
            fill_forward: self.fill_forward,
            extended_market_hours: self.extended_market_hours,
            is_internal_feed: self.is_internal_feed,
            is_custom_data: self.is_custom_data,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read subscription file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse subscription TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the host engine should fetch a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMedium {
    LocalFile,
    RemoteFile,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,
}

/// Location and format of the raw data behind a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSource {
    pub source: String,
    pub transport: TransportMedium,
    pub format: FileFormat,
}
