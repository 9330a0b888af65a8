//! Custom data readers and the CBOE daily bar reader.
//!
//! A reader turns one line of source text into at most one record, given the
//! subscription it belongs to. Readers are stateless: the host engine may call
//! `read` from any number of threads at once.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::domain::{CboeBar, Resolution};
use crate::subscription::{FileFormat, SubscriptionConfig, SubscriptionSource, TransportMedium};

/// Extension point for data formats the host engine does not know natively.
pub trait CustomDataReader: Send + Sync {
    type Output;

    /// Name the data type registers under.
    fn type_name(&self) -> &'static str;

    /// Where the raw data for `config` on `date` lives.
    fn source(&self, config: &SubscriptionConfig, date: NaiveDate, is_live: bool) -> SubscriptionSource;

    /// Parse one line. `Ok(None)` means the line carries no record (header, blank).
    fn read(
        &self,
        config: &SubscriptionConfig,
        line: &str,
        date: NaiveDate,
        is_live: bool,
    ) -> Result<Option<Self::Output>, ParseError>;

    fn default_resolution(&self) -> Resolution;

    fn supported_resolutions(&self) -> &'static [Resolution];

    /// Whether tickers must be mapped through symbol changes.
    fn requires_mapping(&self) -> bool;

    /// Whether gaps between records are expected.
    fn is_sparse_data(&self) -> bool;

    fn data_time_zone(&self) -> Tz;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found} in line '{line}'")]
    FieldCount { expected: usize, found: usize, line: String },

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("invalid {field} price '{value}': {reason}")]
    InvalidPrice { field: &'static str, value: String, reason: String },

    #[error("resolution {0} is not supported by this reader")]
    UnsupportedResolution(Resolution),
}

/// Number of columns in a CBOE daily line: `date,open,high,low,close`.
const CBOE_FIELDS: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";

static DAILY_ONLY: [Resolution; 1] = [Resolution::Daily];

/// Reader for CBOE index history files (VIX, VIX9D, VVIX, ...).
#[derive(Debug, Clone)]
pub struct CboeReader {
    data_root: PathBuf,
}

impl CboeReader {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into() }
    }
}

impl Default for CboeReader {
    fn default() -> Self {
        Self::new("data")
    }
}

impl CustomDataReader for CboeReader {
    type Output = CboeBar;

    fn type_name(&self) -> &'static str {
        CboeBar::TYPE_NAME
    }

    fn source(&self, config: &SubscriptionConfig, _date: NaiveDate, _is_live: bool) -> SubscriptionSource {
        let path = self
            .data_root
            .join("alternative")
            .join("cboe")
            .join(format!("{}.csv", config.symbol.value.to_ascii_lowercase()));
        SubscriptionSource {
            source: path.to_string_lossy().into_owned(),
            transport: TransportMedium::LocalFile,
            format: FileFormat::Csv,
        }
    }

    fn read(
        &self,
        config: &SubscriptionConfig,
        line: &str,
        _date: NaiveDate,
        _is_live: bool,
    ) -> Result<Option<CboeBar>, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_header(trimmed) {
            debug!(line = trimmed, "skipping non-data line");
            return Ok(None);
        }

        if config.resolution != Resolution::Daily {
            return Err(ParseError::UnsupportedResolution(config.resolution));
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() != CBOE_FIELDS {
            return Err(ParseError::FieldCount {
                expected: CBOE_FIELDS,
                found: fields.len(),
                line: trimmed.to_string(),
            });
        }

        let date = NaiveDate::parse_from_str(fields[0], DATE_FORMAT).map_err(|e| {
            ParseError::InvalidDate { value: fields[0].to_string(), reason: e.to_string() }
        })?;

        let open = parse_price("open", fields[1])?;
        let high = parse_price("high", fields[2])?;
        let low = parse_price("low", fields[3])?;
        let close = parse_price("close", fields[4])?;

        Ok(Some(CboeBar::new(
            config.symbol.clone(),
            date.and_time(NaiveTime::MIN),
            config.resolution.to_duration(),
            open,
            high,
            low,
            close,
        )))
    }

    fn default_resolution(&self) -> Resolution {
        Resolution::Daily
    }

    fn supported_resolutions(&self) -> &'static [Resolution] {
        &DAILY_ONLY
    }

    fn requires_mapping(&self) -> bool {
        false
    }

    fn is_sparse_data(&self) -> bool {
        false
    }

    fn data_time_zone(&self) -> Tz {
        Tz::UTC
    }
}

/// A header names its first column `date`, in any case.
fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .is_some_and(|first| first.trim().eq_ignore_ascii_case("date"))
}

fn parse_price(field: &'static str, value: &str) -> Result<Decimal, ParseError> {
    Decimal::from_str(value).map_err(|e| ParseError::InvalidPrice {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
