//! Record serialization: JSON for interchange, a tagged binary format for storage.
//!
//! Both codecs work on [`DataRecord`], the closed set of record types this
//! crate can produce. Dispatch is by an explicit tag, never by runtime type
//! inspection.

pub mod binary;
pub mod json;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CboeBar, Symbol};

pub use binary::{BinaryRecord, CboeBody, Registration, FORMAT_VERSION, REGISTRY};

/// Any record a reader in this crate produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataRecord {
    Cboe(CboeBar),
}

impl DataRecord {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataRecord::Cboe(_) => CboeBar::TYPE_NAME,
        }
    }

    /// Binary type tag of the record.
    pub fn type_tag(&self) -> u16 {
        match self {
            DataRecord::Cboe(_) => CboeBar::TYPE_TAG,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            DataRecord::Cboe(bar) => &bar.symbol,
        }
    }

    pub fn time(&self) -> NaiveDateTime {
        match self {
            DataRecord::Cboe(bar) => bar.time,
        }
    }

    pub fn end_time(&self) -> NaiveDateTime {
        match self {
            DataRecord::Cboe(bar) => bar.end_time(),
        }
    }
}

impl From<CboeBar> for DataRecord {
    fn from(bar: CboeBar) -> Self {
        DataRecord::Cboe(bar)
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON codec: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary record truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated { needed: usize, offset: usize, available: usize },

    #[error("no decoder registered for type tag {0}")]
    UnknownTag(u16),

    #[error("type tag mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: u16, found: u16 },

    #[error("unsupported binary format version {0}")]
    UnsupportedVersion(u8),

    #[error("binary body: {0}")]
    Borsh(#[from] std::io::Error),

    #[error("frame of {0} bytes does not fit a u32 length prefix")]
    FrameTooLarge(usize),

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}
