//! JSON codec.
//!
//! Single records use the record type's own serde shape. Mixed streams use
//! [`DataRecord`]'s `type`-tagged shape, one record per line (JSONL).

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CodecError, DataRecord};

pub fn to_json<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize records as JSONL, each line tagged with its record type.
pub fn to_json_lines(records: &[DataRecord]) -> Result<String, CodecError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse JSONL produced by [`to_json_lines`]. Blank lines are ignored.
pub fn from_json_lines(jsonl: &str) -> Result<Vec<DataRecord>, CodecError> {
    jsonl
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<DataRecord>(line).map_err(CodecError::from))
        .collect()
}
