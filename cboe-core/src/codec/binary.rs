//! Tagged binary codec.
//!
//! Every record starts with a header naming its type so a reader can pick
//! the right decoder from [`REGISTRY`]. The header and body are borsh-encoded:
//!
//! ```text
//! header  | tag: u16 | version: u8 |
//! CBOE    | time secs: i64 | time nanos: u32 | period secs: i64 | period nanos: i32 |
//!         | data_type: u8 | open | high | low | close |          (16-byte decimals)
//! ```
//!
//! The symbol is not part of the binary layout; decoded records carry
//! [`Symbol::empty`] and the caller re-attaches the subscription's symbol.

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::DateTime;
use rust_decimal::Decimal;

use super::{CodecError, DataRecord};
use crate::domain::bar::period_parts;
use crate::domain::{CboeBar, MarketDataType, Symbol};

pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 3;

/// Stream frames are prefixed with their length as a `u32`.
const FRAME_PREFIX_LEN: usize = 4;

/// Largest scale a decimal can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// A record type with a borsh-encoded body.
pub trait BinaryRecord: Sized {
    /// Tag written into the header; unique across [`REGISTRY`].
    const TYPE_TAG: u16;

    type Body: BorshSerialize + BorshDeserialize;

    fn to_body(&self) -> Self::Body;

    fn from_body(body: Self::Body) -> Result<Self, CodecError>;
}

pub type DecodeFn = fn(&mut &[u8]) -> Result<DataRecord, CodecError>;

/// One entry of the decoder table.
#[derive(Clone, Copy)]
pub struct Registration {
    pub tag: u16,
    pub type_name: &'static str,
    pub decode: DecodeFn,
}

/// Every record type the binary codec understands.
pub static REGISTRY: &[Registration] = &[Registration {
    tag: CboeBar::TYPE_TAG,
    type_name: CboeBar::TYPE_NAME,
    decode: decode_cboe,
}];

fn decode_cboe(buf: &mut &[u8]) -> Result<DataRecord, CodecError> {
    decode_body::<CboeBar>(buf).map(DataRecord::Cboe)
}

pub fn lookup(tag: u16) -> Option<&'static Registration> {
    REGISTRY.iter().find(|r| r.tag == tag)
}

#[derive(BorshSerialize, BorshDeserialize)]
struct Header {
    tag: u16,
    version: u8,
}

/// Splits off and checks the header, returning the tag and the body bytes.
fn read_header(bytes: &[u8]) -> Result<(u16, &[u8]), CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated { needed: HEADER_LEN, offset: 0, available: bytes.len() });
    }
    let (head, body) = bytes.split_at(HEADER_LEN);
    let header = Header::try_from_slice(head)?;
    if header.version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(header.version));
    }
    Ok((header.tag, body))
}

fn decode_body<T: BinaryRecord>(buf: &mut &[u8]) -> Result<T, CodecError> {
    let body = T::Body::deserialize(buf)?;
    T::from_body(body)
}

fn finish(rest: &[u8]) -> Result<(), CodecError> {
    match rest.len() {
        0 => Ok(()),
        n => Err(CodecError::TrailingBytes(n)),
    }
}

/// Encode a single record of a known type.
pub fn encode<T: BinaryRecord>(record: &T) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(HEADER_LEN + 96);
    Header { tag: T::TYPE_TAG, version: FORMAT_VERSION }.serialize(&mut out)?;
    record.to_body().serialize(&mut out)?;
    Ok(out)
}

pub fn encode_record(record: &DataRecord) -> Result<Vec<u8>, CodecError> {
    match record {
        DataRecord::Cboe(bar) => encode(bar),
    }
}

/// Decode a record whose type the caller already knows.
pub fn decode<T: BinaryRecord>(bytes: &[u8]) -> Result<T, CodecError> {
    let (tag, mut body) = read_header(bytes)?;
    if tag != T::TYPE_TAG {
        return Err(CodecError::TypeMismatch { expected: T::TYPE_TAG, found: tag });
    }
    let record = decode_body::<T>(&mut body)?;
    finish(body)?;
    Ok(record)
}

/// Decode a record of any registered type.
pub fn decode_record(bytes: &[u8]) -> Result<DataRecord, CodecError> {
    let (tag, mut body) = read_header(bytes)?;
    let registration = lookup(tag).ok_or(CodecError::UnknownTag(tag))?;
    let record = (registration.decode)(&mut body)?;
    finish(body)?;
    Ok(record)
}

fn frame_len(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::FrameTooLarge(len))
}

/// Encode records as a sequence of `u32` length-prefixed frames.
pub fn encode_stream(records: &[DataRecord]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for record in records {
        let frame = encode_record(record)?;
        frame_len(frame.len())?.serialize(&mut out)?;
        out.extend_from_slice(&frame);
    }
    Ok(out)
}

pub fn decode_stream(bytes: &[u8]) -> Result<Vec<DataRecord>, CodecError> {
    let mut rest = bytes;
    let mut records = Vec::new();
    while !rest.is_empty() {
        let offset = bytes.len() - rest.len();
        if rest.len() < FRAME_PREFIX_LEN {
            return Err(CodecError::Truncated {
                needed: FRAME_PREFIX_LEN,
                offset,
                available: rest.len(),
            });
        }
        let len = u32::deserialize(&mut rest)? as usize;
        if rest.len() < len {
            return Err(CodecError::Truncated {
                needed: len,
                offset: offset + FRAME_PREFIX_LEN,
                available: rest.len(),
            });
        }
        let (frame, tail) = rest.split_at(len);
        records.push(decode_record(frame)?);
        rest = tail;
    }
    Ok(records)
}

/// Wire body of a [`CboeBar`].
#[derive(BorshSerialize, BorshDeserialize)]
pub struct CboeBody {
    time_secs: i64,
    time_nanos: u32,
    period_secs: i64,
    period_nanos: i32,
    data_type: u8,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
}

fn checked_price(field: &'static str, price: Decimal) -> Result<Decimal, CodecError> {
    if price.scale() > MAX_DECIMAL_SCALE {
        return Err(CodecError::InvalidField {
            field,
            reason: format!("decimal scale {} exceeds {MAX_DECIMAL_SCALE}", price.scale()),
        });
    }
    Ok(price)
}

impl BinaryRecord for CboeBar {
    const TYPE_TAG: u16 = 2000;

    type Body = CboeBody;

    fn to_body(&self) -> CboeBody {
        let time = self.time.and_utc();
        let (period_secs, period_nanos) = period_parts::split(self.period);
        CboeBody {
            time_secs: time.timestamp(),
            time_nanos: time.timestamp_subsec_nanos(),
            period_secs,
            period_nanos,
            data_type: self.data_type.code(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }

    fn from_body(body: CboeBody) -> Result<Self, CodecError> {
        let CboeBody { time_secs, time_nanos, period_secs, period_nanos, data_type, .. } = body;

        let time = DateTime::from_timestamp(time_secs, time_nanos)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| CodecError::InvalidField {
                field: "time",
                reason: format!("{time_secs}s + {time_nanos}ns is out of range"),
            })?;

        let period = period_parts::join(period_secs, period_nanos).ok_or_else(|| {
            CodecError::InvalidField {
                field: "period",
                reason: format!("{period_secs}s + {period_nanos}ns is out of range"),
            }
        })?;

        let data_type = MarketDataType::from_code(data_type).ok_or_else(|| CodecError::InvalidField {
            field: "data_type",
            reason: format!("unknown code {data_type}"),
        })?;

        Ok(CboeBar {
            symbol: Symbol::empty(),
            time,
            period,
            data_type,
            open: checked_price("open", body.open)?,
            high: checked_price("high", body.high)?,
            low: checked_price("low", body.low)?,
            close: checked_price("close", body.close)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market;
    use chrono::{NaiveDate, TimeDelta};
    use rust_decimal_macros::dec;

    /// Offset of the `data_type` byte: header, time (8 + 4), period (8 + 4).
    const DATA_TYPE_OFFSET: usize = HEADER_LEN + 24;

    fn bar() -> CboeBar {
        CboeBar::new(
            Symbol::custom(CboeBar::TYPE_NAME, "VIX", market::USA),
            NaiveDate::from_ymd_opt(2020, 5, 21).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            TimeDelta::days(1),
            dec!(29.87),
            dec!(31.12),
            dec!(27.94),
            dec!(28.16),
        )
    }

    fn unnamed(mut bar: CboeBar) -> CboeBar {
        bar.symbol = Symbol::empty();
        bar
    }

    #[test]
    fn header_carries_tag_and_version() {
        let bytes = encode(&bar()).unwrap();
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), 2000);
        assert_eq!(bytes[2], FORMAT_VERSION);
        assert_eq!(bytes.len(), DATA_TYPE_OFFSET + 1 + 4 * 16);
    }

    #[test]
    fn symbol_is_not_encoded() {
        let decoded: CboeBar = decode(&encode(&bar()).unwrap()).unwrap();
        assert!(decoded.symbol.is_empty());
        assert_eq!(decoded, unnamed(bar()));
    }

    #[test]
    fn sub_millisecond_period_and_time_survive() {
        for period in [
            TimeDelta::days(1) + TimeDelta::nanoseconds(500),
            TimeDelta::microseconds(1500),
            -TimeDelta::nanoseconds(7),
        ] {
            let mut original = unnamed(bar());
            original.time += TimeDelta::nanoseconds(123_456_789);
            original.period = period;
            let decoded: CboeBar = decode(&encode(&original).unwrap()).unwrap();
            assert_eq!(decoded.period, period);
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn registry_tags_are_unique() {
        for (i, a) in REGISTRY.iter().enumerate() {
            for b in &REGISTRY[i + 1..] {
                assert_ne!(a.tag, b.tag, "{} and {} share a tag", a.type_name, b.type_name);
            }
        }
        assert_eq!(lookup(2000).map(|r| r.type_name), Some("CBOE"));
        assert!(lookup(1).is_none());
    }

    #[test]
    fn decode_record_dispatches_on_tag() {
        let record = decode_record(&encode(&bar()).unwrap()).unwrap();
        assert_eq!(record.type_name(), "CBOE");
        assert_eq!(record.time(), bar().time);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        bytes[..2].copy_from_slice(&7u16.to_le_bytes());
        assert!(matches!(decode_record(&bytes), Err(CodecError::UnknownTag(7))));
        assert!(matches!(
            decode::<CboeBar>(&bytes),
            Err(CodecError::TypeMismatch { expected: 2000, found: 7 })
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        bytes[2] = FORMAT_VERSION + 1;
        assert!(matches!(decode_record(&bytes), Err(CodecError::UnsupportedVersion(_))));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let bytes = encode(&bar()).unwrap();
        for cut in 0..HEADER_LEN {
            assert!(
                matches!(decode::<CboeBar>(&bytes[..cut]), Err(CodecError::Truncated { .. })),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn truncated_body_is_rejected() {
        let bytes = encode(&bar()).unwrap();
        for cut in [HEADER_LEN, DATA_TYPE_OFFSET, bytes.len() - 1] {
            assert!(
                matches!(decode::<CboeBar>(&bytes[..cut]), Err(CodecError::Borsh(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        bytes.push(0);
        assert!(matches!(decode_record(&bytes), Err(CodecError::TrailingBytes(1))));
    }

    #[test]
    fn bad_data_type_code_is_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        bytes[DATA_TYPE_OFFSET] = 99;
        assert!(matches!(
            decode::<CboeBar>(&bytes),
            Err(CodecError::InvalidField { field: "data_type", .. })
        ));
    }

    #[test]
    fn bad_decimal_scale_is_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        // scale byte of `open`
        bytes[DATA_TYPE_OFFSET + 1 + 2] = 40;
        assert!(decode::<CboeBar>(&bytes).is_err());
    }

    #[test]
    fn out_of_range_period_is_rejected() {
        let mut bytes = encode(&bar()).unwrap();
        // period nanos
        bytes[HEADER_LEN + 20..DATA_TYPE_OFFSET].copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(
            decode::<CboeBar>(&bytes),
            Err(CodecError::InvalidField { field: "period", .. })
        ));
    }

    #[test]
    fn stream_roundtrip_preserves_order() {
        let first = unnamed(bar());
        let mut later = unnamed(bar());
        later.time += TimeDelta::days(1);
        later.close = dec!(30.01);
        let records = vec![DataRecord::from(first), DataRecord::from(later)];
        assert_eq!(decode_stream(&encode_stream(&records).unwrap()).unwrap(), records);
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytes = encode_stream(&[DataRecord::from(bar())]).unwrap();
        for cut in [2, bytes.len() - 3] {
            assert!(
                matches!(decode_stream(&bytes[..cut]), Err(CodecError::Truncated { .. })),
                "cut at {cut}"
            );
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn frame_length_must_fit_u32() {
        assert_eq!(frame_len(96).unwrap(), 96);
        assert!(matches!(
            frame_len(u32::MAX as usize + 1),
            Err(CodecError::FrameTooLarge(len)) if len == u32::MAX as usize + 1
        ));
    }
}
