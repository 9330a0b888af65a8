//! CboeBar: one day of CBOE index OHLC values.

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{MarketDataType, Symbol};

/// OHLC bar for a CBOE index (VIX and friends) covering `[time, time + period)`.
///
/// Prices are kept exactly as published. The reader does not enforce
/// `low <= open, close <= high`; use [`CboeBar::is_sane`] when that matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CboeBar {
    pub symbol: Symbol,
    pub time: NaiveDateTime,
    #[serde(with = "period_parts")]
    pub period: TimeDelta,
    pub data_type: MarketDataType,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl CboeBar {
    /// Name the data type registers under with the host engine.
    pub const TYPE_NAME: &'static str = "CBOE";

    pub fn new(
        symbol: Symbol,
        time: NaiveDateTime,
        period: TimeDelta,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            symbol,
            time,
            period,
            data_type: MarketDataType::Base,
            open,
            high,
            low,
            close,
        }
    }

    /// End of the covered period: `time + period`.
    pub fn end_time(&self) -> NaiveDateTime {
        self.time + self.period
    }

    /// Moves the end of the bar, keeping `time` fixed.
    pub fn set_end_time(&mut self, end_time: NaiveDateTime) {
        self.period = end_time - self.time;
    }

    /// Scalar value of the record as seen by the host engine.
    pub fn value(&self) -> Decimal {
        self.close
    }

    /// OHLC sanity check: high >= low and open/close within [low, high].
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
    }

    /// Formats the bar back into the `date,open,high,low,close` line it was read from.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.time.format("%Y-%m-%d"),
            self.open,
            self.high,
            self.low,
            self.close
        )
    }
}

impl fmt::Display for CboeBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} O:{} H:{} L:{} C:{}",
            self.symbol,
            self.time.format("%Y-%m-%d"),
            self.open,
            self.high,
            self.low,
            self.close
        )
    }
}

/// Periods travel as whole seconds plus a nanosecond remainder carrying the
/// same sign, so any `TimeDelta` survives a round trip.
pub(crate) mod period_parts {
    use chrono::TimeDelta;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const NANOS_PER_SEC: u32 = 1_000_000_000;

    #[derive(Serialize, Deserialize)]
    struct Parts {
        secs: i64,
        nanos: i32,
    }

    pub fn split(period: TimeDelta) -> (i64, i32) {
        (period.num_seconds(), period.subsec_nanos())
    }

    pub fn join(secs: i64, nanos: i32) -> Option<TimeDelta> {
        if nanos.unsigned_abs() >= NANOS_PER_SEC {
            return None;
        }
        TimeDelta::try_seconds(secs)?.checked_add(&TimeDelta::nanoseconds(i64::from(nanos)))
    }

    pub fn serialize<S: Serializer>(period: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let (secs, nanos) = split(*period);
        Parts { secs, nanos }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let Parts { secs, nanos } = Parts::deserialize(deserializer)?;
        join(secs, nanos)
            .ok_or_else(|| D::Error::custom(format!("period of {secs}s + {nanos}ns is out of range")))
    }
}
