//! Property tests for the CBOE record.
//!
//! Uses proptest to verify:
//! 1. JSON round trip preserves every field, including nanosecond times and periods
//! 2. Binary round trip preserves every field except the symbol
//! 3. Clones are equal and independent
//! 4. Reading a formatted line reproduces the bar and its one-day end time

use cboe_core::codec::{binary, json};
use cboe_core::domain::{market, CboeBar, Resolution, Symbol};
use cboe_core::{CboeReader, CustomDataReader, SubscriptionConfig};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000, 0u32..=8).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..20_000).prop_map(|offset| NaiveDate::from_ymd_opt(1990, 1, 2).unwrap() + TimeDelta::days(offset))
}

fn arb_symbol() -> impl Strategy<Value = Symbol> {
    prop_oneof![
        Just(Symbol::empty()),
        "[A-Z]{2,5}".prop_map(|ticker| Symbol::custom(CboeBar::TYPE_NAME, &ticker, market::USA)),
    ]
}

fn arb_time() -> impl Strategy<Value = NaiveDateTime> {
    (arb_date(), 0u32..86_400, 0u32..1_000_000_000).prop_map(|(date, secs, nanos)| {
        date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap())
    })
}

/// Any period a bar can carry, down to the nanosecond and including negatives.
fn arb_period() -> impl Strategy<Value = TimeDelta> {
    prop_oneof![
        Just(TimeDelta::days(1)),
        (-3_650i64 * 86_400..3_650 * 86_400, 0i64..1_000_000_000)
            .prop_map(|(secs, nanos)| TimeDelta::seconds(secs) + TimeDelta::nanoseconds(nanos)),
        (0i64..1_000_000).prop_map(TimeDelta::nanoseconds),
    ]
}

fn arb_bar() -> impl Strategy<Value = CboeBar> {
    (
        arb_symbol(),
        arb_time(),
        arb_period(),
        arb_price(),
        arb_price(),
        arb_price(),
        arb_price(),
    )
        .prop_map(|(symbol, time, period, open, high, low, close)| {
            CboeBar::new(symbol, time, period, open, high, low, close)
        })
}

/// Bars as the daily reader produces them: midnight start, one-day period.
fn arb_daily_bar() -> impl Strategy<Value = CboeBar> {
    (arb_symbol(), arb_date(), arb_price(), arb_price(), arb_price(), arb_price()).prop_map(
        |(symbol, date, open, high, low, close)| {
            CboeBar::new(
                symbol,
                date.and_hms_opt(0, 0, 0).unwrap(),
                TimeDelta::days(1),
                open,
                high,
                low,
                close,
            )
        },
    )
}

// ── Round trips ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn json_round_trip_preserves_all_fields(bar in arb_bar()) {
        let result: CboeBar = json::from_json(&json::to_json(&bar).unwrap()).unwrap();
        prop_assert_eq!(result, bar);
    }

    #[test]
    fn binary_round_trip_preserves_all_but_symbol(bar in arb_bar()) {
        let result: CboeBar = binary::decode(&binary::encode(&bar).unwrap()).unwrap();
        let mut expected = bar;
        expected.symbol = Symbol::empty();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn clone_is_equal_and_independent(bar in arb_bar(), bump in arb_price()) {
        let mut copy = bar.clone();
        prop_assert_eq!(&copy, &bar);
        let original_close = bar.close;
        copy.close += bump + Decimal::ONE;
        prop_assert_eq!(bar.close, original_close);
        prop_assert_ne!(copy, bar);
    }
}

// ── Reader ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn formatted_line_reads_back(bar in arb_daily_bar()) {
        let config = SubscriptionConfig::new(CboeBar::TYPE_NAME, bar.symbol.clone(), Resolution::Daily);
        let date = bar.time.date();
        let read = CboeReader::default()
            .read(&config, &bar.to_csv_line(), date, false)
            .unwrap()
            .unwrap();
        prop_assert_eq!(read.end_time(), bar.time + TimeDelta::days(1));
        prop_assert_eq!(read, bar);
    }

    #[test]
    fn reader_never_panics(line in "\\PC{0,64}") {
        let config = SubscriptionConfig::new(CboeBar::TYPE_NAME, Symbol::empty(), Resolution::Daily);
        let date = NaiveDate::from_ymd_opt(2020, 5, 21).unwrap();
        let _ = CboeReader::default().read(&config, &line, date, false);
    }
}
