//! Series assembly: feeding many lines through a reader.
//!
//! Stands in for the host engine's per-subscription loop. Unusable lines are
//! logged and skipped rather than aborting the series; the report records
//! which lines were dropped and why.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::reader::{CustomDataReader, ParseError};
use crate::domain::bar::period_parts;
use crate::domain::CboeBar;
use crate::subscription::SubscriptionConfig;

/// A line the reader rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based line number in the input.
    pub line_number: usize,
    pub error: ParseError,
}

/// Outcome of reading a whole series.
#[derive(Debug, Clone)]
pub struct SeriesReport<T> {
    /// Records in input order.
    pub records: Vec<T>,
    pub skipped: Vec<SkippedLine>,
    /// Header and blank lines.
    pub non_data_lines: usize,
}

impl<T> SeriesReport<T> {
    fn new() -> Self {
        Self { records: Vec::new(), skipped: Vec::new(), non_data_lines: 0 }
    }

    fn push(&mut self, line_number: usize, outcome: Result<Option<T>, ParseError>) {
        match outcome {
            Ok(Some(record)) => self.records.push(record),
            Ok(None) => self.non_data_lines += 1,
            Err(error) => {
                warn!(line_number, %error, "skipping unusable line");
                self.skipped.push(SkippedLine { line_number, error });
            }
        }
    }

    /// True when every data line produced a record.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("read series from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read lines sequentially.
pub fn read_series<R, I, S>(
    reader: &R,
    config: &SubscriptionConfig,
    lines: I,
    date: NaiveDate,
    is_live: bool,
) -> SeriesReport<R::Output>
where
    R: CustomDataReader,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = SeriesReport::new();
    for (i, line) in lines.into_iter().enumerate() {
        report.push(i + 1, reader.read(config, line.as_ref(), date, is_live));
    }
    debug!(
        records = report.records.len(),
        skipped = report.skipped.len(),
        "series read"
    );
    report
}

/// Read lines on the rayon pool. Output order matches input order.
pub fn read_series_parallel<R, S>(
    reader: &R,
    config: &SubscriptionConfig,
    lines: &[S],
    date: NaiveDate,
    is_live: bool,
) -> SeriesReport<R::Output>
where
    R: CustomDataReader,
    R::Output: Send,
    S: AsRef<str> + Sync,
{
    let outcomes: Vec<_> = lines
        .par_iter()
        .map(|line| reader.read(config, line.as_ref(), date, is_live))
        .collect();

    let mut report = SeriesReport::new();
    for (i, outcome) in outcomes.into_iter().enumerate() {
        report.push(i + 1, outcome);
    }
    report
}

/// Read a whole file through `reader`.
pub fn read_file<R: CustomDataReader>(
    reader: &R,
    config: &SubscriptionConfig,
    path: &Path,
    date: NaiveDate,
    is_live: bool,
) -> Result<SeriesReport<R::Output>, SeriesError> {
    let io_err = |source: std::io::Error| SeriesError::Io { path: path.to_path_buf(), source };
    let file = std::fs::File::open(path).map_err(io_err)?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    Ok(read_series(reader, config, lines, date, is_live))
}

/// Deterministic BLAKE3 hash over a bar series.
///
/// Prices are normalized first so `1.5` and `1.50` hash alike.
pub fn dataset_hash(bars: &[CboeBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.symbol.value.as_bytes());
        hasher.update(bar.time.to_string().as_bytes());
        let (period_secs, period_nanos) = period_parts::split(bar.period);
        hasher.update(&period_secs.to_le_bytes());
        hasher.update(&period_nanos.to_le_bytes());
        hasher.update(&bar.open.normalize().serialize());
        hasher.update(&bar.high.normalize().serialize());
        hasher.update(&bar.low.normalize().serialize());
        hasher.update(&bar.close.normalize().serialize());
    }
    hasher.finalize().to_hex().to_string()
}
