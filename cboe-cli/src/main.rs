//! CBOE CLI: parse, convert and inspect CBOE daily index files.
//!
//! Commands:
//! - `parse`: read a `date,open,high,low,close` file and write it as JSON, JSONL, CSV or binary
//! - `inspect`: decode a binary record stream and print it as JSONL
//! - `source`: show where the raw file for a subscription is expected

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cboe_core::codec::{binary, json, DataRecord};
use cboe_core::data::{dataset_hash, read_file, read_series_parallel, SeriesReport};
use cboe_core::domain::{market, CboeBar, Resolution, Symbol};
use cboe_core::{CboeReader, CustomDataReader, SubscriptionConfig};

#[derive(Parser)]
#[command(name = "cboe", about = "CBOE CLI, daily index data reader")]
struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CBOE CSV file into bars.
    Parse {
        /// Input file (date,open,high,low,close).
        file: PathBuf,

        #[command(flatten)]
        subscription: SubscriptionArgs,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file. Defaults to stdout (required for binary).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Parse lines on the rayon thread pool.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Fail if any line is unusable instead of skipping it.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Decode a binary record stream and print it as JSONL.
    Inspect {
        /// Binary file written by `parse --format binary`.
        file: PathBuf,
    },
    /// Show the expected source location for a subscription.
    Source {
        #[command(flatten)]
        subscription: SubscriptionArgs,

        /// Data root directory.
        #[arg(long, default_value = "data")]
        data_root: PathBuf,

        /// Date to resolve the source for (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(clap::Args)]
struct SubscriptionArgs {
    /// Subscription TOML file. Overrides --ticker.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker of the CBOE series (e.g., VIX, VIX9D, VVIX).
    #[arg(long, default_value = "VIX")]
    ticker: String,
}

impl SubscriptionArgs {
    fn load(&self) -> Result<SubscriptionConfig> {
        match &self.config {
            Some(path) => Ok(SubscriptionConfig::from_file(path)?),
            None => Ok(SubscriptionConfig::new(
                CboeBar::TYPE_NAME,
                Symbol::custom(CboeBar::TYPE_NAME, &self.ticker, market::USA),
                Resolution::Daily,
            )),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty JSON array of bars.
    Json,
    /// One type-tagged record per line.
    Jsonl,
    /// date,open,high,low,close,end_time
    Csv,
    /// Length-prefixed binary record stream.
    Binary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Parse {
            file,
            subscription,
            format,
            output,
            parallel,
            strict,
        } => run_parse(&file, &subscription, format, output.as_deref(), parallel, strict),
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Source {
            subscription,
            data_root,
            date,
        } => run_source(&subscription, data_root, date.as_deref()),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")
}

fn run_parse(
    file: &Path,
    subscription: &SubscriptionArgs,
    format: OutputFormat,
    output: Option<&Path>,
    parallel: bool,
    strict: bool,
) -> Result<()> {
    if format == OutputFormat::Binary && output.is_none() {
        bail!("--format binary requires --output");
    }

    let config = subscription.load()?;
    let reader = CboeReader::default();
    let as_of = chrono::Local::now().date_naive();

    let report = if parallel {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let lines: Vec<&str> = content.lines().collect();
        read_series_parallel(&reader, &config, &lines, as_of, false)
    } else {
        read_file(&reader, &config, file, as_of, false)?
    };

    print_summary(&config, &report);
    if strict && !report.is_clean() {
        let first = &report.skipped[0];
        bail!(
            "{} unusable line(s); first at line {}: {}",
            report.skipped.len(),
            first.line_number,
            first.error
        );
    }

    let bytes = match format {
        OutputFormat::Json => {
            let mut text = json::to_json_pretty(&report.records)?;
            text.push('\n');
            text.into_bytes()
        }
        OutputFormat::Jsonl => {
            let records: Vec<DataRecord> =
                report.records.iter().cloned().map(DataRecord::from).collect();
            json::to_json_lines(&records)?.into_bytes()
        }
        OutputFormat::Csv => export_csv(&report.records)?.into_bytes(),
        OutputFormat::Binary => {
            let records: Vec<DataRecord> =
                report.records.iter().cloned().map(DataRecord::from).collect();
            binary::encode_stream(&records)?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "output written");
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn print_summary(config: &SubscriptionConfig, report: &SeriesReport<CboeBar>) {
    eprintln!(
        "{}: {} bars, {} skipped, {} non-data lines",
        config.symbol,
        report.records.len(),
        report.skipped.len(),
        report.non_data_lines
    );
    if let (Some(first), Some(last)) = (report.records.first(), report.records.last()) {
        eprintln!(
            "  range: {} .. {}",
            first.time.format("%Y-%m-%d"),
            last.end_time().format("%Y-%m-%d")
        );
    }
    eprintln!("  dataset hash: {}", dataset_hash(&report.records));
    if !report.is_clean() {
        warn!(skipped = report.skipped.len(), "series has unusable lines; rerun with --strict to fail");
    }
}

/// Export bars as CSV in the input schema plus the derived end time.
fn export_csv(bars: &[CboeBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "open", "high", "low", "close", "end_time"])?;
    for bar in bars {
        wtr.write_record([
            &bar.time.format("%Y-%m-%d").to_string(),
            &bar.open.to_string(),
            &bar.high.to_string(),
            &bar.low.to_string(),
            &bar.close.to_string(),
            &bar.end_time().format("%Y-%m-%dT%H:%M:%S").to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn run_inspect(file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let records = binary::decode_stream(&bytes)
        .with_context(|| format!("failed to decode {}", file.display()))?;
    print!("{}", json::to_json_lines(&records)?);
    eprintln!("{} records", records.len());
    Ok(())
}

fn run_source(subscription: &SubscriptionArgs, data_root: PathBuf, date: Option<&str>) -> Result<()> {
    let config = subscription.load()?;
    let date = date
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let reader = CboeReader::new(data_root);
    let source = reader.source(&config, date, false);
    println!("{}", json::to_json_pretty(&source)?);
    Ok(())
}
