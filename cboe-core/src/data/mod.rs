//! Line readers and series assembly

pub mod reader;
pub mod series;

pub use reader::{CboeReader, CustomDataReader, ParseError};
pub use series::{
    dataset_hash, read_file, read_series, read_series_parallel, SeriesError, SeriesReport,
    SkippedLine,
};
