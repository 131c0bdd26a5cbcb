use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single log line cannot be turned into a cookie record.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected 2 comma separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("invalid timestamp '{value}', expected YYYY-MM-DDTHH:MM:SS followed by Z or ±HH:MM")]
    Timestamp {
        value: String,
        #[source]
        source: Option<chrono::ParseError>,
    },
    #[error("line is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Error type for reading a cookie log and aggregating its records.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cannot access log file '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O failure in chunk starting at byte {offset}: {source}")]
    ChunkIo {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("could not parse cookie record at byte {offset}: {source}")]
    Parse {
        offset: u64,
        #[source]
        source: ParseError,
    },
    #[error("invalid scan configuration: {0}")]
    Config(String),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("record delivery channel closed while chunk at byte {offset} was still emitting")]
    DeliveryClosed { offset: u64 },
    #[error("scan task for chunk at byte {offset} panicked: {message}")]
    TaskPanicked { offset: u64, message: String },
    #[error("aggregator thread panicked")]
    AggregatorPanicked,
}
