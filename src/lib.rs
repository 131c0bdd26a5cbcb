//! Find the most active cookies of a day in a cookie log.
//!
//! A log holds one `<cookie>,<rfc3339 timestamp>` record per line. The file is
//! split into byte chunks that are scanned concurrently, while a single
//! aggregator thread counts the records per date and cookie.
//!
//! ```no_run
//! use most_active_cookie::{LogReader, MB};
//!
//! let mut reader = LogReader::new("cookie_log.csv");
//! reader.read(64 * MB, 4)?;
//! for cookie in reader.most_active_cookies("2018-12-09") {
//!     println!("{cookie}");
//! }
//! # Ok::<(), most_active_cookie::CookieError>(())
//! ```

pub mod config;
mod error;
pub mod pool;
pub mod query;
pub mod reader;
pub mod record;
pub mod scanner;
pub mod table;

pub use config::{
    default_concurrency, ScanConfig, ScanStrategy, DEFAULT_CHUNK_SIZE, GB, KB, MB,
};
pub use error::{CookieError, ParseError};
pub use query::most_active;
pub use reader::{LogReader, ReadStats};
pub use record::{Cookie, DATE_FORMAT, DELIMITER};
pub use scanner::{ChunkScanner, ChunkStats};
pub use table::{CookieId, FrequencyTable, Interner};
