use chrono::{DateTime, FixedOffset};
use memchr::memchr_iter;

use crate::error::ParseError;

/// Field separator between the cookie and its timestamp.
pub const DELIMITER: u8 = b',';

/// Format of the normalized date a record is keyed by.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout of the timestamp field once a `Z` suffix is spelled as `+00:00`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const OFFSET_LEN: usize = "+00:00".len();

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    /// Calendar date of the timestamp in its own UTC offset, as `YYYY-MM-DD`.
    pub date: String,
}

impl Cookie {
    /// Parse a raw line of the form `<cookie>,<timestamp>`.
    ///
    /// The timestamp is `YYYY-MM-DDTHH:MM:SS`, optionally with fractional
    /// seconds, followed by an uppercase `Z` or a `±HH:MM` offset. Unicode
    /// whitespace around the line and around each field is ignored. The
    /// timestamp is not converted to UTC before its date is taken, so
    /// `2018-12-09T23:30:00-05:00` is recorded on `2018-12-09`.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let line = std::str::from_utf8(line)?.trim();
        let bytes = line.as_bytes();

        let mut delimiters = memchr_iter(DELIMITER, bytes);
        let (Some(split), None) = (delimiters.next(), delimiters.next()) else {
            let found = 1 + memchr_iter(DELIMITER, bytes).count();
            return Err(ParseError::FieldCount { found });
        };

        let name = line[..split].trim();
        let timestamp = line[split + 1..].trim();
        let parsed = parse_timestamp(timestamp)?;

        Ok(Self {
            name: name.to_string(),
            date: parsed.date_naive().format(DATE_FORMAT).to_string(),
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let invalid = |source| ParseError::Timestamp {
        value: value.to_string(),
        source,
    };
    let (local, offset) = match value.strip_suffix('Z') {
        Some(local) => (local, "+00:00"),
        None => value
            .split_at_checked(value.len().saturating_sub(OFFSET_LEN))
            .ok_or_else(|| invalid(None))?,
    };
    // chrono accepts a lowercase or space separator and a colon-less offset
    if local.as_bytes().get(10) != Some(&b'T') || !is_offset(offset) {
        return Err(invalid(None));
    }
    DateTime::parse_from_str(&format!("{local}{offset}"), TIMESTAMP_FORMAT)
        .map_err(|source| invalid(Some(source)))
}

fn is_offset(offset: &str) -> bool {
    match offset.as_bytes() {
        [sign, h1, h2, b':', m1, m2] => {
            matches!(sign, b'+' | b'-') && [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}
