use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;

use crate::config::ScanStrategy;
use crate::error::CookieError;
use crate::record::Cookie;

const READ_BUFFER_SIZE: usize = 64 * 1024;
const LINE_CAPACITY: usize = 256;

/// What a single chunk scan consumed and produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Records parsed and emitted.
    pub lines: u64,
    pub blank_lines: u64,
    /// Bytes consumed from the chunk start, including a discarded leading partial line.
    pub bytes: u64,
}

/// Scans byte ranges of one log file, each through its own file handle.
#[derive(Debug, Clone, Copy)]
pub struct ChunkScanner<'a> {
    path: &'a Path,
    strategy: ScanStrategy,
}

impl<'a> ChunkScanner<'a> {
    pub fn new(path: &'a Path, strategy: ScanStrategy) -> Self {
        Self { path, strategy }
    }

    /// Scan the lines owned by the chunk starting at `start`, handing every
    /// parsed record to `emit`.
    ///
    /// Reading stops at end of file or once more than `max_bytes` have been
    /// consumed. The line in progress at that point is always finished, and a
    /// chunk that does not start at 0 first discards everything up to and
    /// including the next newline, since the previous chunk reads that line.
    pub fn scan<F>(&self, start: u64, max_bytes: u64, emit: F) -> Result<ChunkStats, CookieError>
    where
        F: FnMut(Cookie) -> Result<(), CookieError>,
    {
        let file = File::open(self.path).map_err(io_at(start))?;
        match self.strategy {
            ScanStrategy::Buffered => {
                let mut file = file;
                file.seek(SeekFrom::Start(start)).map_err(io_at(start))?;
                let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
                scan_lines(reader, start, max_bytes, emit)
            }
            ScanStrategy::Mapped => {
                // SAFETY: the log is mapped read-only and is not written to while it is scanned.
                let map = unsafe { Mmap::map(&file) }.map_err(io_at(start))?;
                let data = usize::try_from(start)
                    .ok()
                    .and_then(|start| map.get(start..))
                    .unwrap_or_default();
                scan_lines(data, start, max_bytes, emit)
            }
        }
    }
}

/// Line loop shared by every scan strategy. `reader` must be positioned at
/// byte `start` of the file; `start` is only used for chunk ownership and
/// error offsets.
pub fn scan_lines<R, F>(
    mut reader: R,
    start: u64,
    max_bytes: u64,
    mut emit: F,
) -> Result<ChunkStats, CookieError>
where
    R: BufRead,
    F: FnMut(Cookie) -> Result<(), CookieError>,
{
    let mut stats = ChunkStats::default();
    let mut line = Vec::with_capacity(LINE_CAPACITY);

    if start != 0 {
        let skipped = reader.read_until(b'\n', &mut line).map_err(io_at(start))?;
        if line.last() != Some(&b'\n') {
            // No line starts inside this chunk
            return Ok(stats);
        }
        stats.bytes += skipped as u64;
    }

    while stats.bytes <= max_bytes {
        let offset = start + stats.bytes;
        line.clear();
        let read = reader.read_until(b'\n', &mut line).map_err(io_at(offset))?;
        if read == 0 {
            break;
        }
        stats.bytes += read as u64;

        if is_blank(&line) {
            stats.blank_lines += 1;
            continue;
        }

        let cookie = Cookie::parse(&line).map_err(|source| CookieError::Parse { offset, source })?;
        stats.lines += 1;
        emit(cookie)?;
    }

    Ok(stats)
}

// Invalid UTF-8 is left to the parser to report
fn is_blank(line: &[u8]) -> bool {
    std::str::from_utf8(line).is_ok_and(|line| line.trim().is_empty())
}

fn io_at(offset: u64) -> impl FnOnce(io::Error) -> CookieError {
    move |source| CookieError::ChunkIo { offset, source }
}
