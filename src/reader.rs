use std::fs::File;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::CookieError;
use crate::pool::{Tasks, WorkerPool};
use crate::query::most_active;
use crate::record::Cookie;
use crate::scanner::{ChunkScanner, ChunkStats};
use crate::table::FrequencyTable;

/// Summary of one successful read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub file_size: u64,
    pub chunks: usize,
    /// Records counted into the frequency table.
    pub records: u64,
}

/// Reads a cookie log concurrently in chunks and answers most-active queries
/// over the result.
///
/// Scan tasks only parse; every record travels over a channel to a single
/// aggregator thread, which is the only writer of the frequency table.
#[derive(Debug)]
pub struct LogReader {
    path: PathBuf,
    table: FrequencyTable,
}

impl LogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: FrequencyTable::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file in chunks of `chunk_size` bytes on `concurrency`
    /// worker threads.
    pub fn read(&mut self, chunk_size: u64, concurrency: usize) -> Result<ReadStats, CookieError> {
        self.read_with(&ScanConfig::new(chunk_size, concurrency))
    }

    /// Read the whole file using `config`.
    ///
    /// Every chunk runs to completion even when another one fails. The first
    /// failure in chunk order is returned, and the table must then be treated
    /// as incomplete.
    pub fn read_with(&mut self, config: &ScanConfig) -> Result<ReadStats, CookieError> {
        config.validate()?;
        let file_size = file_size(&self.path)?;
        self.table.clear();

        let tasks = Tasks::<ChunkStats>::partition(file_size, config.chunk_size);
        let chunks = tasks.len();
        let pool = WorkerPool::new(config.concurrency)?;
        info!(
            path = %self.path.display(),
            file_size,
            chunks,
            workers = pool.workers(),
            strategy = ?config.strategy,
            "reading cookie log"
        );

        let (sender, receiver) = match config.channel_capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };
        let scanner = ChunkScanner::new(&self.path, config.strategy);
        let table = &mut self.table;

        thread::scope(|scope| {
            let aggregator = scope.spawn(move || aggregate(receiver, table));

            pool.run(&tasks, |task| {
                let stats = scanner.scan(task.offset(), config.chunk_size, |cookie| {
                    sender.send(cookie).map_err(|_| CookieError::DeliveryClosed {
                        offset: task.offset(),
                    })
                })?;
                debug!(
                    chunk = task.index(),
                    offset = task.offset(),
                    lines = stats.lines,
                    blank_lines = stats.blank_lines,
                    bytes = stats.bytes,
                    "chunk scanned"
                );
                Ok(stats)
            });

            // Closing the channel lets the aggregator finish draining
            drop(sender);
            aggregator.join().map_err(|_| CookieError::AggregatorPanicked)
        })?;

        let mut first_failure = None;
        for (index, outcome) in tasks.into_outcomes().into_iter().enumerate() {
            if let Err(err) = outcome {
                warn!(chunk = index, error = %err, "chunk scan failed");
                first_failure.get_or_insert(err);
            }
        }
        if let Some(err) = first_failure {
            return Err(err);
        }

        let stats = ReadStats {
            file_size,
            chunks,
            records: self.table.total_records(),
        };
        info!(
            records = stats.records,
            distinct_cookies = self.table.distinct_identifiers(),
            dates = self.table.dates().count(),
            "cookie log read"
        );
        Ok(stats)
    }

    /// Cookies with the highest count on `date` (`YYYY-MM-DD`), ties included,
    /// in no particular order.
    pub fn most_active_cookies(&self, date: &str) -> Vec<&str> {
        most_active(self.table.query(date))
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }
}

fn aggregate(receiver: Receiver<Cookie>, table: &mut FrequencyTable) {
    for cookie in receiver {
        table.record(&cookie.date, &cookie.name);
    }
}

fn file_size(path: &Path) -> Result<u64, CookieError> {
    let access = |source| CookieError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(access)?;
    let metadata = file.metadata().map_err(access)?;
    Ok(metadata.len())
}
