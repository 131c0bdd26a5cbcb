// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;

use most_active_cookie::{
    default_concurrency, LogReader, ScanConfig, ScanStrategy, DATE_FORMAT, DEFAULT_CHUNK_SIZE,
};

#[derive(Debug, Parser)]
#[command(
    name = "most_active_cookie",
    about = "Print the most active cookies of a day",
    long_about = "Scan a cookie log of `<cookie>,<timestamp>` lines and print every cookie \
                  seen the most times on the given date, one per line."
)]
struct Cli {
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        value_parser = parse_log_path,
        help = "Cookie log to scan"
    )]
    file: PathBuf,
    #[arg(
        short = 'd',
        long = "date",
        value_name = "YYYY-MM-DD",
        value_parser = parse_date,
        help = "Day to report"
    )]
    date: NaiveDate,
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Bytes scanned per task"
    )]
    chunk_size: u64,
    #[arg(
        short = 't',
        long,
        value_name = "N",
        default_value_t = default_concurrency(),
        value_parser = parse_threads,
        help = "Concurrent scan workers"
    )]
    threads: usize,
    #[arg(long, value_name = "N", help = "Bound the record channel to N pending records")]
    channel_capacity: Option<usize>,
    #[arg(long, help = "Memory-map the log instead of reading it through buffers")]
    mmap: bool,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        let strategy = if self.mmap {
            ScanStrategy::Mapped
        } else {
            ScanStrategy::Buffered
        };
        let config = ScanConfig::new(self.chunk_size, self.threads).with_strategy(strategy);
        match self.channel_capacity {
            Some(capacity) => config.with_channel_capacity(capacity),
            None => config,
        }
    }
}

fn parse_log_path(raw: &str) -> Result<PathBuf, String> {
    if raw.is_empty() {
        return Err("file path cannot be empty".to_string());
    }
    let path = PathBuf::from(raw);
    std::fs::metadata(&path).map_err(|err| format!("invalid file path: {err}"))?;
    Ok(path)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_threads(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("at least one thread is required".to_string()),
        Ok(threads) => Ok(threads),
        Err(err) => Err(err.to_string()),
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let date = cli.date.format(DATE_FORMAT).to_string();

    let mut reader = LogReader::new(cli.file.clone());
    if let Err(err) = reader.read_with(&cli.scan_config()) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    let mut cookies = reader.most_active_cookies(&date);
    cookies.sort_unstable();
    for cookie in cookies {
        println!("{cookie}");
    }
    ExitCode::SUCCESS
}
