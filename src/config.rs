use std::num::NonZeroUsize;

use crate::error::CookieError;

pub const KB: u64 = 1024;
pub const MB: u64 = KB * 1024;
pub const GB: u64 = MB * 1024;

/// Byte length of the range handed to each scan task unless configured.
pub const DEFAULT_CHUNK_SIZE: u64 = 64 * MB;

/// How a scan task gets at its byte range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Open the file, seek to the chunk start and read through a buffer.
    #[default]
    Buffered,
    /// Map the whole file read-only and walk the slice from the chunk start.
    Mapped,
}

/// Parameters of one read of a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub chunk_size: u64,
    pub concurrency: usize,
    /// `None` delivers records over an unbounded channel.
    pub channel_capacity: Option<usize>,
    pub strategy: ScanStrategy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: default_concurrency(),
            channel_capacity: None,
            strategy: ScanStrategy::default(),
        }
    }
}

impl ScanConfig {
    pub fn new(chunk_size: u64, concurrency: usize) -> Self {
        Self {
            chunk_size,
            concurrency,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Bound the record channel; producers block while it is full.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), CookieError> {
        if self.chunk_size == 0 {
            return Err(CookieError::Config(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CookieError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker count used when none is configured: one per available core.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_binary_multiples() {
        assert_eq!(KB, 1 << 10);
        assert_eq!(MB, 1 << 20);
        assert_eq!(GB, 1 << 30);
    }

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.concurrency >= 1);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.channel_capacity, None);
        assert_eq!(config.strategy, ScanStrategy::Buffered);
    }

    #[test]
    fn rejects_zero_chunk_size_and_concurrency() {
        assert!(matches!(
            ScanConfig::new(0, 1).validate(),
            Err(CookieError::Config(_))
        ));
        assert!(matches!(
            ScanConfig::new(KB, 0).validate(),
            Err(CookieError::Config(_))
        ));
    }

    #[test]
    fn builders_override_fields() {
        let config = ScanConfig::default()
            .with_chunk_size(16)
            .with_concurrency(3)
            .with_channel_capacity(8)
            .with_strategy(ScanStrategy::Mapped);
        assert_eq!(
            config,
            ScanConfig {
                chunk_size: 16,
                concurrency: 3,
                channel_capacity: Some(8),
                strategy: ScanStrategy::Mapped,
            }
        );
    }
}
