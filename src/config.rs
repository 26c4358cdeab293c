//! Pipe configuration

use std::time::Duration;

use crate::core::Timeout;

/// Kapasitas default ring buffer
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Interval re-check kondisi saat menunggu
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Konfigurasi `BoundedPipe`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Kapasitas ring buffer dalam byte (harus > 0)
    pub capacity: usize,
    /// Low-water mark: writer block saat sisa ruang `<= reserve`
    pub reserve: usize,
    pub write_timeout: Timeout,
    pub read_timeout: Timeout,
    /// Batas atas satu kali tunggu sebelum kondisi dicek ulang
    pub poll_interval: Duration,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            reserve: 0,
            write_timeout: Timeout::Never,
            read_timeout: Timeout::Never,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PipeConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_reserve(mut self, reserve: usize) -> Self {
        self.reserve = reserve;
        self
    }

    pub fn with_write_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.write_timeout = timeout.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.read_timeout = timeout.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll interval efektif (nol di-clamp ke 1ms)
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }
}
