//! Timeout & Deadline untuk operasi blocking
//!
//! `Timeout` adalah nilai konfigurasi (negatif = tunggu selamanya),
//! `Deadline` adalah stopwatch per-panggilan yang dimulai saat operasi masuk.

use std::time::{Duration, Instant};

/// Batas waktu untuk satu operasi blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Block sampai kondisi terpenuhi
    #[default]
    Never,
    /// Gagal jika menunggu lebih lama dari durasi ini
    After(Duration),
}

impl Timeout {
    /// Konversi dari milidetik bertanda. Nilai `< 0` berarti tanpa batas.
    pub fn from_millis(ms: i64) -> Self {
        if ms < 0 {
            Timeout::Never
        } else {
            Timeout::After(Duration::from_millis(ms as u64))
        }
    }

    /// Kebalikan dari `from_millis`: `Never` menjadi `-1`.
    ///
    /// Durasi yang melebihi `i64::MAX` ms di-saturate.
    pub fn as_millis(&self) -> i64 {
        match self {
            Timeout::Never => -1,
            Timeout::After(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Timeout::Never)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(value: Option<Duration>) -> Self {
        value.map_or(Timeout::Never, Timeout::After)
    }
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        Timeout::After(value)
    }
}

/// Deadline untuk satu panggilan blocking.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Timeout,
}

impl Deadline {
    /// Mulai stopwatch sekarang.
    pub fn start(timeout: Timeout) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    /// Waktu sejak panggilan dimulai
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// True jika waktu tunggu sudah melewati timeout.
    ///
    /// Strictly greater: timeout tidak pernah fire lebih awal dari batasnya.
    pub fn is_expired(&self) -> bool {
        match self.timeout {
            Timeout::Never => false,
            Timeout::After(limit) => self.elapsed() > limit,
        }
    }

    /// Sisa waktu sebelum timeout, `None` jika tanpa batas.
    pub fn remaining(&self) -> Option<Duration> {
        match self.timeout {
            Timeout::Never => None,
            Timeout::After(limit) => Some(limit.saturating_sub(self.elapsed())),
        }
    }

    /// Durasi tunggu berikutnya: poll interval, dipotong sisa waktu.
    ///
    /// Ditambah 1ms supaya bangun setelah deadline lewat, bukan tepat di batas.
    pub fn next_wait(&self, poll_interval: Duration) -> Duration {
        match self.remaining() {
            None => poll_interval,
            Some(left) => poll_interval.min(left.saturating_add(Duration::from_millis(1))),
        }
    }
}
