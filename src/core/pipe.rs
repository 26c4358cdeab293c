//! Bounded Blocking Byte Pipe
//!
//! Satu `RingBuffer` yang dilindungi satu `Mutex`, dengan dua endpoint:
//! `Writer` (producer) dan `Reader` (consumer). Asumsi desain: tepat satu
//! writer aktif dan satu reader aktif pada satu waktu.
//!
//! Protokol tunggu:
//! - Writer block selama buffer `is_nearly_full()` (backpressure)
//! - Reader block selama buffer kosong, kecuali pipe sudah `close()` (EOF)
//! - Menunggu via `Condvar`, dipotong per poll interval supaya setiap bangun
//!   (termasuk spurious wakeup) mengecek ulang kondisi dan deadline
//! - Lock hanya dipegang selama mutasi buffer, dilepas saat menunggu

use std::io;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use super::error::PipeError;
use super::ring_buffer::RingBuffer;
use super::timeout::{Deadline, Timeout};
use crate::config::PipeConfig;

/// State yang dilindungi lock
struct State {
    buffer: RingBuffer,
    // Monotonic false -> true, tidak pernah di-reset
    closed: bool,
    // Writer sedang menunggu ruang; byte-nya masih akan masuk buffer,
    // jadi reader belum boleh melihat EOF
    writer_pending: bool,
}

/// In-process SPSC byte pipe dengan kapasitas tetap.
///
/// Pipe adalah satu-satunya pemilik buffer; `Writer` dan `Reader` hanyalah
/// view yang meminjam pipe dan tidak bisa hidup lebih lama darinya.
///
/// ```
/// use bytepipe::BoundedPipe;
///
/// let pipe = BoundedPipe::new(4);
/// let writer = pipe.writer();
/// let reader = pipe.reader();
///
/// writer.write_byte(1).unwrap();
/// writer.write_byte(2).unwrap();
/// pipe.close();
///
/// assert_eq!(reader.read_byte().unwrap(), Some(1));
/// assert_eq!(reader.read_byte().unwrap(), Some(2));
/// assert_eq!(reader.read_byte().unwrap(), None); // EOF
/// ```
pub struct BoundedPipe {
    state: Mutex<State>,
    // Reader menunggu di sini
    not_empty: Condvar,
    // Writer menunggu di sini
    not_full: Condvar,
    // Milidetik, negatif = tanpa batas
    write_timeout_ms: AtomicI64,
    read_timeout_ms: AtomicI64,
    poll_interval: Duration,
}

impl Default for BoundedPipe {
    fn default() -> Self {
        Self::with_config(PipeConfig::default())
    }
}

impl BoundedPipe {
    /// Membuat pipe dengan kapasitas `capacity` byte dan konfigurasi default.
    ///
    /// # Panics
    /// Panic jika `capacity == 0`
    pub fn new(capacity: usize) -> Self {
        Self::with_config(PipeConfig::default().with_capacity(capacity))
    }

    /// # Panics
    /// Panic jika `config.capacity == 0`
    pub fn with_config(config: PipeConfig) -> Self {
        let buffer = RingBuffer::with_reserve(config.capacity, config.reserve);
        let poll_interval = config.effective_poll_interval();

        debug!(
            capacity = buffer.capacity(),
            reserve = buffer.reserve(),
            poll_ms = poll_interval.as_millis() as u64,
            "pipe created"
        );

        Self {
            state: Mutex::new(State {
                buffer,
                closed: false,
                writer_pending: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            write_timeout_ms: AtomicI64::new(config.write_timeout.as_millis()),
            read_timeout_ms: AtomicI64::new(config.read_timeout.as_millis()),
            poll_interval,
        }
    }

    /// Endpoint untuk producer
    pub fn writer(&self) -> Writer<'_> {
        Writer { pipe: self }
    }

    /// Endpoint untuk consumer
    pub fn reader(&self) -> Reader<'_> {
        Reader { pipe: self }
    }

    /// Timeout untuk write yang dimulai setelah panggilan ini.
    pub fn set_write_timeout(&self, timeout: impl Into<Timeout>) {
        self.write_timeout_ms
            .store(timeout.into().as_millis(), Ordering::Relaxed);
    }

    /// Timeout untuk read yang dimulai setelah panggilan ini.
    pub fn set_read_timeout(&self, timeout: impl Into<Timeout>) {
        self.read_timeout_ms
            .store(timeout.into().as_millis(), Ordering::Relaxed);
    }

    /// Sama dengan `set_write_timeout`, dalam milidetik (negatif = tanpa batas).
    pub fn set_write_timeout_ms(&self, ms: i64) {
        self.write_timeout_ms.store(ms, Ordering::Relaxed);
    }

    /// Sama dengan `set_read_timeout`, dalam milidetik (negatif = tanpa batas).
    pub fn set_read_timeout_ms(&self, ms: i64) {
        self.read_timeout_ms.store(ms, Ordering::Relaxed);
    }

    pub fn write_timeout(&self) -> Timeout {
        Timeout::from_millis(self.write_timeout_ms())
    }

    pub fn read_timeout(&self) -> Timeout {
        Timeout::from_millis(self.read_timeout_ms())
    }

    pub fn write_timeout_ms(&self) -> i64 {
        self.write_timeout_ms.load(Ordering::Relaxed)
    }

    pub fn read_timeout_ms(&self) -> i64 {
        self.read_timeout_ms.load(Ordering::Relaxed)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().buffer.capacity()
    }

    /// Jumlah byte yang siap dibaca saat ini (bisa langsung basi).
    pub fn available(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Tutup pipe. Idempotent.
    ///
    /// Tidak membuang data: reader tetap menerima sisa byte, lalu EOF.
    /// Writer yang sedang block tidak dibatalkan; write baru ditolak.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.buffer.len();
        drop(state);

        debug!(remaining, "pipe closed");
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Tunggu sampai buffer tidak lagi nearly-full.
    fn wait_for_space(
        &self,
        state: &mut MutexGuard<'_, State>,
        deadline: &Deadline,
    ) -> Result<(), PipeError> {
        while state.buffer.is_nearly_full() {
            if deadline.is_expired() {
                let waited = deadline.elapsed();
                debug!(waited_ms = waited.as_millis() as u64, "write timeout");
                return Err(PipeError::WriteTimeout { waited });
            }

            let wait = deadline.next_wait(self.poll_interval);
            if self.not_full.wait_for(state, wait).timed_out() {
                trace!(
                    waited_ms = deadline.elapsed().as_millis() as u64,
                    buffered = state.buffer.len(),
                    "writer still blocked"
                );
            }
        }

        Ok(())
    }

    /// Tunggu sampai ada data. Returns `false` jika pipe closed dan kosong (EOF).
    fn wait_for_data(
        &self,
        state: &mut MutexGuard<'_, State>,
        deadline: &Deadline,
    ) -> Result<bool, PipeError> {
        while state.buffer.is_empty() {
            if state.closed && !state.writer_pending {
                return Ok(false);
            }
            if deadline.is_expired() {
                let waited = deadline.elapsed();
                debug!(waited_ms = waited.as_millis() as u64, "read timeout");
                return Err(PipeError::ReadTimeout { waited });
            }

            let wait = deadline.next_wait(self.poll_interval);
            if self.not_empty.wait_for(state, wait).timed_out() {
                trace!(
                    waited_ms = deadline.elapsed().as_millis() as u64,
                    "reader still blocked"
                );
            }
        }

        Ok(true)
    }

    /// Lock pipe untuk write baru dan tunggu sampai ada ruang.
    ///
    /// Write baru ditolak jika pipe sudah closed. Selama menunggu,
    /// `writer_pending` menahan EOF di sisi reader; guard dikembalikan
    /// dengan flag sudah bersih, dan push terjadi di bawah guard yang sama.
    fn lock_for_write(&self, deadline: &Deadline) -> Result<MutexGuard<'_, State>, PipeError> {
        let mut state = self.state.lock();
        if state.closed {
            warn!("write rejected: pipe closed");
            return Err(PipeError::Closed);
        }

        state.writer_pending = true;
        let result = self.wait_for_space(&mut state, deadline);
        state.writer_pending = false;

        match result {
            Ok(()) => Ok(state),
            Err(err) => {
                let closed = state.closed;
                drop(state);
                // Reader yang ditahan oleh writer ini boleh lanjut ke EOF
                if closed {
                    self.not_empty.notify_all();
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for BoundedPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedPipe")
            .field("buffer", &state.buffer)
            .field("closed", &state.closed)
            .field("write_timeout", &self.write_timeout())
            .field("read_timeout", &self.read_timeout())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Producer endpoint
pub struct Writer<'a> {
    pipe: &'a BoundedPipe,
}

impl Writer<'_> {
    /// Tulis satu byte, block selama buffer nearly-full.
    ///
    /// # Errors
    /// - `PipeError::Closed` jika pipe sudah closed saat panggilan dimulai.
    ///   Writer yang sudah block sebelum `close()` tidak dibatalkan; byte-nya
    ///   tetap dibaca reader sebelum EOF.
    /// - `PipeError::WriteTimeout` jika menunggu melebihi write timeout
    pub fn write_byte(&self, byte: u8) -> Result<(), PipeError> {
        let pipe = self.pipe;
        let deadline = Deadline::start(pipe.write_timeout());

        let mut state = pipe.lock_for_write(&deadline)?;

        let pushed = state.buffer.push(byte);
        debug_assert!(pushed, "space was checked under the lock");
        drop(state);

        pipe.not_empty.notify_one();
        Ok(())
    }

    /// Tulis sebagian `data`: block sampai ada ruang, lalu copy sebanyak
    /// yang muat di atas low-water mark. Returns jumlah byte yang ditulis.
    pub fn write_some(&self, data: &[u8]) -> Result<usize, PipeError> {
        if data.is_empty() {
            return Ok(0);
        }

        let pipe = self.pipe;
        let deadline = Deadline::start(pipe.write_timeout());

        let mut state = pipe.lock_for_write(&deadline)?;

        let room = state.buffer.free().saturating_sub(state.buffer.reserve());
        let written = state.buffer.push_slice(&data[..data.len().min(room)]);
        drop(state);

        pipe.not_empty.notify_one();
        Ok(written)
    }

    /// Tandai akhir stream dari sisi producer.
    pub fn close(&self) {
        self.pipe.close();
    }
}

impl io::Write for Writer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_some(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer endpoint
pub struct Reader<'a> {
    pipe: &'a BoundedPipe,
}

impl Reader<'_> {
    /// Baca satu byte, block selama buffer kosong.
    ///
    /// Returns `Ok(None)` saat EOF: pipe closed dan semua data sudah dibaca.
    ///
    /// # Errors
    /// `PipeError::ReadTimeout` jika menunggu melebihi read timeout
    pub fn read_byte(&self) -> Result<Option<u8>, PipeError> {
        let pipe = self.pipe;
        let deadline = Deadline::start(pipe.read_timeout());

        let mut state = pipe.state.lock();
        if !pipe.wait_for_data(&mut state, &deadline)? {
            return Ok(None);
        }

        let byte = state.buffer.pop();
        drop(state);

        pipe.not_full.notify_one();
        Ok(byte)
    }

    /// Baca minimal satu byte ke `out` (block sampai ada data), lalu copy
    /// semua yang sudah tersedia. Returns `0` saat EOF.
    pub fn read_some(&self, out: &mut [u8]) -> Result<usize, PipeError> {
        if out.is_empty() {
            return Ok(0);
        }

        let pipe = self.pipe;
        let deadline = Deadline::start(pipe.read_timeout());

        let mut state = pipe.state.lock();
        if !pipe.wait_for_data(&mut state, &deadline)? {
            return Ok(0);
        }

        let read = state.buffer.pop_slice(out);
        drop(state);

        pipe.not_full.notify_one();
        Ok(read)
    }

    /// Jumlah byte yang bisa dibaca tanpa block (snapshot).
    pub fn available(&self) -> usize {
        self.pipe.available()
    }
}

impl io::Read for Reader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_some(buf)?)
    }
}
