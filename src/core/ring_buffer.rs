//! Byte Ring Buffer - Fixed-Capacity Circular Store
//!
//! Struktur data murni tanpa sinkronisasi: semua method mengambil `&mut self`,
//! locking sepenuhnya menjadi tanggung jawab pemilik (lihat `BoundedPipe`).
//! Tidak ada alokasi setelah inisialisasi.

/// Fixed-capacity circular byte buffer.
///
/// `len` byte mulai dari `head` (wrapping) adalah data valid yang belum dibaca.
/// `push` memajukan `tail`, `pop` memajukan `head`, keduanya modulo kapasitas.
pub struct RingBuffer {
    // Pre-allocated storage - ukurannya tetap seumur hidup buffer
    buffer: Box<[u8]>,
    // Posisi baca berikutnya
    head: usize,
    // Posisi tulis berikutnya
    tail: usize,
    // Jumlah byte valid, 0 <= len <= capacity
    len: usize,
    // Low-water mark untuk backpressure
    reserve: usize,
}

impl RingBuffer {
    /// Membuat ring buffer baru dengan kapasitas tetap.
    ///
    /// # Panics
    /// Panic jika `capacity == 0`
    pub fn new(capacity: usize) -> Self {
        Self::with_reserve(capacity, 0)
    }

    /// Membuat ring buffer dengan low-water mark `reserve`.
    ///
    /// `is_nearly_full` menjadi true begitu sisa ruang `<= reserve`.
    /// `reserve` di-clamp ke `capacity - 1` supaya minimal satu byte
    /// selalu bisa ditulis.
    ///
    /// # Panics
    /// Panic jika `capacity == 0`
    pub fn with_reserve(capacity: usize, reserve: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            len: 0,
            reserve: reserve.min(capacity - 1),
        }
    }

    /// Push satu byte (producer side)
    ///
    /// Returns `true` jika berhasil, `false` jika buffer penuh (tidak ada perubahan).
    #[inline(always)]
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }

        self.buffer[self.tail] = byte;
        self.tail = (self.tail + 1) % self.buffer.len();
        self.len += 1;

        true
    }

    /// Pop satu byte (consumer side)
    ///
    /// Returns `None` jika buffer kosong.
    #[inline(always)]
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }

        let byte = self.buffer[self.head];
        self.head = (self.head + 1) % self.buffer.len();
        self.len -= 1;

        Some(byte)
    }

    /// Copy sebanyak mungkin byte dari `data` ke buffer.
    ///
    /// Wrap-around ditangani dengan maksimal dua copy kontigu.
    /// Returns jumlah byte yang ditulis.
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let to_write = data.len().min(self.free());
        if to_write == 0 {
            return 0;
        }

        let capacity = self.buffer.len();
        let first = to_write.min(capacity - self.tail);
        self.buffer[self.tail..self.tail + first].copy_from_slice(&data[..first]);

        let rest = to_write - first;
        if rest > 0 {
            self.buffer[..rest].copy_from_slice(&data[first..to_write]);
        }

        self.tail = (self.tail + to_write) % capacity;
        self.len += to_write;

        to_write
    }

    /// Copy sebanyak mungkin byte yang tersedia ke `out`.
    ///
    /// Returns jumlah byte yang dibaca.
    pub fn pop_slice(&mut self, out: &mut [u8]) -> usize {
        let to_read = out.len().min(self.len);
        if to_read == 0 {
            return 0;
        }

        let capacity = self.buffer.len();
        let first = to_read.min(capacity - self.head);
        out[..first].copy_from_slice(&self.buffer[self.head..self.head + first]);

        let rest = to_read - first;
        if rest > 0 {
            out[first..to_read].copy_from_slice(&self.buffer[..rest]);
        }

        self.head = (self.head + to_read) % capacity;
        self.len -= to_read;

        to_read
    }

    /// Cek apakah buffer kosong
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cek apakah buffer penuh (hard capacity check)
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len == self.buffer.len()
    }

    /// Trigger backpressure: sisa ruang sudah di bawah low-water mark.
    #[inline(always)]
    pub fn is_nearly_full(&self) -> bool {
        self.free() <= self.reserve
    }

    /// Jumlah byte yang siap dibaca
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Sisa ruang kosong
    #[inline(always)]
    pub fn free(&self) -> usize {
        self.buffer.len() - self.len
    }

    /// Kapasitas buffer
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn reserve(&self) -> usize {
        self.reserve
    }

    /// Buang semua data yang belum dibaca.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.buffer.len())
            .field("len", &self.len)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("reserve", &self.reserve)
            .finish()
    }
}
