//! Pipe Stress Test - Concurrent Producer / Consumer
//!
//! Satu writer thread dan satu reader thread memompa byte lewat pipe
//! berkapasitas kecil supaya backpressure terus terpicu. Urutan byte,
//! batas kapasitas, dan semantik timeout/EOF diverifikasi.
//!
//! Usage:
//!   cargo test --release --test pipe_stress_test -- --nocapture

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bytepipe::{BoundedPipe, PipeConfig, PipeError, Timeout};

/// Statistics collector
struct StressStats {
    written: AtomicU64,
    read: AtomicU64,
    max_available: AtomicUsize,
    total_write_ns: AtomicU64,
    max_write_ns: AtomicU64,
}

impl StressStats {
    fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            read: AtomicU64::new(0),
            max_available: AtomicUsize::new(0),
            total_write_ns: AtomicU64::new(0),
            max_write_ns: AtomicU64::new(0),
        }
    }

    fn record_write(&self, latency_ns: u64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.total_write_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.max_write_ns.fetch_max(latency_ns, Ordering::Relaxed);
    }

    fn record_available(&self, available: usize) {
        self.max_available.fetch_max(available, Ordering::Relaxed);
    }

    fn print_report(&self, duration: Duration) {
        let written = self.written.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Relaxed);
        let total = self.total_write_ns.load(Ordering::Relaxed);
        let max = self.max_write_ns.load(Ordering::Relaxed);
        let avg = if written > 0 { total / written } else { 0 };

        println!("\n📊 STRESS TEST RESULTS");
        println!("======================");
        println!("  Duration:      {:.2}s", duration.as_secs_f64());
        println!("  Written:       {}", written);
        println!("  Read:          {}", read);
        println!(
            "  Max buffered:  {}",
            self.max_available.load(Ordering::Relaxed)
        );
        println!("\nLatency (write_byte):");
        println!("  Max:           {:.2} μs", max as f64 / 1000.0);
        println!("  Avg:           {:.2} μs", avg as f64 / 1000.0);
    }
}

fn fast_config(capacity: usize) -> PipeConfig {
    PipeConfig::default()
        .with_capacity(capacity)
        .with_poll_interval(Duration::from_millis(10))
}

#[test]
fn test_scenario_capacity_four() {
    let pipe = BoundedPipe::new(4);
    let writer = pipe.writer();
    let reader = pipe.reader();

    for b in [1u8, 2, 3] {
        writer.write_byte(b).unwrap();
    }
    assert_eq!(reader.available(), 3);

    let got: Vec<u8> = (0..3).map(|_| reader.read_byte().unwrap().unwrap()).collect();
    assert_eq!(got, vec![1, 2, 3]);
    assert_eq!(reader.available(), 0);
}

#[test]
fn test_scenario_capacity_one_write_timeout() {
    let pipe = BoundedPipe::new(1);
    pipe.set_write_timeout_ms(50);
    let writer = pipe.writer();

    let start = Instant::now();
    writer.write_byte(1).unwrap();
    assert!(start.elapsed() < Duration::from_millis(50));

    let start = Instant::now();
    match writer.write_byte(2) {
        Err(PipeError::WriteTimeout { waited }) => {
            assert!(waited >= Duration::from_millis(50));
        }
        other => panic!("expected write timeout, got {:?}", other),
    }
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_read_timeout_bounds() {
    // Default poll interval (200ms)
    let pipe = BoundedPipe::new(16);
    pipe.set_read_timeout_ms(100);
    let poll = pipe.poll_interval();

    let start = Instant::now();
    let result = pipe.reader().read_byte();
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(PipeError::ReadTimeout { .. })));
    assert!(elapsed >= Duration::from_millis(100), "fired early: {:?}", elapsed);
    // Scheduler slack di atas 100ms + poll interval
    assert!(
        elapsed < Duration::from_millis(100) + poll + Duration::from_millis(100),
        "fired late: {:?}",
        elapsed
    );
}

#[test]
fn test_timeout_change_applies_to_next_call() {
    let pipe =
        BoundedPipe::with_config(fast_config(4).with_read_timeout(Timeout::from_millis(20)));
    let reader = pipe.reader();

    assert!(reader.read_byte().unwrap_err().is_timeout());

    pipe.set_read_timeout(Timeout::Never);
    thread::scope(|s| {
        let handle = s.spawn(|| reader.read_byte());
        thread::sleep(Duration::from_millis(50));
        pipe.writer().write_byte(9).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), Some(9));
    });
}

#[test]
fn test_eof_after_close_even_with_later_writes() {
    let pipe = BoundedPipe::new(8);
    let writer = pipe.writer();
    let reader = pipe.reader();

    writer.write_byte(1).unwrap();
    writer.write_byte(2).unwrap();
    pipe.close();

    assert_eq!(writer.write_byte(3), Err(PipeError::Closed));
    assert!(pipe.is_closed());

    assert_eq!(reader.read_byte().unwrap(), Some(1));
    assert_eq!(reader.read_byte().unwrap(), Some(2));
    assert_eq!(reader.read_byte().unwrap(), None);

    assert_eq!(writer.write_byte(4), Err(PipeError::Closed));
    assert_eq!(reader.read_byte().unwrap(), None);
}

#[test]
fn test_close_does_not_cancel_blocked_writer() {
    let pipe = BoundedPipe::with_config(fast_config(1));
    let writer = pipe.writer();
    writer.write_byte(1).unwrap();

    thread::scope(|s| {
        let handle = s.spawn(|| writer.write_byte(2));
        thread::sleep(Duration::from_millis(30));
        pipe.close();
        thread::sleep(Duration::from_millis(30));
        assert!(!handle.is_finished());

        // Baca sampai EOF tanpa join di tengah: byte dari writer yang
        // block sebelum close tetap harus sampai
        let reader = pipe.reader();
        let mut received = Vec::new();
        while let Some(b) = reader.read_byte().unwrap() {
            received.push(b);
        }

        assert_eq!(handle.join().unwrap(), Ok(()));
        assert_eq!(received, vec![1, 2]);
    });
}

#[test]
fn test_concurrent_fifo_under_backpressure() {
    const CAPACITY: usize = 8;
    const TOTAL: u64 = 50_000;

    let pipe = BoundedPipe::with_config(fast_config(CAPACITY));
    let stats = StressStats::new();
    let done = AtomicBool::new(false);

    let start = Instant::now();
    thread::scope(|s| {
        s.spawn(|| {
            let writer = pipe.writer();
            for i in 0..TOTAL {
                let t = Instant::now();
                writer.write_byte((i % 256) as u8).unwrap();
                stats.record_write(t.elapsed().as_nanos() as u64);
            }
            writer.close();
        });

        // Sampler: available() tidak boleh melebihi kapasitas
        s.spawn(|| {
            while !done.load(Ordering::Relaxed) && !(pipe.is_closed() && pipe.available() == 0) {
                stats.record_available(pipe.available());
                thread::yield_now();
            }
        });

        let reader = pipe.reader();
        let mut expected = 0u64;
        while let Some(b) = reader.read_byte().unwrap() {
            assert_eq!(b, (expected % 256) as u8, "out of order at {}", expected);
            expected += 1;
            stats.read.fetch_add(1, Ordering::Relaxed);
        }
        done.store(true, Ordering::Relaxed);
        assert_eq!(expected, TOTAL);
    });

    stats.print_report(start.elapsed());
    assert_eq!(stats.written.load(Ordering::Relaxed), TOTAL);
    assert!(stats.max_available.load(Ordering::Relaxed) <= CAPACITY);
}

#[test]
fn test_bulk_stream_roundtrip() {
    let pipe = BoundedPipe::with_config(fast_config(1000));
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i * 31 % 253) as u8).collect();

    let received = thread::scope(|s| {
        s.spawn(|| {
            let mut writer = pipe.writer();
            for chunk in payload.chunks(777) {
                writer.write_all(chunk).unwrap();
            }
            writer.flush().unwrap();
            writer.close();
        });

        let mut out = Vec::with_capacity(payload.len());
        pipe.reader().read_to_end(&mut out).unwrap();
        out
    });

    assert_eq!(received.len(), payload.len());
    assert!(received == payload, "stream corrupted");
}
