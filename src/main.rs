//! Bytepipe - Pipe Throughput Benchmark
//!
//! Producer thread menulis N byte lewat `io::Write`, consumer membaca lewat
//! `io::Read` sampai EOF, lalu checksum kedua sisi dibandingkan.
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use bytepipe::{BoundedPipe, PipeConfig, Timeout};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Benchmark configuration
struct BenchConfig {
    pipe: PipeConfig,
    total_bytes: usize,
    chunk_size: usize,
    verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            pipe: PipeConfig::default(),
            total_bytes: 64 * 1024 * 1024,
            chunk_size: 4096,
            verbose: false,
        }
    }
}

/// Hasil satu sisi pipe
struct SideReport {
    bytes: usize,
    checksum: u32,
}

/// Adler-style rolling checksum, cukup untuk mendeteksi reorder/loss
fn update_checksum(sum: u32, data: &[u8]) -> u32 {
    let mut a = sum & 0xffff;
    let mut b = sum >> 16;
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

fn produce(pipe: &BoundedPipe, total: usize, chunk_size: usize) -> io::Result<SideReport> {
    let mut writer = pipe.writer();
    let mut chunk = vec![0u8; chunk_size];
    let mut checksum = 1u32;
    let mut sent = 0usize;

    while sent < total {
        let len = chunk_size.min(total - sent);
        for (i, byte) in chunk[..len].iter_mut().enumerate() {
            *byte = ((sent + i) % 251) as u8;
        }

        writer.write_all(&chunk[..len])?;
        checksum = update_checksum(checksum, &chunk[..len]);
        sent += len;
    }

    writer.close();
    debug!(sent, "producer done");

    Ok(SideReport {
        bytes: sent,
        checksum,
    })
}

fn consume(pipe: &BoundedPipe, chunk_size: usize) -> io::Result<SideReport> {
    let mut reader = pipe.reader();
    let mut chunk = vec![0u8; chunk_size];
    let mut checksum = 1u32;
    let mut received = 0usize;

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        checksum = update_checksum(checksum, &chunk[..n]);
        received += n;
    }

    debug!(received, "consumer reached EOF");

    Ok(SideReport {
        bytes: received,
        checksum,
    })
}

fn run_bench(config: BenchConfig) -> io::Result<()> {
    let pipe = BoundedPipe::with_config(config.pipe);

    println!("📊 Pipe Throughput Benchmark (Blocking SPSC)");
    println!("--------------------------------------------");
    println!("  Capacity:      {} bytes", config.pipe.capacity);
    println!("  Payload:       {} bytes", config.total_bytes);
    println!("  Chunk:         {} bytes", config.chunk_size);
    println!("  Write timeout: {} ms", config.pipe.write_timeout.as_millis());
    println!("  Read timeout:  {} ms", config.pipe.read_timeout.as_millis());

    let start = Instant::now();
    let (sent, received) = thread::scope(|s| {
        let producer = s.spawn(|| produce(&pipe, config.total_bytes, config.chunk_size));
        let received = consume(&pipe, config.chunk_size);
        let sent = producer.join().unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "producer thread panicked",
            ))
        });
        (sent, received)
    });
    let duration = start.elapsed();

    let sent = sent?;
    let received = received?;

    let mb = received.bytes as f64 / 1_000_000.0;
    println!("\n  Moved:         {} bytes", received.bytes);
    println!("  Elapsed:       {:.3} s", duration.as_secs_f64());
    println!(
        "  Throughput:    {:.2} MB/sec",
        mb / duration.as_secs_f64().max(f64::EPSILON)
    );

    if sent.bytes != received.bytes || sent.checksum != received.checksum {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "stream mismatch: sent {} bytes (checksum {:08x}), received {} bytes (checksum {:08x})",
                sent.bytes, sent.checksum, received.bytes, received.checksum
            ),
        ));
    }

    info!(
        bytes = received.bytes,
        checksum = received.checksum,
        "stream verified"
    );
    println!("\n✅ Checksum OK ({:08x})", received.checksum);
    Ok(())
}

fn print_help() {
    println!("Bytepipe - Bounded Blocking Byte Pipe Benchmark\n");
    println!("Usage: bytepipe [OPTIONS]\n");
    println!("Options:");
    println!("  -c, --capacity <BYTES>    Ring buffer capacity (default: 10000)");
    println!("  -n, --bytes <BYTES>       Total bytes to transfer (default: 67108864)");
    println!("      --chunk <BYTES>       Read/write chunk size (default: 4096)");
    println!("      --reserve <BYTES>     Backpressure low-water mark (default: 0)");
    println!("      --write-timeout <MS>  Write timeout, negative = none (default: -1)");
    println!("      --read-timeout <MS>   Read timeout, negative = none (default: -1)");
    println!("      --poll <MS>           Poll interval (default: 200)");
    println!("  -v, --verbose             Debug logging");
    println!("  -h, --help                Show this help");
}

fn parse_args() -> BenchConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = BenchConfig::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--capacity" | "-c" => {
                if let Some(v) = value {
                    config.pipe.capacity = v.parse().unwrap_or(config.pipe.capacity).max(1);
                    i += 1;
                }
            }
            "--bytes" | "-n" => {
                if let Some(v) = value {
                    config.total_bytes = v.parse().unwrap_or(config.total_bytes);
                    i += 1;
                }
            }
            "--chunk" => {
                if let Some(v) = value {
                    config.chunk_size = v.parse().unwrap_or(config.chunk_size).max(1);
                    i += 1;
                }
            }
            "--reserve" => {
                if let Some(v) = value {
                    config.pipe.reserve = v.parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--write-timeout" => {
                if let Some(v) = value {
                    config.pipe.write_timeout = Timeout::from_millis(v.parse().unwrap_or(-1));
                    i += 1;
                }
            }
            "--read-timeout" => {
                if let Some(v) = value {
                    config.pipe.read_timeout = Timeout::from_millis(v.parse().unwrap_or(-1));
                    i += 1;
                }
            }
            "--poll" => {
                if let Some(v) = value {
                    config.pipe.poll_interval = Duration::from_millis(v.parse().unwrap_or(200));
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    config
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "bytepipe=debug" } else { "bytepipe=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let config = parse_args();
    init_logging(config.verbose);

    if let Err(e) = run_bench(config) {
        eprintln!("❌ Pipe error: {}", e);
        std::process::exit(1);
    }
}
