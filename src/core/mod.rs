//! Core module: Bounded blocking byte pipe di atas ring buffer
//!
//! Prinsip desain:
//! - Pemisahan mekanisme & kebijakan: `RingBuffer` murni tanpa lock,
//!   `BoundedPipe` yang memegang lock dan protokol tunggu
//! - No-Allocation: buffer pre-allocated saat init, ukuran tetap
//! - Backpressure: writer block saat buffer nearly-full

mod error;
mod pipe;
mod ring_buffer;
mod timeout;

pub use error::PipeError;
pub use pipe::{BoundedPipe, Reader, Writer};
pub use ring_buffer::RingBuffer;
pub use timeout::{Deadline, Timeout};
