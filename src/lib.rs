//! Bytepipe - Bounded Blocking In-Process Byte Pipe
//!
//! Arsitektur:
//! - `RingBuffer`: circular byte store kapasitas tetap, tanpa sinkronisasi
//! - `BoundedPipe`: satu lock + condvar, endpoint `Writer` / `Reader`
//! - Timeout per-panggilan, close/EOF eksplisit
//!
//! Didesain untuk satu producer dan satu consumer.

pub mod config;
pub mod core;

pub use crate::config::PipeConfig;
pub use crate::core::{BoundedPipe, PipeError, Reader, RingBuffer, Timeout, Writer};
