//! Error types untuk pipe

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Kegagalan operasi pipe. EOF bukan error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipeError {
    #[error("write timeout after {waited:?}")]
    WriteTimeout { waited: Duration },
    #[error("read timeout after {waited:?}")]
    ReadTimeout { waited: Duration },
    #[error("pipe closed")]
    Closed,
}

impl PipeError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipeError::WriteTimeout { .. } | PipeError::ReadTimeout { .. }
        )
    }
}

impl From<PipeError> for io::Error {
    fn from(err: PipeError) -> Self {
        let kind = match err {
            PipeError::WriteTimeout { .. } | PipeError::ReadTimeout { .. } => {
                io::ErrorKind::TimedOut
            }
            PipeError::Closed => io::ErrorKind::BrokenPipe,
        };
        io::Error::new(kind, err)
    }
}
