//! Bridge errors

use caminit_hal::transport::{self, ErrorKind};
use thiserror::Error;

/// Errors from opening or talking to an FTDI bridge
#[derive(Debug, Error)]
pub enum FtdiError {
    /// No matching device could be opened
    #[error("no FTDI device {vid:04x}:{pids:04x?} could be opened")]
    NotFound {
        vid: u16,
        pids: Vec<u16>,
        #[source]
        source: Option<ftdi::Error>,
    },

    /// A setup step on an opened device failed
    #[error("failed to {step}")]
    Config {
        step: &'static str,
        #[source]
        source: ftdi::Error,
    },

    /// USB transfer failed
    #[error("USB transfer failed")]
    Io(#[from] std::io::Error),

    /// The bridge accepted fewer bytes than were sent
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Reply bytes did not arrive in time
    #[error("timed out after {received} of {expected} reply bytes")]
    Timeout { expected: usize, received: usize },
}

impl FtdiError {
    pub(crate) fn config(step: &'static str) -> impl FnOnce(ftdi::Error) -> Self {
        move |source| FtdiError::Config { step, source }
    }
}

impl transport::Error for FtdiError {
    fn kind(&self) -> ErrorKind {
        match self {
            FtdiError::NotFound { .. } => ErrorKind::Open,
            FtdiError::Config { .. } => ErrorKind::Config,
            FtdiError::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            FtdiError::Io(_) | FtdiError::ShortWrite { .. } => ErrorKind::Io,
            FtdiError::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}
