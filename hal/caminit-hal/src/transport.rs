//! Byte-stream transport abstractions
//!
//! A transport is the in-order byte pipe between the host and the bridge's
//! command engine. Bytes handed to [`Transport::send`] are applied by the
//! bridge strictly in the order they were sent, which is what the bit-bang
//! layers above rely on for signal timing.

use core::fmt;

/// Broad classification of transport failures
///
/// Every failure is fatal to a bring-up run; the kind only tells the
/// operator which stage broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Device could not be found or opened
    Open,
    /// Reset, purge, latency, mode or clock setup was rejected
    Config,
    /// A read or write failed mid-transaction (including short writes)
    Io,
    /// A bounded I/O call ran past its deadline
    Timeout,
    /// Anything else
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::Open => "transport open failed",
            ErrorKind::Config => "transport configuration failed",
            ErrorKind::Io => "transport I/O failed",
            ErrorKind::Timeout => "transport I/O timed out",
            ErrorKind::Other => "transport error",
        };
        f.write_str(text)
    }
}

/// Transport error
///
/// Implementations keep their own detail and map it onto an [`ErrorKind`].
pub trait Error: fmt::Debug {
    /// Classify this error
    fn kind(&self) -> ErrorKind;
}

impl Error for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

/// In-order byte transport to the bridge
pub trait Transport {
    /// Error type for transport operations
    type Error: Error;

    /// Write exactly `data` to the bridge
    ///
    /// Blocks until every byte has been accepted. Writing fewer bytes than
    /// requested is an [`ErrorKind::Io`] failure, never a partial success.
    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receive exactly `buf.len()` bytes
    ///
    /// Blocks until the buffer is filled or the transport's I/O timeout
    /// expires ([`ErrorKind::Timeout`]).
    fn recv(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Drain bytes the bridge has already returned without waiting
    ///
    /// Returns the number of bytes placed in `buf` (zero when nothing is
    /// pending). Used to diagnose command-stream desync.
    fn recv_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::send(self, data)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::recv(self, buf)
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::recv_available(self, buf)
    }
}
