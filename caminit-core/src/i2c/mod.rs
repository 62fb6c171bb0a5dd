//! Bit-banged I2C master
//!
//! I2C framing is expressed purely as an ordered series of pin states. The
//! bridge applies commands in the order they arrive, so ordering alone
//! carries the protocol; there is no wall-clock timing in this layer.

pub mod bitbang;
mod embedded;

pub use bitbang::{BitBangI2c, ACK_SLOT, BYTE_PIN_STATES, START, STOP};

/// Errors from a bit-banged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError<E> {
    /// The pin driver (transport) failed; the transaction was abandoned
    Transport(E),
    /// Acknowledge check saw SDA high after this byte (0 = address byte)
    Nack {
        /// Index of the byte within the transaction
        byte: usize,
    },
    /// Read transfers are not supported by this write-only master
    ReadUnsupported,
}

impl<E: core::fmt::Display> core::fmt::Display for I2cError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            I2cError::Transport(e) => write!(f, "bridge transport failed: {}", e),
            I2cError::Nack { byte: 0 } => write!(f, "address not acknowledged"),
            I2cError::Nack { byte } => write!(f, "byte {} not acknowledged", byte),
            I2cError::ReadUnsupported => write!(f, "I2C reads are not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for I2cError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            I2cError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
