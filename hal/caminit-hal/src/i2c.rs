//! I2C bus abstractions
//!
//! Write-only: the bring-up tool never reads sensor registers back.

/// I2C bus master (write direction only)
pub trait I2cWrite {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device as one transaction
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write after the address byte
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;
}

/// What to do in the acknowledge slot after each byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckMode {
    /// Pulse SCL with SDA driven high and never look at the bus
    #[default]
    Ignore,
    /// Release SDA, pulse SCL and sample SDA; high means NACK
    Check,
}
