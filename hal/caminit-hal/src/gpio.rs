//! GPIO pin abstractions
//!
//! The bit-banged bus uses exactly two lines of the bridge's low GPIO byte:
//! SDA on bit 0 and SCL on bit 1.

/// Bit position of SDA in the low GPIO byte
pub const SDA_BIT: u8 = 1 << 0;

/// Bit position of SCL in the low GPIO byte
pub const SCL_BIT: u8 = 1 << 1;

/// Logical levels of the two bus lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinState {
    /// Data line level
    pub sda: bool,
    /// Clock line level
    pub scl: bool,
}

impl PinState {
    /// Bus idle: both lines high
    pub const IDLE: Self = Self::new(true, true);

    /// Create a pin state from SDA and SCL levels
    pub const fn new(sda: bool, scl: bool) -> Self {
        Self { sda, scl }
    }

    /// Pack into the low GPIO byte (bit0 = SDA, bit1 = SCL, other bits 0)
    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.sda {
            bits |= SDA_BIT;
        }
        if self.scl {
            bits |= SCL_BIT;
        }
        bits
    }

    /// Unpack from a low GPIO byte, ignoring unrelated bits
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            sda: bits & SDA_BIT != 0,
            scl: bits & SCL_BIT != 0,
        }
    }
}

impl Default for PinState {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Drives both bus lines as outputs
pub trait PinDriver {
    /// Error type for pin operations
    type Error;

    /// Drive SDA and SCL to the given levels
    ///
    /// Each call is one explicit command to the bridge, even when the state
    /// did not change.
    fn set_pins(&mut self, state: PinState) -> Result<(), Self::Error>;
}

/// Pin driver that can also let go of SDA and read the lines back
///
/// Only needed for acknowledge checking; the default write path never
/// samples the bus.
pub trait PinSampler: PinDriver {
    /// Stop driving SDA (input) and drive SCL to `scl`
    fn release_sda(&mut self, scl: bool) -> Result<(), Self::Error>;

    /// Read the current line levels
    fn read_pins(&mut self) -> Result<PinState, Self::Error>;
}

impl<T: PinDriver + ?Sized> PinDriver for &mut T {
    type Error = T::Error;

    fn set_pins(&mut self, state: PinState) -> Result<(), Self::Error> {
        T::set_pins(self, state)
    }
}

impl<T: PinSampler + ?Sized> PinSampler for &mut T {
    fn release_sda(&mut self, scl: bool) -> Result<(), Self::Error> {
        T::release_sda(self, scl)
    }

    fn read_pins(&mut self) -> Result<PinState, Self::Error> {
        T::read_pins(self)
    }
}
